//! Fetch every chunk of a stop list and stitch the segments into one route.
//!
//! Fetches run sequentially unless `concurrency > 1`, in which case a bounded
//! pool of scoped worker threads pulls chunks off a shared queue and results
//! are reassembled by chunk index before stitching. Any failed chunk fails the
//! whole route: a truncated route is never returned.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex};

use serde::Serialize;
use thiserror::Error;

use crate::control::CancelToken;
use crate::error::ConfigurationError;
use crate::geo::{Coordinate, Stop};
use crate::retry::{classify, FailureKind, FetchError};

use super::chunk::{self, Chunk};
use super::fetcher::{RouteFetcher, RouteSegment};

/// The stitched route.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RouteDetail {
    /// Sum of segment durations.
    pub duration_secs: f64,
    /// Sum of segment distances.
    pub distance_m: f64,
    /// Segment geometries joined, each continuity point kept once.
    pub geometry: Vec<Coordinate>,
    /// Number of chunk requests that produced this route.
    pub chunk_count: usize,
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("no route: at least two stops are required, got {0}")]
    NotEnoughStops(usize),
    #[error("no route: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("no route: chunk {chunk_index} failed because {source}")]
    Fetch {
        chunk_index: usize,
        #[source]
        source: FetchError,
    },
    #[error("no route: cancelled")]
    Cancelled,
}

impl RouteError {
    /// Retry classification for callers that retry whole routes.
    pub fn kind(&self) -> FailureKind {
        match self {
            RouteError::Fetch { source, .. } => classify(source),
            RouteError::NotEnoughStops(_)
            | RouteError::Configuration(_)
            | RouteError::Cancelled => FailureKind::Permanent,
        }
    }
}

/// Route computation settings.
#[derive(Debug, Clone)]
pub struct RouteStitcher {
    limit: usize,
    concurrency: usize,
    cancel: Option<CancelToken>,
}

impl RouteStitcher {
    /// Stitcher with `limit` stops per chunk and sequential fetching.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            concurrency: 1,
            cancel: None,
        }
    }

    /// Allow up to `n` chunk fetches in flight (values below 1 mean 1).
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Stop issuing fetches once `token` is cancelled.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Split `stops`, fetch every chunk and stitch the results in input order.
    pub fn compute(
        &self,
        stops: &[Stop],
        fetcher: &dyn RouteFetcher,
    ) -> Result<RouteDetail, RouteError> {
        let chunks = chunk::split(stops, self.limit)?;
        if chunks.is_empty() {
            return Err(RouteError::NotEnoughStops(stops.len()));
        }
        tracing::debug!(
            stops = stops.len(),
            chunks = chunks.len(),
            limit = self.limit,
            "computing route"
        );

        let segments = if self.concurrency > 1 && chunks.len() > 1 {
            self.fetch_concurrent(&chunks, fetcher)?
        } else {
            self.fetch_sequential(&chunks, fetcher)?
        };
        Ok(stitch(segments))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn fetch_sequential(
        &self,
        chunks: &[Chunk],
        fetcher: &dyn RouteFetcher,
    ) -> Result<Vec<RouteSegment>, RouteError> {
        let mut segments = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if self.is_cancelled() {
                return Err(RouteError::Cancelled);
            }
            let segment = fetcher.fetch(chunk).map_err(|source| {
                tracing::warn!(chunk = chunk.index, error = %source, "route chunk fetch failed");
                RouteError::Fetch {
                    chunk_index: chunk.index,
                    source,
                }
            })?;
            segments.push(segment);
        }
        Ok(segments)
    }

    /// Bounded worker pool over a shared queue. Workers stop pulling work after
    /// the first failure or a cancel; chunks are popped in index order, so every
    /// chunk below the lowest failing index has been fetched.
    fn fetch_concurrent(
        &self,
        chunks: &[Chunk],
        fetcher: &dyn RouteFetcher,
    ) -> Result<Vec<RouteSegment>, RouteError> {
        let work: Mutex<VecDeque<&Chunk>> = Mutex::new(chunks.iter().collect());
        let failed = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel::<(usize, Result<RouteSegment, FetchError>)>();
        let num_workers = self.concurrency.min(chunks.len());

        std::thread::scope(|scope| {
            for _ in 0..num_workers {
                let tx = tx.clone();
                let work = &work;
                let failed = &failed;
                scope.spawn(move || loop {
                    if failed.load(Ordering::Relaxed) || self.is_cancelled() {
                        break;
                    }
                    let next = work.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
                    let Some(chunk) = next else {
                        break;
                    };
                    let res = fetcher.fetch(chunk);
                    if res.is_err() {
                        failed.store(true, Ordering::Relaxed);
                    }
                    let _ = tx.send((chunk.index, res));
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Option<RouteSegment>> = vec![None; chunks.len()];
        let mut first_error: Option<(usize, FetchError)> = None;
        for (index, res) in rx {
            match res {
                Ok(segment) => slots[index] = Some(segment),
                Err(e) => {
                    tracing::warn!(chunk = index, error = %e, "route chunk fetch failed");
                    if first_error.as_ref().map_or(true, |(i, _)| index < *i) {
                        first_error = Some((index, e));
                    }
                }
            }
        }

        if let Some((chunk_index, source)) = first_error {
            return Err(RouteError::Fetch {
                chunk_index,
                source,
            });
        }
        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(RouteError::Cancelled)
    }
}

/// Split, fetch sequentially and stitch with the given chunk limit.
pub fn compute_route(
    stops: &[Stop],
    limit: usize,
    fetcher: &dyn RouteFetcher,
) -> Result<RouteDetail, RouteError> {
    RouteStitcher::new(limit).compute(stops, fetcher)
}

/// Join segments in chunk order, dropping the duplicated continuity point at
/// the start of every segment after the first.
fn stitch(segments: Vec<RouteSegment>) -> RouteDetail {
    let mut detail = RouteDetail {
        chunk_count: segments.len(),
        ..RouteDetail::default()
    };
    for (i, segment) in segments.into_iter().enumerate() {
        detail.duration_secs += segment.duration_secs;
        detail.distance_m += segment.distance_m;
        let skip = usize::from(i > 0);
        detail.geometry.extend(segment.geometry.into_iter().skip(skip));
    }
    detail
}
