//! Route fetcher seam and the per-chunk result type.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::retry::FetchError;

use super::chunk::Chunk;

/// Remote result for one chunk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteSegment {
    pub duration_secs: f64,
    pub distance_m: f64,
    /// Ordered path; its first point is the chunk's first stop.
    pub geometry: Vec<Coordinate>,
}

/// Sole external collaborator of the stitcher: turns one chunk into a segment.
///
/// Called from worker threads when concurrent fetching is enabled, hence `Sync`.
pub trait RouteFetcher: Sync {
    fn fetch(&self, chunk: &Chunk) -> Result<RouteSegment, FetchError>;
}

impl<F> RouteFetcher for F
where
    F: Fn(&Chunk) -> Result<RouteSegment, FetchError> + Sync,
{
    fn fetch(&self, chunk: &Chunk) -> Result<RouteSegment, FetchError> {
        self(chunk)
    }
}
