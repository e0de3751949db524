//! Chunk type and stop-list splitting.

use crate::error::ConfigurationError;
use crate::geo::Stop;

/// A bounded, order-preserving window of stops sent in one routing request.
///
/// Every chunk except the first begins with the last stop of the previous
/// chunk (the continuity point).
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Position in the chunk sequence.
    pub index: usize,
    pub stops: Vec<Stop>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn first(&self) -> Option<&Stop> {
        self.stops.first()
    }

    pub fn last(&self) -> Option<&Stop> {
        self.stops.last()
    }
}

/// Splits `stops` into overlapping chunks of at most `limit` stops.
///
/// A chunk is closed as soon as it holds `limit` stops and the next one is
/// seeded with its last stop. A trailing chunk holding only the continuity
/// stop adds no segment and is dropped, so an input of fewer than two stops
/// yields no chunks. Returns an error if `limit` is below 2.
pub fn split(stops: &[Stop], limit: usize) -> Result<Vec<Chunk>, ConfigurationError> {
    if limit <= 1 {
        return Err(ConfigurationError::InvalidChunkLimit(limit));
    }

    let mut out = Vec::new();
    let mut current: Vec<Stop> = Vec::with_capacity(limit);

    for stop in stops {
        current.push(*stop);
        if current.len() == limit {
            let seed = current[limit - 1];
            let index = out.len();
            out.push(Chunk {
                index,
                stops: std::mem::replace(&mut current, Vec::with_capacity(limit)),
            });
            current.push(seed);
        }
    }

    if current.len() > 1 {
        let index = out.len();
        out.push(Chunk {
            index,
            stops: current,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops(n: usize) -> Vec<Stop> {
        (0..n).map(|i| Stop::new(i as f64 * 0.01, 10.0 + i as f64 * 0.01)).collect()
    }

    #[test]
    fn empty_and_single_stop_yield_nothing() {
        assert!(split(&[], 20).unwrap().is_empty());
        assert!(split(&stops(1), 20).unwrap().is_empty());
    }

    #[test]
    fn limit_below_two_is_rejected() {
        assert_eq!(
            split(&stops(5), 1),
            Err(ConfigurationError::InvalidChunkLimit(1))
        );
        assert_eq!(
            split(&[], 0),
            Err(ConfigurationError::InvalidChunkLimit(0))
        );
    }

    #[test]
    fn short_input_is_one_chunk() {
        let input = stops(7);
        let chunks = split(&input, 20).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].stops, input);
    }

    #[test]
    fn exact_limit_is_one_chunk() {
        let chunks = split(&stops(20), 20).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 20);
    }

    #[test]
    fn forty_one_stops_limit_twenty() {
        let input = stops(41);
        let chunks = split(&input, 20).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].stops, input[0..20]);
        assert_eq!(chunks[1].stops, input[19..39]);
        assert_eq!(chunks[2].stops, input[38..41]);
    }

    #[test]
    fn chunk_count_size_and_continuity() {
        for limit in 2..=8usize {
            for len in 2..=40usize {
                let input = stops(len);
                let chunks = split(&input, limit).unwrap();
                let expected = (len - 1).div_ceil(limit - 1);
                assert_eq!(chunks.len(), expected, "len={len} limit={limit}");
                for (i, chunk) in chunks.iter().enumerate() {
                    assert_eq!(chunk.index, i);
                    assert!(chunk.len() >= 2 && chunk.len() <= limit);
                    if i > 0 {
                        assert_eq!(chunk.first(), chunks[i - 1].last());
                    }
                }
                assert_eq!(chunks[0].first(), input.first());
                assert_eq!(chunks.last().unwrap().last(), input.last());
            }
        }
    }
}
