//! Multi-stop route computation.
//!
//! Splits an ordered stop list into overlapping chunks no larger than the
//! routing service's per-request limit, fetches each chunk and stitches the
//! partial routes into one continuous route.

mod chunk;
mod fetcher;
mod http;
mod stitch;

pub use chunk::{split, Chunk};
pub use fetcher::{RouteFetcher, RouteSegment};
pub use http::HttpRouteFetcher;
pub use stitch::{compute_route, RouteDetail, RouteError, RouteStitcher};
