//! CLI command handlers, one file per command.

mod distance;
mod reset;
mod route;
mod run;
mod status;

pub use distance::run_distance;
pub use reset::run_reset;
pub use route::{run_route, RouteArgs};
pub use run::run_job;
pub use status::run_status;
