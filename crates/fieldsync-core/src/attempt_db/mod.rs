//! Persistent attempt counters for named jobs (SQLite via sqlx).
//!
//! The core treats the attempt count as read-only input; this store is the
//! external side that bumps it on `Retry` and clears it on a terminal outcome.

mod attempts;
mod db;

pub use attempts::AttemptRecord;
pub use db::AttemptDb;
