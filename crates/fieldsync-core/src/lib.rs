pub mod config;
pub mod logging;

pub mod attempt_db;
pub mod control;
pub mod error;
pub mod geo;
pub mod http;
pub mod job;
pub mod network;
pub mod retry;
pub mod route;
pub mod sync;
pub mod tasks;
