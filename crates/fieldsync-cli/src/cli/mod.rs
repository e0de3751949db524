//! CLI for fieldsync: route computation plus a small runtime for the
//! reference background jobs.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use fieldsync_core::attempt_db::AttemptDb;
use fieldsync_core::config;
use fieldsync_core::control::JobControl;
use fieldsync_core::geo::{Coordinate, Stop};
use fieldsync_core::tasks::names;
use std::path::PathBuf;
use std::sync::Arc;

use commands::{run_distance, run_job, run_reset, run_route, run_status, RouteArgs};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fieldsync")]
#[command(about = "fieldsync: chunked route computation and retrying background jobs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Compute one route through ordered stops, split into service-sized chunks.
    Route {
        /// Stops as `lat,lon`, in visiting order.
        #[arg(value_name = "LAT,LON", value_parser = parse_stop, allow_hyphen_values = true)]
        stops: Vec<Stop>,
        /// Read stops from a file, one `lat,lon` per line (`#` starts a comment).
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Stops per routing request (default from config).
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
        /// Chunk requests in flight at once (default from config).
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
        /// Print the stitched route as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Great-circle distance between two points.
    Distance {
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lon1: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        #[arg(allow_negative_numbers = true)]
        lon2: f64,
        /// `K` kilometers, `N` nautical miles, anything else statute miles.
        #[arg(long, default_value = "M")]
        unit: String,
    },

    /// Run a background job once, or until it stops asking for a retry.
    Run {
        #[command(subcommand)]
        job: JobCommand,
        /// Keep re-running after `retry`, waiting the backoff delay between passes.
        #[arg(long, global = true)]
        until_done: bool,
        /// Signed-in user the job acts for.
        #[arg(long, global = true, value_name = "ID")]
        user: Option<String>,
    },

    /// Show attempt counters and last outcomes.
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Clear a job's attempt counter.
    Reset {
        #[arg(value_enum)]
        job: JobKind,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum JobCommand {
    /// Pull every configured sync endpoint.
    Sync,
    /// Report one location fix.
    Location {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Horizontal accuracy in meters.
        #[arg(long)]
        accuracy: Option<f64>,
    },
    /// Upload one file.
    Upload {
        path: PathBuf,
    },
}

impl JobCommand {
    pub fn kind(&self) -> JobKind {
        match self {
            JobCommand::Sync => JobKind::Sync,
            JobCommand::Location { .. } => JobKind::Location,
            JobCommand::Upload { .. } => JobKind::Upload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JobKind {
    Sync,
    Location,
    Upload,
}

impl JobKind {
    /// Name under which the job's attempts are stored.
    pub fn job_name(self) -> &'static str {
        match self {
            JobKind::Sync => names::DATA_SYNC,
            JobKind::Location => names::LOCATION_REPORT,
            JobKind::Upload => names::FILE_UPLOAD,
        }
    }
}

/// Parse `lat,lon`.
pub fn parse_stop(s: &str) -> Result<Stop, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got `{s}`"))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("bad latitude in `{s}`"))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("bad longitude in `{s}`"))?;
    let stop = Coordinate::new(lat, lon);
    if !stop.is_valid() {
        return Err(format!("{stop} is out of range"));
    }
    Ok(stop)
}

/// Cancel every registered job on the first Ctrl-C.
fn install_ctrl_c(control: Arc<JobControl>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; cancelling running jobs");
            eprintln!("interrupted; cancelling...");
            control.cancel_all();
        }
    });
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Route {
                stops,
                file,
                limit,
                concurrency,
                json,
            } => {
                let control = Arc::new(JobControl::new());
                install_ctrl_c(Arc::clone(&control));
                let args = RouteArgs {
                    stops,
                    file,
                    limit,
                    concurrency,
                    json,
                };
                run_route(&cfg, &control, args).await?;
            }
            CliCommand::Distance {
                lat1,
                lon1,
                lat2,
                lon2,
                unit,
            } => run_distance(lat1, lon1, lat2, lon2, &unit),
            CliCommand::Run {
                job,
                until_done,
                user,
            } => {
                let db = AttemptDb::open_default().await?;
                let control = Arc::new(JobControl::new());
                install_ctrl_c(Arc::clone(&control));
                run_job(&db, Arc::new(cfg), &control, job, user, until_done).await?;
            }
            CliCommand::Status { json } => {
                let db = AttemptDb::open_default().await?;
                run_status(&db, json).await?;
            }
            CliCommand::Reset { job } => {
                let db = AttemptDb::open_default().await?;
                run_reset(&db, job).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
