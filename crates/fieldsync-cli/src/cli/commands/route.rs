//! `fieldsync route` – compute one stitched route through ordered stops.

use anyhow::{Context, Result};
use fieldsync_core::config::FieldsyncConfig;
use fieldsync_core::control::JobControl;
use fieldsync_core::geo::Stop;
use fieldsync_core::route::{HttpRouteFetcher, RouteDetail, RouteStitcher};
use std::path::PathBuf;

use crate::cli::parse_stop;

const ROUTE_JOB: &str = "route";

pub struct RouteArgs {
    pub stops: Vec<Stop>,
    pub file: Option<PathBuf>,
    pub limit: Option<usize>,
    pub concurrency: Option<usize>,
    pub json: bool,
}

pub async fn run_route(cfg: &FieldsyncConfig, control: &JobControl, args: RouteArgs) -> Result<()> {
    let mut stops = args.stops;
    if let Some(path) = &args.file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading stops from {}", path.display()))?;
        stops.extend(read_stops(&text)?);
    }

    let limit = args.limit.unwrap_or(cfg.chunk_limit);
    let concurrency = args.concurrency.unwrap_or(cfg.fetch_concurrency);
    let fetcher = HttpRouteFetcher::new(&cfg.route, cfg.route_api_key())?;
    let stitcher = RouteStitcher::new(limit)
        .concurrency(concurrency)
        .cancel_token(control.register(ROUTE_JOB));
    tracing::info!(stops = stops.len(), limit, concurrency, "computing route");

    let result = tokio::task::spawn_blocking(move || stitcher.compute(&stops, &fetcher)).await;
    control.unregister(ROUTE_JOB);
    let route = result??;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&route)?);
    } else {
        print_summary(&route);
    }
    Ok(())
}

fn print_summary(route: &RouteDetail) {
    println!(
        "{:.1} km, {:.0} min, {} geometry points from {} request(s)",
        route.distance_m / 1000.0,
        route.duration_secs / 60.0,
        route.geometry.len(),
        route.chunk_count
    );
}

/// Stops from text: one `lat,lon` per line; blank lines and `#` comments skipped.
pub(crate) fn read_stops(text: &str) -> Result<Vec<Stop>> {
    let mut stops = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let stop = parse_stop(line).map_err(|e| anyhow::anyhow!("line {}: {}", n + 1, e))?;
        stops.push(stop);
    }
    Ok(stops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_stops_skipping_comments() {
        let text = "# depot\n48.20,16.37\n\n48.21, 16.38  # first drop\n-33.86,151.21\n";
        let stops = read_stops(text).unwrap();
        assert_eq!(stops.len(), 3);
        assert_eq!(stops[1].lon, 16.38);
        assert_eq!(stops[2].lat, -33.86);
    }

    #[test]
    fn bad_line_is_reported_with_number() {
        let err = read_stops("1,2\nnorth,south\n").unwrap_err();
        assert!(err.to_string().starts_with("line 2:"));
    }
}
