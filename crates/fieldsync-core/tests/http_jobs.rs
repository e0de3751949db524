//! Integration tests: routing adapter and reference jobs against a local HTTP server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use fieldsync_core::config::{FieldsyncConfig, RouteServiceConfig, SyncEndpoint};
use fieldsync_core::geo::{Coordinate, Stop};
use fieldsync_core::job::{
    keys, FaultSink, JobContext, JobOutcome, JobRunner, Payload, PayloadValue, ProgressSink,
    Session, TracingFaults, TracingProgress,
};
use fieldsync_core::retry::{FailureKind, FetchError};
use fieldsync_core::route::{compute_route, HttpRouteFetcher, RouteError, RouteStitcher};
use fieldsync_core::sync::{SubTask, SyncOrchestrator};
use fieldsync_core::tasks::{
    HttpLocationReporter, HttpSubTask, HttpUploader, LocationJob, SyncJob, UploadJob,
};

fn route_config(base_url: &str, profile: &str) -> RouteServiceConfig {
    RouteServiceConfig {
        base_url: base_url.to_string(),
        profile: profile.to_string(),
        api_key: None,
        timeout_secs: 5,
    }
}

/// Quarter-degree steps keep every coordinate exact through the text round trip.
fn stops(n: usize) -> Vec<Stop> {
    (0..n)
        .map(|i| Coordinate::new(40.0 + i as f64 * 0.25, 10.0 + i as f64 * 0.5))
        .collect()
}

fn sinks() -> (Arc<dyn ProgressSink>, Arc<dyn FaultSink>) {
    (Arc::new(TracingProgress), Arc::new(TracingFaults))
}

#[test]
fn chunked_route_matches_single_request() {
    let server = common::field_server::start();
    let fetcher = HttpRouteFetcher::new(&route_config(&server.base_url, "driving"), None).unwrap();
    let stops = stops(41);

    let chunked = compute_route(&stops, 20, &fetcher).expect("chunked route");
    assert_eq!(server.count_prefix("/route/"), 3);
    let whole = compute_route(&stops, 41, &fetcher).expect("single-request route");
    assert_eq!(server.count_prefix("/route/"), 4);

    assert_eq!(chunked.chunk_count, 3);
    assert_eq!(whole.chunk_count, 1);
    assert_eq!(chunked.duration_secs, whole.duration_secs);
    assert_eq!(chunked.distance_m, whole.distance_m);
    assert_eq!(chunked.duration_secs, 40.0 * 60.0);
    assert_eq!(chunked.geometry.len(), 41);
    assert_eq!(chunked.geometry, stops);
}

#[test]
fn concurrent_chunks_stitch_in_order() {
    let server = common::field_server::start();
    let fetcher = HttpRouteFetcher::new(&route_config(&server.base_url, "driving"), None).unwrap();
    let stops = stops(57);

    let sequential = RouteStitcher::new(10).compute(&stops, &fetcher).unwrap();
    let concurrent = RouteStitcher::new(10)
        .concurrency(4)
        .compute(&stops, &fetcher)
        .unwrap();
    assert_eq!(sequential, concurrent);
    assert_eq!(concurrent.geometry, stops);
}

#[test]
fn rejected_route_names_the_failing_chunk() {
    let server = common::field_server::start();
    let fetcher = HttpRouteFetcher::new(&route_config(&server.base_url, "broken"), None).unwrap();

    let err = compute_route(&stops(5), 20, &fetcher).unwrap_err();
    match &err {
        RouteError::Fetch {
            chunk_index,
            source: FetchError::Client { status, .. },
        } => {
            assert_eq!(*chunk_index, 0);
            assert_eq!(*status, 400);
        }
        other => panic!("expected client fetch error, got {other:?}"),
    }
    assert_eq!(err.kind(), FailureKind::Permanent);
    assert!(err.to_string().starts_with("no route: chunk 0 failed because HTTP 400"));
}

#[test]
fn sync_job_tallies_each_endpoint() {
    let server = common::field_server::start();
    let mut cfg = FieldsyncConfig::default();
    cfg.sync.subtask_timeout_secs = 5;
    cfg.sync.endpoints = ["ok", "down", "ok"]
        .iter()
        .enumerate()
        .map(|(i, path)| SyncEndpoint {
            name: format!("source-{i}"),
            url: format!("{}/sync/{}", server.base_url, path),
        })
        .collect();
    let (progress, faults) = sinks();
    let runner = JobRunner::new(progress.clone(), faults.clone());
    let mut job = SyncJob::from_config(&cfg, progress, faults);

    let outcome = runner.run(&mut job, &JobContext::offline_aware(0, true));
    let out = outcome.output().expect("partial success is success");
    assert_eq!(out.payload.get_i64(keys::SUCCESS_COUNT), Some(2));
    assert_eq!(out.payload.get_i64(keys::FAILURE_COUNT), Some(1));
    let tally = out.tally.as_ref().unwrap();
    assert_eq!(tally.get("source-1"), Some(false));
    assert_eq!(server.count_prefix("/sync/"), 3);
}

#[test]
fn unreachable_sync_source_is_recorded_false() {
    let closed = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let task: Arc<dyn SubTask> = Arc::new(HttpSubTask::new(
        "offline-source",
        &format!("http://127.0.0.1:{closed}/sync/ok"),
        Duration::from_secs(2),
    ));
    assert!(task.run().is_err());

    let (progress, faults) = sinks();
    let tally = SyncOrchestrator::new(progress, faults)
        .with_wait(Duration::from_secs(5))
        .execute(&[task], &Default::default());
    assert_eq!(tally.get("offline-source"), Some(false));
    assert!(tally.all_failed());
}

#[test]
fn location_job_posts_json() {
    let server = common::field_server::start();
    let reporter = HttpLocationReporter::new(&format!("{}/locations", server.base_url)).unwrap();
    let (progress, faults) = sinks();
    let runner = JobRunner::new(progress, faults);
    let ctx = JobContext::offline_aware(0, true)
        .with_input(
            Payload::new()
                .with(keys::LATITUDE, PayloadValue::Float(-33.86))
                .with(keys::LONGITUDE, PayloadValue::Float(151.21)),
        )
        .with_session(Session {
            user_id: "driver-12".into(),
        });

    let outcome = runner.run(&mut LocationJob::new(reporter), &ctx);
    assert!(outcome.is_success());

    let posts: Vec<_> = server
        .requests()
        .into_iter()
        .filter(|r| r.method == "POST")
        .collect();
    assert_eq!(posts.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&posts[0].body).unwrap();
    assert!((body["latitude"].as_f64().unwrap() + 33.86).abs() < 1e-9);
    assert_eq!(body["user_id"], "driver-12");
}

#[test]
fn upload_job_sends_file_bytes() {
    let server = common::field_server::start();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meter.jpg");
    std::fs::write(&path, b"not really a jpeg").unwrap();

    let uploader = HttpUploader::new(&format!("{}/upload", server.base_url)).unwrap();
    let (progress, faults) = sinks();
    let runner = JobRunner::new(progress, faults);
    let ctx = JobContext::offline_aware(0, true)
        .with_input(Payload::new().with(
            keys::FILE_PATH,
            PayloadValue::Text(path.display().to_string()),
        ))
        .with_session(Session {
            user_id: "inspector".into(),
        });

    let outcome = runner.run(&mut UploadJob::new(uploader), &ctx);
    let out = outcome.output().expect("upload succeeds");
    assert_eq!(out.payload.get_str(keys::UPLOADED_FILE), Some("stored/meter.jpg"));

    let upload = server
        .requests()
        .into_iter()
        .find(|r| r.target.starts_with("/upload"))
        .unwrap();
    assert_eq!(upload.body, b"not really a jpeg");
    assert!(upload.target.contains("user=inspector"));
}

#[test]
fn rejected_location_report_fails_without_retry() {
    let server = common::field_server::start();
    let reporter = HttpLocationReporter::new(&format!("{}/nowhere", server.base_url)).unwrap();
    let (progress, faults) = sinks();
    let runner = JobRunner::new(progress, faults);
    let ctx = JobContext::offline_aware(0, true).with_input(
        Payload::new()
            .with(keys::LATITUDE, PayloadValue::Float(1.0))
            .with(keys::LONGITUDE, PayloadValue::Float(2.0)),
    );
    // 404 is a client error: permanent, so the job fails outright.
    assert_eq!(
        runner.run(&mut LocationJob::new(reporter), &ctx),
        JobOutcome::Failure
    );
}
