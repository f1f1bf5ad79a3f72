mod support;

use std::collections::HashSet;
use std::num::NonZeroU32;
use std::time::Duration;

use metrics_util::debugging::DebuggingRecorder;

use folio::application::content::SourceError;
use folio::application::retry::RetryPolicy;

use support::{FakeSource, app, post, send};

#[tokio::test]
async fn request_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let (app, _) = app(FakeSource::default());
    send(&app.router, post("/api/views/metrics", None)).await;
    send(&app.router, post("/api/page-views", None)).await;

    let policy = RetryPolicy::new(
        NonZeroU32::new(2).expect("non-zero"),
        Duration::ZERO,
        Duration::ZERO,
    );
    let result: Result<(), SourceError> = policy
        .run("metrics_check", || async {
            Err(SourceError::Transport("connection reset".to_string()))
        })
        .await;
    assert!(result.is_err());

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for metric in [
        "folio_views_increment_total",
        "folio_upstream_retry_total",
        "folio_http_request_duration_ms",
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
