mod support;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use futures::future::join_all;
use serde_json::json;

use folio::application::repos::ViewCountersRepo;
use folio::domain::types::CounterKey;

use support::{
    BrokenCounters, FakeSource, app, app_with, body_json, get, post, sample_project, send,
    set_cookies,
};

#[tokio::test]
async fn total_views_read_as_zero_before_any_visit() {
    let (app, _) = app(FakeSource::default());

    let response = send(&app.router, get("/api/page-views")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "totalViews": 0 }));
}

#[tokio::test]
async fn first_site_visit_counts_once_and_sets_visitor_cookie() {
    let (app, counters) = app(FakeSource::default());
    counters.set(&CounterKey::SiteTotal, 41);

    let first = send(&app.router, post("/api/page-views", None)).await;
    assert_eq!(first.status(), StatusCode::OK);
    let cookies = set_cookies(&first);
    let visitor = cookies.get("blog_visitor_id").expect("visitor cookie").clone();
    assert!(!visitor.is_empty());
    assert_eq!(body_json(first).await, json!({ "totalViews": 42 }));

    let cookie = format!("blog_visitor_id={visitor}");
    let repeat = send(&app.router, post("/api/page-views", Some(&cookie))).await;
    assert_eq!(repeat.status(), StatusCode::OK);
    assert!(set_cookies(&repeat).is_empty());
    assert_eq!(body_json(repeat).await, json!({ "totalViews": 42 }));
}

#[tokio::test]
async fn post_views_count_once_per_cookie_window() {
    let (app, counters) = app(FakeSource::default());
    let key = CounterKey::post("hello").expect("key");
    counters.set(&key, 7);

    let first = send(&app.router, post("/api/views/hello", None)).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(
        set_cookies(&first).get("post_viewed_hello").map(String::as_str),
        Some("true")
    );
    assert_eq!(body_json(first).await, json!({ "views": 8 }));

    let repeat = send(
        &app.router,
        post("/api/views/hello", Some("post_viewed_hello=true")),
    )
    .await;
    assert_eq!(body_json(repeat).await, json!({ "views": 8 }));

    let read = send(&app.router, get("/api/views/hello")).await;
    assert_eq!(body_json(read).await, json!({ "views": 8 }));
}

#[tokio::test]
async fn post_cookie_only_covers_its_own_slug() {
    let (app, _) = app(FakeSource::default());

    let other = send(
        &app.router,
        post("/api/views/second", Some("post_viewed_first=true")),
    )
    .await;

    assert_eq!(body_json(other).await, json!({ "views": 1 }));
}

#[tokio::test]
async fn blank_slugs_are_rejected() {
    let (app, _) = app(FakeSource::default());

    for request in [
        get("/api/views/"),
        post("/api/views/", None),
        get("/api/views/%20"),
        post("/api/views/%20%20", None),
    ] {
        let response = send(&app.router, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "Slug not found" }));
    }
}

#[tokio::test]
async fn concurrent_first_visits_are_all_counted() {
    let (app, counters) = app(FakeSource::default());
    let router = Arc::new(app.router);
    let key = CounterKey::post("busy").expect("key");

    let responses = join_all((0..25).map(|_| {
        let router = Arc::clone(&router);
        async move { send(&router, post("/api/views/busy", None)).await }
    }))
    .await;
    assert!(
        responses
            .iter()
            .all(|response| response.status() == StatusCode::OK)
    );

    let response = send(&router, get("/api/views/busy")).await;
    assert_eq!(body_json(response).await, json!({ "views": 25 }));

    let mut counts: Vec<i64> = Vec::new();
    for response in responses {
        counts.push(body_json(response).await["views"].as_i64().expect("count"));
    }
    counts.sort_unstable();
    assert_eq!(counts, (1..=25).collect::<Vec<i64>>());
    assert_eq!(
        counters.read_count(&key).await.expect("read"),
        Some(25)
    );
}

#[tokio::test]
async fn store_failures_surface_as_json_errors() {
    let app = app_with(FakeSource::default(), Arc::new(BrokenCounters));

    let cases = [
        (get("/api/page-views"), "Failed to fetch total page views"),
        (post("/api/page-views", None), "Failed to update total page views"),
        (get("/api/views/hello"), "Failed to fetch view count"),
        (post("/api/views/hello", None), "Failed to update view count"),
        (
            post("/api/views/hello", Some("post_viewed_hello=true")),
            "Failed to fetch view count",
        ),
    ];

    for (request, message) in cases {
        let response = send(&app.router, request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(set_cookies(&response).is_empty());
        assert_eq!(body_json(response).await, json!({ "error": message }));
    }
}

#[tokio::test]
async fn projects_are_listed_with_their_fields() {
    let source = FakeSource {
        projects: vec![sample_project("p1", "folio"), sample_project("p2", "kiln")],
        ..FakeSource::default()
    };
    let (app, _) = app(source);

    let response = send(&app.router, get("/api/projects")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let projects = body.as_array().expect("array");
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0]["slug"], "folio");
    assert_eq!(projects[0]["tech_stack"], json!(["Rust", "Postgres"]));
    assert_eq!(projects[1]["date_range"], "2023 - 2024");
}

#[tokio::test]
async fn project_listing_failure_returns_empty_array() {
    let (app, _) = app(FakeSource::default());
    app.source.unavailable.store(true, Ordering::SeqCst);

    let response = send(&app.router, get("/api/projects")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn single_project_is_cacheable() {
    let source = FakeSource {
        projects: vec![sample_project("p1", "folio")],
        ..FakeSource::default()
    };
    let (app, _) = app(source);

    let response = send(&app.router, get("/api/projects/folio")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("cache-control")
            .and_then(|value| value.to_str().ok()),
        Some("public, s-maxage=300, stale-while-revalidate=600")
    );
    let body = body_json(response).await;
    assert_eq!(body["id"], "p1");
    assert_eq!(body["content"], "Built with Rust.");
}

#[tokio::test]
async fn project_lookup_errors_map_to_statuses() {
    let source = FakeSource {
        projects: vec![sample_project("p1", "folio")],
        ..FakeSource::default()
    };
    let (app, _) = app(source);

    let missing = send(&app.router, get("/api/projects/unknown")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await, json!({ "error": "Project not found" }));

    let blank = send(&app.router, get("/api/projects/")).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(blank).await,
        json!({ "error": "Project slug is required" })
    );

    app.source.unavailable.store(true, Ordering::SeqCst);
    let failing = send(&app.router, get("/api/projects/folio")).await;
    assert_eq!(failing.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(failing).await,
        json!({ "error": "Internal server error" })
    );
}
