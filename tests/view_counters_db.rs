use std::sync::Arc;

use futures::future::join_all;
use sqlx::PgPool;

use folio::application::repos::ViewCountersRepo;
use folio::application::retry::RetryPolicy;
use folio::application::views::{ViewCounterService, Visit};
use folio::domain::types::CounterKey;
use folio::infra::db::PostgresRepositories;

fn post_key(slug: &str) -> CounterKey {
    CounterKey::post(slug).expect("key")
}

#[sqlx::test(migrations = "./migrations")]
async fn absent_keys_read_as_none(pool: PgPool) {
    let repo = PostgresRepositories::new(pool);

    assert_eq!(repo.read_count(&post_key("missing")).await.expect("read"), None);
    assert_eq!(repo.read_count(&CounterKey::SiteTotal).await.expect("read"), None);
}

#[sqlx::test(migrations = "./migrations")]
async fn first_increment_creates_the_row_at_one(pool: PgPool) {
    let repo = PostgresRepositories::new(pool.clone());
    let key = post_key("alpha");

    assert_eq!(repo.increment(&key).await.expect("increment"), 1);
    assert_eq!(repo.read_count(&key).await.expect("read"), Some(1));

    let stored: i64 = sqlx::query_scalar("SELECT count FROM view_counters WHERE key = $1")
        .bind("post:alpha")
        .fetch_one(&pool)
        .await
        .expect("fetch stored count");
    assert_eq!(stored, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn increment_moves_an_existing_count_by_one(pool: PgPool) {
    sqlx::query("INSERT INTO view_counters (key, count) VALUES ($1, $2)")
        .bind("blog_total_views")
        .bind(41_i64)
        .execute(&pool)
        .await
        .expect("seed counter");
    let repo = PostgresRepositories::new(pool);

    assert_eq!(repo.increment(&CounterKey::SiteTotal).await.expect("increment"), 42);
    assert_eq!(
        repo.read_count(&CounterKey::SiteTotal).await.expect("read"),
        Some(42)
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn post_and_site_rows_are_kept_apart(pool: PgPool) {
    let repo = PostgresRepositories::new(pool);

    repo.increment(&CounterKey::SiteTotal).await.expect("increment");
    repo.increment(&post_key("blog_total_views")).await.expect("increment");
    repo.increment(&post_key("blog_total_views")).await.expect("increment");

    assert_eq!(
        repo.read_count(&CounterKey::SiteTotal).await.expect("read"),
        Some(1)
    );
    assert_eq!(
        repo.read_count(&post_key("blog_total_views")).await.expect("read"),
        Some(2)
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_increments_are_not_lost(pool: PgPool) {
    let repo = PostgresRepositories::new(pool);
    let key = post_key("busy");

    let results = join_all((0..20).map(|_| repo.increment(&key))).await;
    let mut counts: Vec<i64> = results
        .into_iter()
        .map(|result| result.expect("increment"))
        .collect();
    counts.sort_unstable();

    assert_eq!(counts, (1..=20).collect::<Vec<i64>>());
    assert_eq!(repo.read_count(&key).await.expect("read"), Some(20));
}

#[sqlx::test(migrations = "./migrations")]
async fn service_counts_first_visits_only(pool: PgPool) {
    let service = ViewCounterService::new(
        Arc::new(PostgresRepositories::new(pool)),
        RetryPolicy::none(),
    );
    let key = post_key("gamma");

    assert_eq!(service.record(&key, Visit::Repeat).await.expect("repeat"), 0);
    assert_eq!(service.record(&key, Visit::FirstInWindow).await.expect("first"), 1);
    assert_eq!(service.record(&key, Visit::Repeat).await.expect("repeat"), 1);
    assert_eq!(service.current(&key).await.expect("current"), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn health_check_reaches_the_database(pool: PgPool) {
    let repo = PostgresRepositories::new(pool);
    repo.health_check().await.expect("health check");
}
