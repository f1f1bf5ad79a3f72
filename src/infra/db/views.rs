use async_trait::async_trait;

use crate::{
    application::repos::{RepoError, ViewCountersRepo},
    domain::types::CounterKey,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CountRow {
    count: i64,
}

#[async_trait]
impl ViewCountersRepo for PostgresRepositories {
    async fn read_count(&self, key: &CounterKey) -> Result<Option<i64>, RepoError> {
        let row = sqlx::query_as::<_, CountRow>(
            r#"
            SELECT count
            FROM view_counters
            WHERE key = $1
            "#,
        )
        .bind(key.storage_key())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| row.count))
    }

    async fn increment(&self, key: &CounterKey) -> Result<i64, RepoError> {
        let row = sqlx::query_as::<_, CountRow>(
            r#"
            INSERT INTO view_counters (key, count)
            VALUES ($1, 1)
            ON CONFLICT (key) DO UPDATE
            SET count = view_counters.count + 1,
                updated_at = now()
            RETURNING count
            "#,
        )
        .bind(key.storage_key())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.count)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await.map_err(map_sqlx_error)
    }
}
