//! PostgreSQL implementation of the URL repository.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{CodeUpdate, ListQuery, OwnerFilter, UrlRepository, UrlSummary};
use crate::error::AppError;
use crate::utils::db_error::is_unique_violation_on_code;

const RECORD_COLUMNS: &str =
    "id, original_url, short_code, created_at, updated_at, clicks, owner_id, flagged, flag_reason";

/// PostgreSQL repository for URL records.
///
/// Uniqueness is enforced by the `urls_short_code_key` constraint, so claims
/// stay linearizable across any number of service instances sharing the
/// database. Click counting is a single-statement atomic increment.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

/// Escapes `LIKE` metacharacters so user input matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Appends the `WHERE` clause shared by the page query and the count query.
fn push_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    owner: &'a OwnerFilter,
    pattern: Option<String>,
) {
    builder.push(" WHERE TRUE");

    match owner {
        OwnerFilter::Any => {}
        OwnerFilter::User(id) => {
            builder.push(" AND owner_id = ").push_bind(id.as_str());
        }
        OwnerFilter::Anonymous => {
            builder.push(" AND owner_id IS NULL");
        }
    }

    if let Some(pattern) = pattern {
        builder
            .push(" AND (original_url ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR short_code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn insert_if_absent(
        &self,
        new_record: NewUrlRecord,
    ) -> Result<Option<UrlRecord>, AppError> {
        let sql = format!(
            r#"
            INSERT INTO urls (original_url, short_code, owner_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (short_code) DO NOTHING
            RETURNING {RECORD_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, UrlRecord>(&sql)
            .bind(&new_record.original_url)
            .bind(&new_record.short_code)
            .bind(&new_record.owner_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(record)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, AppError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM urls WHERE short_code = $1");

        Ok(sqlx::query_as::<_, UrlRecord>(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UrlRecord>, AppError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM urls WHERE id = $1");

        Ok(sqlx::query_as::<_, UrlRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?)
    }

    async fn list_by_owner(
        &self,
        owner: OwnerFilter,
        query: ListQuery,
    ) -> Result<(Vec<UrlRecord>, i64), AppError> {
        let pattern = query
            .search_term()
            .map(|term| format!("%{}%", escape_like(term)));
        let (offset, limit) = query.offset_limit();

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM urls");
        push_filters(&mut count_query, &owner, pattern.clone());
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;

        let mut page_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RECORD_COLUMNS} FROM urls"
        ));
        push_filters(&mut page_query, &owner, pattern);
        page_query
            .push(" ORDER BY ")
            .push(query.sort_by.column())
            .push(" ")
            .push(query.sort_dir.keyword())
            .push(", id ")
            .push(query.sort_dir.keyword())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let records = page_query
            .build_query_as::<UrlRecord>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok((records, total))
    }

    async fn increment_clicks(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE urls SET clicks = clicks + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_code(&self, id: i64, new_code: &str) -> Result<CodeUpdate, AppError> {
        let sql = format!(
            r#"
            UPDATE urls
            SET short_code = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        );

        let result = sqlx::query_as::<_, UrlRecord>(&sql)
            .bind(id)
            .bind(new_code)
            .fetch_optional(self.pool.as_ref())
            .await;

        match result {
            Ok(Some(record)) => Ok(CodeUpdate::Updated(record)),
            Ok(None) => Ok(CodeUpdate::NotFound),
            Err(e) if is_unique_violation_on_code(&e) => Ok(CodeUpdate::Taken),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_flag(
        &self,
        id: i64,
        flagged: bool,
        reason: Option<String>,
    ) -> Result<Option<UrlRecord>, AppError> {
        let sql = format!(
            r#"
            UPDATE urls
            SET flagged = $2,
                flag_reason = CASE WHEN $2 THEN $3 ELSE NULL END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        );

        Ok(sqlx::query_as::<_, UrlRecord>(&sql)
            .bind(id)
            .bind(flagged)
            .bind(reason)
            .fetch_optional(self.pool.as_ref())
            .await?)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM urls WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_owner(&self, owner_id: &str) -> Result<u64, AppError> {
        let result =
            sqlx::query("UPDATE urls SET owner_id = NULL, updated_at = NOW() WHERE owner_id = $1")
                .bind(owner_id)
                .execute(self.pool.as_ref())
                .await?;

        Ok(result.rows_affected())
    }

    async fn summary(&self) -> Result<UrlSummary, AppError> {
        let (total_urls, total_clicks, flagged_urls, anonymous_urls): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(clicks), 0)::BIGINT,
                    COUNT(*) FILTER (WHERE flagged),
                    COUNT(*) FILTER (WHERE owner_id IS NULL)
                FROM urls
                "#,
            )
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(UrlSummary {
            total_urls,
            total_clicks,
            flagged_urls,
            anonymous_urls,
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
