//! Call record repository implementation
//!
//! The unique key on `external_id` carries both idempotency guarantees:
//! bulk inserts skip colliding rows with `ON CONFLICT DO NOTHING`, and status
//! updates are a single conditional `UPDATE ... RETURNING`, so an insert racing
//! a fast provider callback is serialized by PostgreSQL row locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dialer_core::{
    models::{CallRecord, CallRecordDetail, Contact, NewCallRecord},
    traits::CallRecordRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info, instrument};

/// Default rows per INSERT statement
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 5000;

const RECORD_COLUMNS: &str =
    "id, external_id, user_id, contact_id, phone_number, duration, cost, status, created_at";

const DETAIL_SELECT: &str = r#"
    SELECT
        r.id, r.external_id, r.user_id, r.contact_id, r.phone_number,
        r.duration, r.cost, r.status, r.created_at,
        c.first_name AS c_first_name, c.last_name AS c_last_name,
        c.city AS c_city, c.phone_number AS c_phone_number,
        c.created_at AS c_created_at, c.updated_at AS c_updated_at
    FROM call_records r
    LEFT JOIN contacts c ON c.id = r.contact_id
"#;

/// PostgreSQL implementation of CallRecordRepository
pub struct PgCallRecordRepository {
    pool: PgPool,
    batch_size: usize,
}

impl PgCallRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_batch_size(pool, DEFAULT_INSERT_BATCH_SIZE)
    }

    /// Chunk bulk inserts into statements of at most `batch_size` rows
    pub fn with_batch_size(pool: PgPool, batch_size: usize) -> Self {
        Self {
            pool,
            batch_size: batch_size.max(1),
        }
    }
}

/// Escape LIKE metacharacters and wrap for a substring match
fn contains_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    owner: i64,
    contact_name: Option<&str>,
    phone_number: Option<&str>,
) {
    builder.push(" WHERE r.user_id = ");
    builder.push_bind(owner);

    if let Some(name) = contact_name {
        builder.push(" AND c.first_name ILIKE ");
        builder.push_bind(contains_pattern(name));
    }

    if let Some(phone) = phone_number {
        builder.push(" AND r.phone_number ILIKE ");
        builder.push_bind(contains_pattern(phone));
    }
}

#[async_trait]
impl CallRecordRepository for PgCallRecordRepository {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_insert(&self, records: &[NewCallRecord]) -> AppResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        let mut inserted = 0u64;

        for chunk in records.chunks(self.batch_size) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO call_records \
                 (external_id, user_id, contact_id, phone_number, duration, cost, status) ",
            );

            builder.push_values(chunk, |mut row, record| {
                row.push_bind(&record.external_id)
                    .push_bind(record.user_id)
                    .push_bind(record.contact_id)
                    .push_bind(&record.phone_number)
                    .push_bind(record.duration.max(0))
                    .push_bind(record.cost.abs())
                    .push_bind(&record.status);
            });
            builder.push(" ON CONFLICT (external_id) DO NOTHING");

            let result = builder.build().execute(&mut *tx).await.map_err(|e| {
                error!("Database error inserting call records: {}", e);
                AppError::Database(format!("Failed to insert call records: {}", e))
            })?;

            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        info!(
            "Inserted {} of {} call records ({} duplicates skipped)",
            inserted,
            records.len(),
            records.len() as u64 - inserted
        );
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<CallRecord>> {
        let query = format!(
            "SELECT {} FROM call_records WHERE external_id = $1",
            RECORD_COLUMNS
        );

        let row = sqlx::query_as::<_, CallRecordRow>(&query)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding call record {}: {}", external_id, e);
                AppError::Database(format!("Failed to find call record: {}", e))
            })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        external_id: &str,
        status: &str,
        duration: Option<i32>,
    ) -> AppResult<CallRecord> {
        debug!("Updating call record {} to {}", external_id, status);

        let query = format!(
            r#"
            UPDATE call_records
            SET status = $2,
                duration = COALESCE($3, duration)
            WHERE external_id = $1
            RETURNING {}
            "#,
            RECORD_COLUMNS
        );

        let row = sqlx::query_as::<_, CallRecordRow>(&query)
            .bind(external_id)
            .bind(status)
            .bind(duration.map(|d| d.max(0)))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating call record {}: {}", external_id, e);
                AppError::Database(format!("Failed to update call record: {}", e))
            })?;

        row.map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("Call record {} not found", external_id)))
    }

    #[instrument(skip(self))]
    async fn list_filtered(
        &self,
        owner: i64,
        contact_name: Option<&str>,
        phone_number: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<CallRecordDetail>, i64)> {
        debug!(
            "Listing call records: contact_name={:?}, phone_number={:?}, limit={}, offset={}",
            contact_name, phone_number, limit, offset
        );

        let mut count_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM call_records r LEFT JOIN contacts c ON c.id = r.contact_id",
        );
        push_filters(&mut count_builder, owner, contact_name, phone_number);

        let total: (i64,) = count_builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting call records: {}", e);
                AppError::Database(format!("Failed to count call records: {}", e))
            })?;

        let mut data_builder: QueryBuilder<Postgres> = QueryBuilder::new(DETAIL_SELECT);
        push_filters(&mut data_builder, owner, contact_name, phone_number);
        data_builder.push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ");
        data_builder.push_bind(limit);
        data_builder.push(" OFFSET ");
        data_builder.push_bind(offset);

        let rows = data_builder
            .build_query_as::<CallRecordDetailRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing call records: {}", e);
                AppError::Database(format!("Failed to fetch call records: {}", e))
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, owner: i64, id: i64) -> AppResult<Option<CallRecordDetail>> {
        let query = format!("{} WHERE r.id = $1 AND r.user_id = $2", DETAIL_SELECT);

        let row = sqlx::query_as::<_, CallRecordDetailRow>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding call record {}: {}", id, e);
                AppError::Database(format!("Failed to find call record: {}", e))
            })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner: i64, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM call_records WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting call record {}: {}", id, e);
                AppError::Database(format!("Failed to delete call record: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, FromRow)]
struct CallRecordRow {
    id: i64,
    external_id: String,
    user_id: i64,
    contact_id: Option<i64>,
    phone_number: String,
    duration: i32,
    cost: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<CallRecordRow> for CallRecord {
    fn from(row: CallRecordRow) -> Self {
        Self {
            id: row.id,
            external_id: row.external_id,
            user_id: row.user_id,
            contact_id: row.contact_id,
            phone_number: row.phone_number,
            duration: row.duration,
            cost: row.cost,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// Call record joined with its contact's columns (all null once deleted)
#[derive(Debug, FromRow)]
struct CallRecordDetailRow {
    #[sqlx(flatten)]
    record: CallRecordRow,
    c_first_name: Option<String>,
    c_last_name: Option<String>,
    c_city: Option<String>,
    c_phone_number: Option<String>,
    c_created_at: Option<DateTime<Utc>>,
    c_updated_at: Option<DateTime<Utc>>,
}

impl From<CallRecordDetailRow> for CallRecordDetail {
    fn from(row: CallRecordDetailRow) -> Self {
        let contact = match (
            row.record.contact_id,
            row.c_phone_number,
            row.c_created_at,
            row.c_updated_at,
        ) {
            (Some(id), Some(phone_number), Some(created_at), Some(updated_at)) => Some(Contact {
                id,
                user_id: row.record.user_id,
                first_name: row.c_first_name.unwrap_or_default(),
                last_name: row.c_last_name.unwrap_or_default(),
                city: row.c_city.unwrap_or_default(),
                phone_number,
                created_at,
                updated_at,
            }),
            _ => None,
        };

        Self {
            record: row.record.into(),
            contact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{create_pool, run_migrations};
    use dialer_core::config::DatabaseConfig;
    use rust_decimal_macros::dec;

    fn record_row(contact_id: Option<i64>) -> CallRecordRow {
        CallRecordRow {
            id: 1,
            external_id: "CA1".to_string(),
            user_id: 3,
            contact_id,
            phone_number: "+1111".to_string(),
            duration: 0,
            cost: dec!(0.0075),
            status: "queued".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ada"), "%ada%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_detail_row_with_contact() {
        let now = Utc::now();
        let row = CallRecordDetailRow {
            record: record_row(Some(7)),
            c_first_name: Some("Ada".to_string()),
            c_last_name: Some("Lovelace".to_string()),
            c_city: Some("London".to_string()),
            c_phone_number: Some("+1111".to_string()),
            c_created_at: Some(now),
            c_updated_at: Some(now),
        };

        let detail: CallRecordDetail = row.into();
        let contact = detail.contact.unwrap();
        assert_eq!(contact.id, 7);
        assert_eq!(contact.first_name, "Ada");
        assert_eq!(detail.record.cost, dec!(0.0075));
    }

    #[test]
    fn test_detail_row_after_contact_deleted() {
        let row = CallRecordDetailRow {
            record: record_row(None),
            c_first_name: None,
            c_last_name: None,
            c_city: None,
            c_phone_number: None,
            c_created_at: None,
            c_updated_at: None,
        };

        let detail: CallRecordDetail = row.into();
        assert!(detail.contact.is_none());
        assert_eq!(detail.record.phone_number, "+1111");
    }

    /// Migrated pool, a fresh owner and a tag keeping external ids unique per run
    async fn setup() -> (PgPool, i64, String) {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/autodialer".to_string());

        let pool = create_pool(&DatabaseConfig {
            url,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
        })
        .await
        .unwrap();
        run_migrations(&pool).await.unwrap();

        let tag = Utc::now().timestamp_nanos_opt().unwrap_or_default().to_string();
        let (user_id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (username, password_hash) VALUES ($1, 'x') RETURNING id",
        )
        .bind(format!("call-records-{}", tag))
        .fetch_one(&pool)
        .await
        .unwrap();

        (pool, user_id, tag)
    }

    fn candidate(user_id: i64, external_id: &str, cost: Decimal) -> NewCallRecord {
        NewCallRecord {
            external_id: external_id.to_string(),
            user_id,
            contact_id: None,
            phone_number: "+1111".to_string(),
            duration: 0,
            cost,
            status: "queued".to_string(),
        }
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_bulk_insert_skips_existing_external_id() {
        let (pool, user_id, tag) = setup().await;
        let repo = PgCallRecordRepository::new(pool);
        let first = format!("CA{}-1", tag);
        let second = format!("CA{}-2", tag);

        let inserted = repo
            .bulk_insert(&[candidate(user_id, &first, dec!(0.0075))])
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let mut replay = candidate(user_id, &first, dec!(1));
        replay.status = "completed".to_string();
        let inserted = repo
            .bulk_insert(&[replay, candidate(user_id, &second, dec!(0))])
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let kept = repo.find_by_external_id(&first).await.unwrap().unwrap();
        assert_eq!(kept.status, "queued");
        assert_eq!(kept.cost, dec!(0.0075));
        assert!(repo.find_by_external_id(&second).await.unwrap().is_some());
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_bulk_insert_dedupes_within_one_batch() {
        let (pool, user_id, tag) = setup().await;
        let repo = PgCallRecordRepository::new(pool);
        let id = format!("CA{}-dup", tag);

        let inserted = repo
            .bulk_insert(&[
                candidate(user_id, &id, dec!(0)),
                candidate(user_id, &id, dec!(0)),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_bulk_insert_across_chunks() {
        let (pool, user_id, tag) = setup().await;
        let repo = PgCallRecordRepository::with_batch_size(pool, 2);

        let ids: Vec<String> = (0..4).map(|n| format!("CA{}-{}", tag, n)).collect();
        // The repeat of ids[0] lands in the second chunk
        let batch: Vec<NewCallRecord> = [&ids[0], &ids[1], &ids[2], &ids[0], &ids[3]]
            .iter()
            .map(|id| candidate(user_id, id, dec!(0)))
            .collect();

        assert_eq!(repo.bulk_insert(&batch).await.unwrap(), 4);
        assert_eq!(repo.bulk_insert(&batch).await.unwrap(), 0);

        let (_, total) = repo
            .list_filtered(user_id, None, None, 100, 0)
            .await
            .unwrap();
        assert_eq!(total, 4);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_negative_cost_is_stored_as_absolute() {
        let (pool, user_id, tag) = setup().await;
        let repo = PgCallRecordRepository::new(pool);
        let id = format!("CA{}-debit", tag);

        repo.bulk_insert(&[candidate(user_id, &id, dec!(-0.0075))])
            .await
            .unwrap();

        let stored = repo.find_by_external_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.cost, dec!(0.0075));
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_update_status_of_unknown_call() {
        let (pool, _, tag) = setup().await;
        let repo = PgCallRecordRepository::new(pool);
        let id = format!("CA{}-missing", tag);

        let err = repo.update_status(&id, "completed", Some(42)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(repo.find_by_external_id(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_update_status_keeps_duration_when_absent() {
        let (pool, user_id, tag) = setup().await;
        let repo = PgCallRecordRepository::new(pool);
        let id = format!("CA{}-dur", tag);

        let mut record = candidate(user_id, &id, dec!(0));
        record.duration = 12;
        repo.bulk_insert(&[record]).await.unwrap();

        let updated = repo.update_status(&id, "in-progress", None).await.unwrap();
        assert_eq!(updated.status, "in-progress");
        assert_eq!(updated.duration, 12);

        let updated = repo.update_status(&id, "completed", Some(42)).await.unwrap();
        assert_eq!(updated.status, "completed");
        assert_eq!(updated.duration, 42);
    }
}
