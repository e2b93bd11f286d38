//! Contact repository implementation
//!
//! Every query is scoped by owning user; a contact owned by someone else is
//! indistinguishable from a missing one.

use super::is_unique_violation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dialer_core::{
    models::{Contact, ContactDraft},
    traits::ContactRepository,
    AppError, AppResult,
};
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, instrument};

pub(crate) const CONTACT_COLUMNS: &str =
    "id, user_id, first_name, last_name, city, phone_number, created_at, updated_at";

/// PostgreSQL implementation of ContactRepository
pub struct PgContactRepository {
    pool: PgPool,
}

impl PgContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_write_error(e: sqlx::Error, draft: &ContactDraft) -> AppError {
        if is_unique_violation(&e) {
            AppError::AlreadyExists(format!(
                "Contact with phone number {} already exists",
                draft.phone_number
            ))
        } else {
            error!("Database error writing contact: {}", e);
            AppError::Database(format!("Failed to save contact: {}", e))
        }
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, owner: i64, id: i64) -> AppResult<Option<Contact>> {
        let query = format!(
            "SELECT {} FROM contacts WHERE id = $1 AND user_id = $2",
            CONTACT_COLUMNS
        );

        let row = sqlx::query_as::<_, ContactRow>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding contact {}: {}", id, e);
                AppError::Database(format!("Failed to find contact: {}", e))
            })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list(&self, owner: i64, limit: i64, offset: i64) -> AppResult<(Vec<Contact>, i64)> {
        debug!("Listing contacts with limit {} offset {}", limit, offset);

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contacts WHERE user_id = $1")
            .bind(owner)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting contacts: {}", e);
                AppError::Database(format!("Failed to count contacts: {}", e))
            })?;

        let query = format!(
            "SELECT {} FROM contacts WHERE user_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
            CONTACT_COLUMNS
        );

        let rows = sqlx::query_as::<_, ContactRow>(&query)
            .bind(owner)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing contacts: {}", e);
                AppError::Database(format!("Failed to fetch contacts: {}", e))
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    #[instrument(skip(self, draft))]
    async fn create(&self, owner: i64, draft: &ContactDraft) -> AppResult<Contact> {
        debug!("Creating contact {}", draft.phone_number);

        let query = format!(
            r#"
            INSERT INTO contacts (user_id, first_name, last_name, city, phone_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        );

        let row = sqlx::query_as::<_, ContactRow>(&query)
            .bind(owner)
            .bind(&draft.first_name)
            .bind(&draft.last_name)
            .bind(&draft.city)
            .bind(&draft.phone_number)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(e, draft))?;

        Ok(row.into())
    }

    #[instrument(skip(self, draft))]
    async fn update(
        &self,
        owner: i64,
        id: i64,
        draft: &ContactDraft,
    ) -> AppResult<Option<Contact>> {
        let query = format!(
            r#"
            UPDATE contacts
            SET first_name = $3,
                last_name = $4,
                city = $5,
                phone_number = $6,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        );

        let row = sqlx::query_as::<_, ContactRow>(&query)
            .bind(id)
            .bind(owner)
            .bind(&draft.first_name)
            .bind(&draft.last_name)
            .bind(&draft.city)
            .bind(&draft.phone_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(e, draft))?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner: i64, id: i64) -> AppResult<bool> {
        debug!("Deleting contact: {}", id);

        let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting contact {}: {}", id, e);
                AppError::Database(format!("Failed to delete contact: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, FromRow)]
pub(crate) struct ContactRow {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            city: row.city,
            phone_number: row.phone_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
