//! Contact list repository implementation
//!
//! Membership lives in the `contact_list_contacts` join table. Deleting a list
//! cascades only to the join rows, never to the contacts.

use super::contact_repo::{ContactRow, CONTACT_COLUMNS};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dialer_core::{
    models::{ContactList, ContactListWithContacts},
    traits::ContactListRepository,
    AppError, AppResult,
};
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, instrument};

const LIST_COLUMNS: &str = "id, user_id, name, created_at";

/// PostgreSQL implementation of ContactListRepository
pub struct PgContactListRepository {
    pool: PgPool,
}

impl PgContactListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactListRepository for PgContactListRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, owner: i64, id: i64) -> AppResult<Option<ContactList>> {
        let query = format!(
            "SELECT {} FROM contact_lists WHERE id = $1 AND user_id = $2",
            LIST_COLUMNS
        );

        let row = sqlx::query_as::<_, ContactListRow>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding contact list {}: {}", id, e);
                AppError::Database(format!("Failed to find contact list: {}", e))
            })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_with_contacts(&self, id: i64) -> AppResult<Option<ContactListWithContacts>> {
        debug!("Loading contact list {} with members", id);

        let query = format!("SELECT {} FROM contact_lists WHERE id = $1", LIST_COLUMNS);

        let list = sqlx::query_as::<_, ContactListRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding contact list {}: {}", id, e);
                AppError::Database(format!("Failed to find contact list: {}", e))
            })?;

        let Some(list) = list else {
            return Ok(None);
        };

        let members_query = format!(
            r#"
            SELECT {}
            FROM contacts c
            JOIN contact_list_contacts m ON m.contact_id = c.id
            WHERE m.contact_list_id = $1
            ORDER BY c.id
            "#,
            CONTACT_COLUMNS
                .split(", ")
                .map(|col| format!("c.{}", col))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let contacts = sqlx::query_as::<_, ContactRow>(&members_query)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error loading members of list {}: {}", id, e);
                AppError::Database(format!("Failed to load list members: {}", e))
            })?;

        Ok(Some(ContactListWithContacts {
            list: list.into(),
            contacts: contacts.into_iter().map(Into::into).collect(),
        }))
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        owner: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<ContactList>, i64)> {
        let total: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM contact_lists WHERE user_id = $1")
                .bind(owner)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    error!("Database error counting contact lists: {}", e);
                    AppError::Database(format!("Failed to count contact lists: {}", e))
                })?;

        let query = format!(
            "SELECT {} FROM contact_lists WHERE user_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
            LIST_COLUMNS
        );

        let rows = sqlx::query_as::<_, ContactListRow>(&query)
            .bind(owner)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing contact lists: {}", e);
                AppError::Database(format!("Failed to fetch contact lists: {}", e))
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    #[instrument(skip(self))]
    async fn create(&self, owner: i64, name: &str) -> AppResult<ContactList> {
        let query = format!(
            "INSERT INTO contact_lists (user_id, name) VALUES ($1, $2) RETURNING {}",
            LIST_COLUMNS
        );

        let row = sqlx::query_as::<_, ContactListRow>(&query)
            .bind(owner)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating contact list: {}", e);
                AppError::Database(format!("Failed to create contact list: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn rename(&self, owner: i64, id: i64, name: &str) -> AppResult<Option<ContactList>> {
        let query = format!(
            "UPDATE contact_lists SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING {}",
            LIST_COLUMNS
        );

        let row = sqlx::query_as::<_, ContactListRow>(&query)
            .bind(id)
            .bind(owner)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error renaming contact list {}: {}", id, e);
                AppError::Database(format!("Failed to update contact list: {}", e))
            })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner: i64, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM contact_lists WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting contact list {}: {}", id, e);
                AppError::Database(format!("Failed to delete contact list: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn add_contact(&self, list_id: i64, contact_id: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO contact_list_contacts (contact_list_id, contact_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(list_id)
        .bind(contact_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error adding contact {} to list {}: {}", contact_id, list_id, e);
            AppError::Database(format!("Failed to add list member: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_contact(&self, list_id: i64, contact_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM contact_list_contacts WHERE contact_list_id = $1 AND contact_id = $2",
        )
        .bind(list_id)
        .bind(contact_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error removing contact {} from list {}: {}", contact_id, list_id, e);
            AppError::Database(format!("Failed to remove list member: {}", e))
        })?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, FromRow)]
struct ContactListRow {
    id: i64,
    user_id: i64,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<ContactListRow> for ContactList {
    fn from(row: ContactListRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}
