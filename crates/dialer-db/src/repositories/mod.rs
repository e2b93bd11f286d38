//! Repository implementations
//!
//! This module contains concrete implementations of the repository traits
//! defined in dialer-core, using sqlx for PostgreSQL access.

pub mod call_record_repo;
pub mod contact_list_repo;
pub mod contact_repo;
pub mod user_repo;

pub use call_record_repo::PgCallRecordRepository;
pub use contact_list_repo::PgContactListRepository;
pub use contact_repo::PgContactRepository;
pub use user_repo::PgUserRepository;

/// True when the error is a unique constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
