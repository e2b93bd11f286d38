//! Contact model
//!
//! A person the owning user may call. The (owner, phone number) pair is unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier
    pub id: i64,

    /// Owning user
    pub user_id: i64,

    pub first_name: String,
    pub last_name: String,
    pub city: String,

    /// Destination number, unique per owner
    pub phone_number: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Display name ("First Last"), trimmed when a part is empty
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl Default for Contact {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id: 0,
            first_name: String::new(),
            last_name: String::new(),
            city: String::new(),
            phone_number: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Mutable contact fields, used for both creation and full updates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub phone_number: String,
}
