//! Contact list DTOs

use super::contact::ContactResponse;
use chrono::{DateTime, Utc};
use dialer_core::models::{ContactList, ContactListWithContacts};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactListRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberRequest {
    pub contact_id: i64,
}

/// A list with its members embedded
#[derive(Debug, Clone, Serialize)]
pub struct ContactListResponse {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub contacts: Vec<ContactResponse>,
}

impl From<ContactListWithContacts> for ContactListResponse {
    fn from(value: ContactListWithContacts) -> Self {
        Self {
            id: value.list.id,
            name: value.list.name,
            created_at: value.list.created_at,
            contacts: value.contacts.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ContactList> for ContactListResponse {
    fn from(list: ContactList) -> Self {
        Self {
            id: list.id,
            name: list.name,
            created_at: list.created_at,
            contacts: Vec::new(),
        }
    }
}
