//! Contact DTOs

use chrono::{DateTime, Utc};
use dialer_core::models::{Contact, ContactDraft};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create or replace a contact
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "City must be at most 100 characters"))]
    pub city: String,

    #[validate(length(min = 1, max = 20, message = "Phone number must be 1 to 20 characters"))]
    pub phone_number: String,
}

impl From<ContactRequest> for ContactDraft {
    fn from(req: ContactRequest) -> Self {
        Self {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            city: req.city.trim().to_string(),
            phone_number: req.phone_number.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Contact> for ContactResponse {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id,
            first_name: contact.first_name,
            last_name: contact.last_name,
            city: contact.city,
            phone_number: contact.phone_number,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        }
    }
}
