//! Contact list model
//!
//! A named, owner-scoped group of contacts. Membership is many-to-many:
//! removing a list never removes its contacts.

use super::contact::Contact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact list entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactList {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Default for ContactList {
    fn default() -> Self {
        Self {
            id: 0,
            user_id: 0,
            name: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// A contact list together with its members in enumeration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactListWithContacts {
    pub list: ContactList,
    pub contacts: Vec<Contact>,
}

impl ContactListWithContacts {
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }
}
