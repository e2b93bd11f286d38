//! Call record DTOs

use super::contact::ContactResponse;
use chrono::{DateTime, Utc};
use dialer_core::models::CallRecordDetail;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Listing query: pagination plus optional substring filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallRecordQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,

    /// Case-insensitive substring of the contact's first name
    pub contact_name: Option<String>,

    /// Case-insensitive substring of the dialed number
    pub phone_number: Option<String>,
}

impl CallRecordQuery {
    pub fn pagination(&self) -> super::PaginationParams {
        super::PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn contact_name(&self) -> Option<&str> {
        non_blank(self.contact_name.as_deref())
    }

    pub fn phone_number(&self) -> Option<&str> {
        non_blank(self.phone_number.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize)]
pub struct CallRecordResponse {
    pub id: i64,
    pub external_id: String,
    pub contact: Option<ContactResponse>,
    pub phone_number: String,
    pub duration: i32,
    pub cost: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<CallRecordDetail> for CallRecordResponse {
    fn from(detail: CallRecordDetail) -> Self {
        let record = detail.record;
        Self {
            id: record.id,
            external_id: record.external_id,
            contact: detail.contact.map(Into::into),
            phone_number: record.phone_number,
            duration: record.duration,
            cost: record.cost,
            status: record.status,
            created_at: record.created_at,
        }
    }
}
