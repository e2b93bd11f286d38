//! Domain models for the autodialer
//!
//! This module contains all the core domain models used throughout the application.

pub mod call_record;
pub mod contact;
pub mod contact_list;
pub mod job;
pub mod user;

pub use call_record::{CallOutcome, CallRecord, CallRecordDetail, NewCallRecord, StatusEvent};
pub use contact::{Contact, ContactDraft};
pub use contact_list::{ContactList, ContactListWithContacts};
pub use job::{DialJob, DialSummary, JobId, JobRecord, JobState};
pub use user::{NewUser, User, UserInfo};
