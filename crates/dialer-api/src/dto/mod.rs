//! Data Transfer Objects (DTOs) for API requests and responses

pub mod auth;
pub mod call_record;
pub mod common;
pub mod contact;
pub mod contact_list;
pub mod dial;
pub mod webhook;

pub use auth::*;
pub use call_record::*;
pub use common::*;
pub use contact::*;
pub use contact_list::*;
pub use dial::*;
pub use webhook::*;
