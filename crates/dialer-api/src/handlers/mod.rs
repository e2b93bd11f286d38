//! HTTP request handlers

pub mod auth;
pub mod call_record;
pub mod contact;
pub mod contact_list;
pub mod dial;
pub mod health;
pub mod webhook;

#[cfg(test)]
pub(crate) mod test_support;

use actix_web::web;

/// Register every API route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .configure(auth::configure)
        .configure(contact::configure)
        .configure(contact_list::configure)
        .configure(dial::configure)
        .configure(call_record::configure)
        .configure(webhook::configure);
}
