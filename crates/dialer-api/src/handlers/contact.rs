//! Contact handlers
//!
//! CRUD over the caller's contacts. Contacts owned by other users are
//! reported as not found.

use crate::dto::{ApiResponse, ContactRequest, ContactResponse, PaginationParams};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use dialer_auth::AuthenticatedUser;
use dialer_core::models::ContactDraft;
use dialer_core::AppError;
use tracing::{debug, info, instrument};
use validator::Validate;

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Contact {}", id))
}

/// GET /api/v1/contacts
#[instrument(skip(state, user, query))]
pub async fn list_contacts(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    let page = query.pagination();
    let (contacts, total) = state
        .contacts
        .list(user.user_id, page.limit(), page.offset())
        .await?;

    debug!("Returning {} of {} contacts", contacts.len(), total);

    let data: Vec<ContactResponse> = contacts.into_iter().map(ContactResponse::from).collect();
    Ok(HttpResponse::Ok().json(query.paginate(data, total)))
}

/// POST /api/v1/contacts
#[instrument(skip(state, user, req))]
pub async fn create_contact(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<ContactRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let draft = ContactDraft::from(req.into_inner());
    let contact = state.contacts.create(user.user_id, &draft).await?;

    info!(contact_id = contact.id, "Contact created");
    Ok(HttpResponse::Created().json(ApiResponse::success(ContactResponse::from(contact))))
}

/// GET /api/v1/contacts/{id}
#[instrument(skip(state, user))]
pub async fn get_contact(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let contact = state
        .contacts
        .find_by_id(user.user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(ContactResponse::from(contact))))
}

/// PUT /api/v1/contacts/{id}
#[instrument(skip(state, user, req))]
pub async fn update_contact(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<ContactRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let id = path.into_inner();
    let draft = ContactDraft::from(req.into_inner());
    let contact = state
        .contacts
        .update(user.user_id, id, &draft)
        .await?
        .ok_or_else(|| not_found(id))?;

    info!(contact_id = id, "Contact updated");
    Ok(HttpResponse::Ok().json(ApiResponse::success(ContactResponse::from(contact))))
}

/// DELETE /api/v1/contacts/{id}
///
/// Call records of the contact are kept with a null contact.
#[instrument(skip(state, user))]
pub async fn delete_contact(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !state.contacts.delete(user.user_id, id).await? {
        return Err(not_found(id));
    }

    info!(contact_id = id, "Contact deleted");
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/contacts")
            .route("", web::get().to(list_contacts))
            .route("", web::post().to(create_contact))
            .route("/{id}", web::get().to(get_contact))
            .route("/{id}", web::put().to(update_contact))
            .route("/{id}", web::delete().to(delete_contact)),
    );
}
