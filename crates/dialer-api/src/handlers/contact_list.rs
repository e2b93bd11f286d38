//! Contact list handlers
//!
//! Lists are returned with their members embedded. Membership changes
//! require both the list and the contact to belong to the caller.

use crate::dto::{
    AddMemberRequest, ApiResponse, ContactListRequest, ContactListResponse, MessageResponse,
    PaginationParams,
};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use dialer_auth::AuthenticatedUser;
use dialer_core::AppError;
use tracing::{info, instrument};
use validator::Validate;

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Contact list {}", id))
}

/// Load an owned list with members, or `NotFound`
pub(crate) async fn owned_list(
    state: &AppState,
    owner: i64,
    id: i64,
) -> Result<ContactListResponse, AppError> {
    state
        .lists
        .find_by_id(owner, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    state
        .lists
        .find_with_contacts(id)
        .await?
        .map(ContactListResponse::from)
        .ok_or_else(|| not_found(id))
}

/// GET /api/v1/contact-lists
#[instrument(skip(state, user, query))]
pub async fn list_contact_lists(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    let page = query.pagination();
    let (lists, total) = state
        .lists
        .list(user.user_id, page.limit(), page.offset())
        .await?;

    let mut data = Vec::with_capacity(lists.len());
    for list in lists {
        let response = match state.lists.find_with_contacts(list.id).await? {
            Some(full) => ContactListResponse::from(full),
            None => ContactListResponse::from(list),
        };
        data.push(response);
    }

    Ok(HttpResponse::Ok().json(query.paginate(data, total)))
}

/// POST /api/v1/contact-lists
#[instrument(skip(state, user, req))]
pub async fn create_contact_list(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<ContactListRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let list = state.lists.create(user.user_id, req.name.trim()).await?;
    info!(list_id = list.id, "Contact list created");

    Ok(HttpResponse::Created().json(ApiResponse::success(ContactListResponse::from(list))))
}

/// GET /api/v1/contact-lists/{id}
#[instrument(skip(state, user))]
pub async fn get_contact_list(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let list = owned_list(&state, user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(list)))
}

/// PUT /api/v1/contact-lists/{id}
#[instrument(skip(state, user, req))]
pub async fn update_contact_list(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<ContactListRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let id = path.into_inner();
    state
        .lists
        .rename(user.user_id, id, req.name.trim())
        .await?
        .ok_or_else(|| not_found(id))?;

    let list = owned_list(&state, user.user_id, id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(list)))
}

/// DELETE /api/v1/contact-lists/{id}
///
/// Member contacts are not deleted.
#[instrument(skip(state, user))]
pub async fn delete_contact_list(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !state.lists.delete(user.user_id, id).await? {
        return Err(not_found(id));
    }

    info!(list_id = id, "Contact list deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/v1/contact-lists/{id}/contacts
#[instrument(skip(state, user, req))]
pub async fn add_member(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<AddMemberRequest>,
) -> Result<HttpResponse, AppError> {
    let list_id = path.into_inner();
    let contact_id = req.contact_id;

    state
        .lists
        .find_by_id(user.user_id, list_id)
        .await?
        .ok_or_else(|| not_found(list_id))?;
    state
        .contacts
        .find_by_id(user.user_id, contact_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contact {}", contact_id)))?;

    state.lists.add_contact(list_id, contact_id).await?;
    info!(list_id, contact_id, "Contact added to list");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Contact list updated")))
}

/// DELETE /api/v1/contact-lists/{id}/contacts/{contact_id}
#[instrument(skip(state, user))]
pub async fn remove_member(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (list_id, contact_id) = path.into_inner();

    state
        .lists
        .find_by_id(user.user_id, list_id)
        .await?
        .ok_or_else(|| not_found(list_id))?;

    if !state.lists.remove_contact(list_id, contact_id).await? {
        return Err(AppError::NotFound(format!(
            "Contact {} in list {}",
            contact_id, list_id
        )));
    }

    info!(list_id, contact_id, "Contact removed from list");
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/contact-lists")
            .route("", web::get().to(list_contact_lists))
            .route("", web::post().to(create_contact_list))
            .route("/{id}", web::get().to(get_contact_list))
            .route("/{id}", web::put().to(update_contact_list))
            .route("/{id}", web::delete().to(delete_contact_list))
            .route("/{id}/contacts", web::post().to(add_member))
            .route(
                "/{id}/contacts/{contact_id}",
                web::delete().to(remove_member),
            )
            .route("/{id}/dial", web::post().to(super::dial::dial_contact_list)),
    );
}
