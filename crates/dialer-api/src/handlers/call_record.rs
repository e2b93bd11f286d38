//! Call record handlers

use crate::dto::{ApiResponse, CallRecordQuery, CallRecordResponse};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use dialer_auth::AuthenticatedUser;
use dialer_core::AppError;
use tracing::{debug, info, instrument};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Call record {}", id))
}

/// GET /api/v1/call-records
///
/// Newest first. `contact_name` and `phone_number` are case-insensitive
/// substring filters.
#[instrument(skip(state, user, query))]
pub async fn list_call_records(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<CallRecordQuery>,
) -> Result<HttpResponse, AppError> {
    let params = query.pagination();
    let page = params.pagination();

    let (records, total) = state
        .call_records
        .list_filtered(
            user.user_id,
            query.contact_name(),
            query.phone_number(),
            page.limit(),
            page.offset(),
        )
        .await?;

    debug!("Returning {} of {} call records", records.len(), total);

    let data: Vec<CallRecordResponse> =
        records.into_iter().map(CallRecordResponse::from).collect();
    Ok(HttpResponse::Ok().json(params.paginate(data, total)))
}

/// GET /api/v1/call-records/{id}
#[instrument(skip(state, user))]
pub async fn get_call_record(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let detail = state
        .call_records
        .find_by_id(user.user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(CallRecordResponse::from(detail))))
}

/// DELETE /api/v1/call-records/{id}
#[instrument(skip(state, user))]
pub async fn delete_call_record(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !state.call_records.delete(user.user_id, id).await? {
        return Err(not_found(id));
    }

    info!(record_id = id, "Call record deleted");
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/call-records")
            .route("", web::get().to(list_call_records))
            .route("/{id}", web::get().to(get_call_record))
            .route("/{id}", web::delete().to(delete_call_record)),
    );
}
