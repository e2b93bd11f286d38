//! Dial trigger and job polling
//!
//! Triggering a dial only enqueues a job; the caller polls its status by
//! task id. Jobs of other users are reported as not found.

use crate::dto::{
    DialRequest, DialResponse, JobStatusResponse, RecentJobsQuery, RecentJobsResponse,
};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use dialer_auth::AuthenticatedUser;
use dialer_core::models::{DialJob, JobId};
use dialer_core::traits::Pagination;
use dialer_core::AppError;
use tracing::{info, instrument};

/// POST /api/v1/contact-lists/{id}/dial
#[instrument(skip(state, user, req))]
pub async fn dial_contact_list(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<DialRequest>,
) -> Result<HttpResponse, AppError> {
    let template = req.template()?;
    let list_id = path.into_inner();

    let list = state
        .lists
        .find_by_id(user.user_id, list_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contact list {}", list_id)))?;

    let task_id = state
        .jobs
        .submit(DialJob {
            contact_list_id: list.id,
            message: template.to_string(),
            requested_by: user.user_id,
        })
        .await?;

    info!(list_id, task_id = %task_id, "Dial job submitted");

    Ok(HttpResponse::Accepted().json(DialResponse {
        message: format!("Initiated calls from {}", list.name),
        task_id: task_id.to_string(),
    }))
}

/// GET /api/v1/dial-jobs/{task_id}
#[instrument(skip(state, user))]
pub async fn get_job(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = JobId::from(path.into_inner());

    let record = state
        .jobs
        .status(&id)
        .await?
        .filter(|record| record.owned_by(user.user_id))
        .ok_or_else(|| AppError::NotFound(format!("Dial job {}", id)))?;

    Ok(HttpResponse::Ok().json(JobStatusResponse::from(record)))
}

/// GET /api/v1/dial-jobs
#[instrument(skip(state, user, query))]
pub async fn recent_jobs(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<RecentJobsQuery>,
) -> Result<HttpResponse, AppError> {
    let limit = query
        .limit
        .unwrap_or(state.recent_jobs_limit)
        .clamp(1, Pagination::MAX_PER_PAGE as usize);

    let ids = state.jobs.recent(user.user_id, limit).await?;

    Ok(HttpResponse::Ok().json(RecentJobsResponse {
        task_ids: ids.into_iter().map(|id| id.to_string()).collect(),
    }))
}

/// Job polling routes; the trigger lives under the contact list scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dial-jobs")
            .route("", web::get().to(recent_jobs))
            .route("/{task_id}", web::get().to(get_job)),
    );
}
