//! Provider status callback
//!
//! Unauthenticated: the provider posts form-encoded status updates here.
//! JSON bodies are accepted as well.

use crate::dto::StatusCallbackPayload;
use crate::state::AppState;
use actix_web::{web, Either, HttpResponse};
use dialer_core::AppError;
use tracing::{debug, instrument};

/// POST /api/v1/twilio-webhook
#[instrument(skip(state, payload))]
pub async fn status_callback(
    state: web::Data<AppState>,
    payload: Either<web::Form<StatusCallbackPayload>, web::Json<StatusCallbackPayload>>,
) -> Result<HttpResponse, AppError> {
    let payload = match payload {
        Either::Left(form) => form.into_inner(),
        Either::Right(json) => json.into_inner(),
    };

    let event = payload.into_event()?;
    let record = state.reconciler.on_status_event(&event).await?;

    debug!(
        external_id = %record.external_id,
        status = %record.status,
        "Status callback applied"
    );
    Ok(HttpResponse::Ok().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/twilio-webhook", web::post().to(status_callback));
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{test_app, TestContext};
    use actix_web::{http::StatusCode, test};
    use dialer_core::models::{CallOutcome, NewCallRecord};
    use dialer_core::traits::CallRecordRepository;
    use serde_json::{json, Value};

    async fn seed(ctx: &TestContext) {
        let (owner, _) = ctx.user("ada").await;
        let ann = ctx.contact(owner, "Ann", "+1111").await;
        let outcome = CallOutcome {
            external_id: "CA1".to_string(),
            status: "queued".to_string(),
            duration_secs: None,
            cost: None,
        };
        ctx.store
            .bulk_insert(&[NewCallRecord::from_outcome(owner, &ann, &outcome)])
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn test_form_callback_updates_record() {
        let ctx = TestContext::new();
        seed(&ctx).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/v1/twilio-webhook")
            .set_form([
                ("CallSid", "CA1"),
                ("CallStatus", "completed"),
                ("CallDuration", "42"),
                ("AccountSid", "AC123"),
            ])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let record = ctx.store.find_by_external_id("CA1").await.unwrap().unwrap();
        assert_eq!(record.status, "completed");
        assert_eq!(record.duration, 42);
    }

    #[actix_web::test]
    async fn test_json_callback_updates_record() {
        let ctx = TestContext::new();
        seed(&ctx).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/v1/twilio-webhook")
            .set_json(json!({"externalId": "CA1", "status": "busy"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let record = ctx.store.find_by_external_id("CA1").await.unwrap().unwrap();
        assert_eq!(record.status, "busy");
        assert_eq!(record.duration, 0);
    }

    #[actix_web::test]
    async fn test_unknown_call_is_not_found() {
        let ctx = TestContext::new();
        seed(&ctx).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/v1/twilio-webhook")
            .set_form([("CallSid", "CA999"), ("CallStatus", "completed")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        assert!(ctx.store.find_by_external_id("CA999").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_invalid_payload_lists_field_errors() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/v1/twilio-webhook")
            .set_form([("CallStatus", "completed"), ("CallDuration", "-5")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["external_id", "duration_seconds"]);
    }

    #[actix_web::test]
    async fn test_overlong_status_is_a_client_error() {
        let ctx = TestContext::new();
        seed(&ctx).await;
        let app = test_app!(ctx);

        let status = "x".repeat(40);
        let req = test::TestRequest::post()
            .uri("/api/v1/twilio-webhook")
            .set_form([("CallSid", "CA1"), ("CallStatus", status.as_str())])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["fields"][0]["field"], "status");
        assert_eq!(body["fields"][0]["code"], "length");

        let record = ctx.store.find_by_external_id("CA1").await.unwrap().unwrap();
        assert_eq!(record.status, "queued");
    }
}
