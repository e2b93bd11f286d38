//! Provider REST client
//!
//! One `POST {api_base_url}/Accounts/{sid}/Calls.json` per destination. The
//! request carries the voice response inline and registers the status
//! callback the provider later posts call progress to.

use crate::types::{CallResource, ProviderErrorBody};
use crate::voice_response::VoiceResponse;
use async_trait::async_trait;
use dialer_core::config::TelephonyConfig;
use dialer_core::models::CallOutcome;
use dialer_core::traits::TelephonyGateway;
use dialer_core::GatewayError;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Client for the telephony provider's call API
pub struct TwilioClient {
    http_client: Client,
    calls_url: String,
    account_sid: String,
    auth_token: String,
    origin: Option<String>,
    status_callback_url: String,
    voice: String,
    language: String,
    audio_cue_url: String,
    timeout_ms: u64,
}

impl TwilioClient {
    /// Build a client from the telephony settings
    ///
    /// A missing origin number is not an error here; it is reported by
    /// [`TelephonyGateway::place_call`] so the service can start without it.
    pub fn new(config: &TelephonyConfig) -> Result<Self, GatewayError> {
        let http_client = ClientBuilder::new()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        let calls_url = format!(
            "{}/Accounts/{}/Calls.json",
            config.api_base_url.trim_end_matches('/'),
            config.account_sid
        );

        Ok(Self {
            http_client,
            calls_url,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            origin: config.origin().map(str::to_string),
            status_callback_url: config.status_callback_url.clone(),
            voice: config.voice.clone(),
            language: config.language.clone(),
            audio_cue_url: config.audio_cue_url.clone(),
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// Caller id used for outbound calls, if configured
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    fn voice_response(&self, message: &str) -> String {
        VoiceResponse {
            message,
            voice: &self.voice,
            language: &self.language,
            audio_cue_url: &self.audio_cue_url,
        }
        .to_xml()
    }
}

/// Map a non-2xx reply to the provider's structured error when it sent one
fn rejection(status: u16, body: &str) -> GatewayError {
    match serde_json::from_str::<ProviderErrorBody>(body) {
        Ok(err) => GatewayError::Provider {
            code: err.code,
            message: err.message,
        },
        Err(_) => GatewayError::HttpError(status),
    }
}

#[async_trait]
impl TelephonyGateway for TwilioClient {
    #[instrument(skip(self, destination, message), fields(destination = %destination))]
    async fn place_call(
        &self,
        destination: &str,
        message: &str,
    ) -> Result<CallOutcome, GatewayError> {
        let origin = self.origin.as_deref().ok_or_else(|| {
            GatewayError::Configuration("no origin number configured".to_string())
        })?;

        let twiml = self.voice_response(message);
        let mut form = vec![("To", destination), ("From", origin), ("Twiml", twiml.as_str())];
        if !self.status_callback_url.is_empty() {
            form.push(("StatusCallback", self.status_callback_url.as_str()));
            form.push(("StatusCallbackMethod", "POST"));
        }

        debug!("Placing call from {} to {}", origin, destination);

        let response = self
            .http_client
            .post(&self.calls_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.timeout_ms)
                } else {
                    GatewayError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GatewayError::ParseError(format!("Failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            warn!("Provider rejected call to {}: status={} body={}", destination, status, body);
            return Err(rejection(status.as_u16(), &body));
        }

        let call: CallResource = serde_json::from_str(&body).map_err(|e| {
            error!("Unparseable provider response: {}", e);
            GatewayError::ParseError(format!("Failed to parse JSON: {} - Body: {}", e, body))
        })?;

        debug!("Provider accepted call {} with status {}", call.sid, call.status);

        Ok(CallOutcome {
            external_id: call.sid,
            status: call.status,
            duration_secs: call.duration,
            cost: call.price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Seen = web::Data<Mutex<Vec<HashMap<String, String>>>>;

    async fn create_call(
        req: HttpRequest,
        path: web::Path<String>,
        form: web::Form<HashMap<String, String>>,
        seen: Seen,
    ) -> HttpResponse {
        let mut fields = form.into_inner();
        fields.insert("account".to_string(), path.into_inner());
        if let Some(auth) = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
        {
            fields.insert("authorization".to_string(), auth.to_string());
        }
        let to = fields.get("To").cloned().unwrap_or_default();
        seen.lock().unwrap().push(fields);

        match to.as_str() {
            "+1111" => HttpResponse::Created().json(json!({
                "sid": "CA1",
                "status": "queued",
                "duration": null,
                "price": null
            })),
            "+2222" => HttpResponse::Created().json(json!({
                "sid": "CA2",
                "status": "completed",
                "duration": "42",
                "price": "-0.0075"
            })),
            "+3333" => HttpResponse::Created().body("<html>not json</html>"),
            "+4444" => HttpResponse::BadGateway().body("upstream down"),
            "+5555" => {
                actix_rt::time::sleep(Duration::from_millis(500)).await;
                HttpResponse::Created().finish()
            }
            _ => HttpResponse::BadRequest().json(json!({
                "code": 21211,
                "message": "The 'To' number is not valid.",
                "status": 400
            })),
        }
    }

    /// Start a fake provider on an ephemeral port and return its base URL
    fn start_provider(seen: Seen) -> String {
        let server = HttpServer::new(move || {
            App::new().app_data(seen.clone()).route(
                "/2010-04-01/Accounts/{sid}/Calls.json",
                web::post().to(create_call),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_rt::spawn(server.run());
        format!("http://{}/2010-04-01", addr)
    }

    fn config(base_url: &str) -> TelephonyConfig {
        TelephonyConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            origin_number: Some("+15550000000".to_string()),
            status_callback_url: "https://dialer.example.com/api/v1/twilio-webhook".to_string(),
            api_base_url: base_url.to_string(),
            request_timeout_ms: 100,
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn test_place_call_sends_form_and_parses_outcome() {
        let seen: Seen = web::Data::new(Mutex::new(Vec::new()));
        let base_url = start_provider(seen.clone());
        let client = TwilioClient::new(&config(&base_url)).unwrap();

        let outcome = client.place_call("+1111", "Hello Ada & co").await.unwrap();
        assert_eq!(outcome.external_id, "CA1");
        assert_eq!(outcome.status, "queued");
        assert_eq!(outcome.duration_secs, None);
        assert_eq!(outcome.cost, None);

        let requests = seen.lock().unwrap();
        let fields = &requests[0];
        assert_eq!(fields["account"], "AC123");
        assert_eq!(fields["From"], "+15550000000");
        assert_eq!(fields["To"], "+1111");
        assert_eq!(fields["StatusCallbackMethod"], "POST");
        assert_eq!(
            fields["StatusCallback"],
            "https://dialer.example.com/api/v1/twilio-webhook"
        );
        assert!(fields["Twiml"].contains("Hello Ada &amp; co</Say>"));
        assert!(fields["authorization"].starts_with("Basic "));
    }

    #[actix_web::test]
    async fn test_place_call_keeps_signed_price() {
        let seen: Seen = web::Data::new(Mutex::new(Vec::new()));
        let client = TwilioClient::new(&config(&start_provider(seen))).unwrap();

        let outcome = client.place_call("+2222", "Hi").await.unwrap();
        assert_eq!(outcome.duration_secs, Some(42));
        assert_eq!(outcome.cost, Some(rust_decimal_macros::dec!(-0.0075)));
    }

    #[actix_web::test]
    async fn test_provider_rejection_is_structured() {
        let seen: Seen = web::Data::new(Mutex::new(Vec::new()));
        let client = TwilioClient::new(&config(&start_provider(seen))).unwrap();

        let err = client.place_call("+9999", "Hi").await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Provider {
                code: Some(21211),
                message: "The 'To' number is not valid.".to_string(),
            }
        );

        let err = client.place_call("+4444", "Hi").await.unwrap_err();
        assert_eq!(err, GatewayError::HttpError(502));
    }

    #[actix_web::test]
    async fn test_unparseable_success_body() {
        let seen: Seen = web::Data::new(Mutex::new(Vec::new()));
        let client = TwilioClient::new(&config(&start_provider(seen))).unwrap();

        let err = client.place_call("+3333", "Hi").await.unwrap_err();
        assert!(matches!(err, GatewayError::ParseError(_)));
    }

    #[actix_web::test]
    async fn test_slow_provider_times_out() {
        let seen: Seen = web::Data::new(Mutex::new(Vec::new()));
        let client = TwilioClient::new(&config(&start_provider(seen))).unwrap();

        let err = client.place_call("+5555", "Hi").await.unwrap_err();
        assert_eq!(err, GatewayError::Timeout(100));
    }

    #[actix_web::test]
    async fn test_unreachable_provider() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client =
            TwilioClient::new(&config(&format!("http://127.0.0.1:{}/2010-04-01", port))).unwrap();

        let err = client.place_call("+1111", "Hi").await.unwrap_err();
        assert!(matches!(err, GatewayError::Connection(_)));
    }

    #[actix_web::test]
    async fn test_missing_origin_is_configuration_error() {
        let mut cfg = config("http://127.0.0.1:1/2010-04-01");
        cfg.origin_number = Some("  ".to_string());
        let client = TwilioClient::new(&cfg).unwrap();

        assert_eq!(client.origin(), None);
        let err = client.place_call("+1111", "Hi").await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_calls_url_and_rejection_mapping() {
        let client = TwilioClient::new(&config("https://api.twilio.com/2010-04-01/")).unwrap();
        assert_eq!(
            client.calls_url,
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Calls.json"
        );

        assert_eq!(rejection(500, "oops"), GatewayError::HttpError(500));
        assert!(matches!(
            rejection(401, r#"{"code":20003,"message":"Authenticate"}"#),
            GatewayError::Provider { code: Some(20003), .. }
        ));
    }
}
