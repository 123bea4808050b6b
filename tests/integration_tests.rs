use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceExt;

use tinytots::config::AppConfig;
use tinytots::db;
use tinytots::errors::AppError;
use tinytots::handlers;
use tinytots::models::SiteSettings;
use tinytots::services::mail::Mailer;
use tinytots::services::payments::{
    CardGateway, ChargeOutcome, ChargeRef, ChargeStatus, ClientToken, RedirectCharge,
    RedirectGateway,
};
use tinytots::services::settings::SettingsHandle;
use tinytots::state::AppState;

// ── Mock providers ──

struct MockCards {
    settings: SettingsHandle,
}

#[async_trait]
impl CardGateway for MockCards {
    async fn create_charge_intent(
        &self,
        _amount: f64,
        _currency: &str,
    ) -> Result<ClientToken, AppError> {
        if self.settings.get().stripe_secret_key.is_empty() {
            return Err(AppError::ProviderUnconfigured);
        }
        Ok(ClientToken {
            client_secret: "pi_test_secret_123".to_string(),
        })
    }
}

struct MockRedirects {
    settings: SettingsHandle,
    finalize_status: String,
}

#[async_trait]
impl RedirectGateway for MockRedirects {
    async fn create_redirect_charge(
        &self,
        _amount: f64,
        return_url: Option<&str>,
        _cancel_url: Option<&str>,
    ) -> Result<RedirectCharge, AppError> {
        let settings = self.settings.get();
        if settings.paypal_client_id.is_empty() || settings.paypal_client_secret.is_empty() {
            return Err(AppError::ProviderUnconfigured);
        }
        Ok(match return_url {
            Some(_) => RedirectCharge::Approval {
                payment_id: "PAY-TEST-1".to_string(),
                approval_url: "https://provider.example/approve/PAY-TEST-1".to_string(),
            },
            None => RedirectCharge::Order {
                order_id: "ORDER-TEST-1".to_string(),
            },
        })
    }

    async fn finalize_charge(&self, _reference: &ChargeRef) -> Result<ChargeOutcome, AppError> {
        let settings = self.settings.get();
        if settings.paypal_client_id.is_empty() || settings.paypal_client_secret.is_empty() {
            return Err(AppError::ProviderUnconfigured);
        }
        let status = if self.finalize_status == "COMPLETED" || self.finalize_status == "approved" {
            ChargeStatus::Completed
        } else {
            ChargeStatus::Incomplete
        };
        Ok(ChargeOutcome {
            status,
            provider_status: self.finalize_status.clone(),
            payload: serde_json::json!({ "status": self.finalize_status }),
        })
    }
}

struct MockMailer {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        if self.fail {
            anyhow::bail!("simulated mail failure");
        }
        Ok(())
    }
}

// ── Helpers ──

const OPERATOR_EMAIL: &str = "owner@tinytots.example";

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_secret: "test-secret".to_string(),
        paypal_client_id: String::new(),
        paypal_client_secret: String::new(),
        paypal_api_base: "https://api-m.sandbox.paypal.com".to_string(),
        stripe_secret_key: String::new(),
        stripe_publishable_key: String::new(),
        notify_email: String::new(),
        mail_user: String::new(),
        mail_api_key: String::new(),
    }
}

fn test_settings() -> SiteSettings {
    SiteSettings {
        paypal_client_id: "test-client-id".to_string(),
        paypal_client_secret: "test-client-secret".to_string(),
        stripe_secret_key: "sk_test_123".to_string(),
        stripe_publishable_key: "pk_test_123".to_string(),
        notify_email: OPERATOR_EMAIL.to_string(),
        mail_user: "bookings@tinytots.example".to_string(),
        mail_api_key: "mail-key".to_string(),
    }
}

fn test_state_with(
    finalize_status: &str,
    mail_fails: bool,
) -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
    let settings = SettingsHandle::new(test_settings());
    let sent = Arc::new(Mutex::new(vec![]));

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        settings: settings.clone(),
        cards: Box::new(MockCards {
            settings: settings.clone(),
        }),
        redirects: Box::new(MockRedirects {
            settings,
            finalize_status: finalize_status.to_string(),
        }),
        mailer: Box::new(MockMailer {
            sent: Arc::clone(&sent),
            fail: mail_fails,
        }),
    });
    (state, sent)
}

fn test_state(finalize_status: &str) -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    test_state_with(finalize_status, false)
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/bookings/:id",
            delete(handlers::bookings::delete_booking),
        )
        .route("/api/admin/config", get(handlers::admin::get_config))
        .route("/api/admin/config", post(handlers::admin::replace_config))
        .route(
            "/api/payment/card-intent",
            post(handlers::payments::create_card_intent),
        )
        .route(
            "/api/payment/redirect",
            post(handlers::payments::create_redirect_charge),
        )
        .route(
            "/api/payment/redirect/capture",
            post(handlers::payments::capture_redirect_charge),
        )
        .route(
            "/api/payment/redirect/return",
            get(handlers::payments::redirect_return),
        )
        .route("/api/blogs", get(handlers::blogs::list_blogs))
        .route("/api/blogs", post(handlers::blogs::create_blog))
        .route("/api/blogs/:id", delete(handlers::blogs::delete_blog))
        .with_state(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn card_booking_body() -> serde_json::Value {
    serde_json::json!({
        "name": "A",
        "email": "a@x.com",
        "children": "2 children, ages 3 and 5",
        "price": 50.0,
        "day": "2026-09-01",
        "time": "09:00",
        "service": "full-day care",
        "payment_method": "card",
        "status": "paid",
        "payment_ref": "pi_test_123",
    })
}

fn redirect_booking_fields() -> serde_json::Value {
    serde_json::json!({
        "name": "B",
        "email": "b@x.com",
        "children": "1 child, age 4",
        "price": 20.0,
        "day": "2026-09-02",
        "time": "13:00",
        "service": "half-day care",
    })
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let (state, _) = test_state("COMPLETED");
    let app = test_app(state);

    let res = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Booking submission ──

#[tokio::test]
async fn test_card_booking_stores_and_notifies_both() {
    let (state, sent) = test_state("COMPLETED");
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request("POST", "/api/bookings", card_booking_body()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let booking = body_json(res).await;
    assert_eq!(booking["status"], "paid");
    assert_eq!(booking["payment_ref"], "pi_test_123");

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, "a@x.com");
    assert_eq!(sent[1].0, OPERATOR_EMAIL);

    drop(sent);
    let res = app.oneshot(get_request("/api/bookings")).await.unwrap();
    let list = body_json(res).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_mail_failure_does_not_fail_booking() {
    let (state, sent) = test_state_with("COMPLETED", true);
    let app = test_app(state);

    let res = app
        .oneshot(json_request("POST", "/api/bookings", card_booking_body()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Both sends were still attempted even though the first one failed.
    assert_eq!(sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_redirect_submission_stays_pending_without_mail() {
    let (state, sent) = test_state("COMPLETED");
    let app = test_app(state);

    let mut body = redirect_booking_fields();
    body["payment_method"] = "redirect".into();

    let res = app
        .oneshot(json_request("POST", "/api/bookings", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let booking = body_json(res).await;
    assert_eq!(booking["status"], "pending");
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_paid_booking_requires_payment_ref() {
    let (state, sent) = test_state("COMPLETED");
    let app = test_app(state);

    let mut body = card_booking_body();
    body.as_object_mut().unwrap().remove("payment_ref");

    let res = app
        .oneshot(json_request("POST", "/api/bookings", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_bookings_newest_first() {
    let (state, _) = test_state("COMPLETED");
    let app = test_app(state);

    for name in ["first", "second"] {
        let mut body = card_booking_body();
        body["name"] = name.into();
        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/bookings", body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = app.oneshot(get_request("/api/bookings")).await.unwrap();
    let list = body_json(res).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["name"], "second");
    assert_eq!(list[1]["name"], "first");
}

#[tokio::test]
async fn test_delete_booking_requires_secret() {
    let (state, _) = test_state("COMPLETED");
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request("POST", "/api/bookings", card_booking_body()))
        .await
        .unwrap();
    let booking = body_json(res).await;
    let id = booking["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/bookings/{id}"),
            serde_json::json!({ "secret": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Still there.
    let res = app.clone().oneshot(get_request("/api/bookings")).await.unwrap();
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 1);

    let res = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/bookings/{id}"),
            serde_json::json!({ "secret": "test-secret" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.oneshot(get_request("/api/bookings")).await.unwrap();
    assert!(body_json(res).await.as_array().unwrap().is_empty());
}

// ── Card intents ──

#[tokio::test]
async fn test_card_intent() {
    let (state, _) = test_state("COMPLETED");
    let app = test_app(state);

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/payment/card-intent",
            serde_json::json!({ "amount": 12.50 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let data = body_json(res).await;
    assert_eq!(data["client_secret"], "pi_test_secret_123");
    assert_eq!(data["publishable_key"], "pk_test_123");
}

#[tokio::test]
async fn test_card_intent_unconfigured() {
    let (state, _) = test_state("COMPLETED");
    state.settings.replace(SiteSettings::default());
    let app = test_app(state);

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/payment/card-intent",
            serde_json::json!({ "amount": 12.50 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Order flow ──

#[tokio::test]
async fn test_order_flow_completed() {
    let (state, sent) = test_state("COMPLETED");
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/redirect",
            serde_json::json!({ "amount": 20.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let data = body_json(res).await;
    assert_eq!(data["order_id"], "ORDER-TEST-1");

    // Nothing persisted before capture.
    let res = app.clone().oneshot(get_request("/api/bookings")).await.unwrap();
    assert!(body_json(res).await.as_array().unwrap().is_empty());

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/redirect/capture",
            serde_json::json!({ "order_id": "ORDER-TEST-1", "booking": redirect_booking_fields() }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let booking = body_json(res).await;
    assert_eq!(booking["status"], "paid");
    assert_eq!(booking["payment_ref"], "ORDER-TEST-1");

    let attempts = sent.lock().unwrap().clone();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].0, "b@x.com");
    assert_eq!(attempts[1].0, OPERATOR_EMAIL);
}

#[tokio::test]
async fn test_order_capture_is_idempotent() {
    let (state, sent) = test_state("COMPLETED");
    let app = test_app(state);

    let capture = || {
        json_request(
            "POST",
            "/api/payment/redirect/capture",
            serde_json::json!({ "order_id": "ORDER-TEST-1", "booking": redirect_booking_fields() }),
        )
    };

    let res = app.clone().oneshot(capture()).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first = body_json(res).await;

    let res = app.clone().oneshot(capture()).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let second = body_json(res).await;

    assert_eq!(first["id"], second["id"]);

    // One booking, one notification pair.
    let res = app.oneshot(get_request("/api/bookings")).await.unwrap();
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 1);
    assert_eq!(sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_order_flow_declined() {
    let (state, sent) = test_state("DECLINED");
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/redirect/capture",
            serde_json::json!({ "order_id": "ORDER-TEST-1", "booking": redirect_booking_fields() }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // No booking persisted, no mail sent.
    let res = app.oneshot(get_request("/api/bookings")).await.unwrap();
    assert!(body_json(res).await.as_array().unwrap().is_empty());
    assert!(sent.lock().unwrap().is_empty());
}

// ── Legacy redirect flow ──

#[tokio::test]
async fn test_legacy_flow_approved() {
    let (state, sent) = test_state("approved");
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/redirect",
            serde_json::json!({
                "amount": 20.0,
                "return_url": "https://tinytots.example/thanks",
                "cancel_url": "https://tinytots.example/cancelled",
                "booking": redirect_booking_fields(),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let data = body_json(res).await;
    assert_eq!(data["payment_id"], "PAY-TEST-1");
    assert!(data["approval_url"].as_str().unwrap().starts_with("https://"));

    // Pending booking persisted up front, no mail yet.
    let res = app.clone().oneshot(get_request("/api/bookings")).await.unwrap();
    let list = body_json(res).await;
    assert_eq!(list[0]["status"], "pending");
    assert!(sent.lock().unwrap().is_empty());

    let res = app
        .clone()
        .oneshot(get_request(
            "/api/payment/redirect/return?paymentId=PAY-TEST-1&PayerID=PAYER-7",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let booking = body_json(res).await;
    assert_eq!(booking["status"], "paid");
    assert_eq!(booking["payment_ref"], "PAY-TEST-1");

    let attempts = sent.lock().unwrap().clone();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].0, "b@x.com");
    assert_eq!(attempts[1].0, OPERATOR_EMAIL);
}

#[tokio::test]
async fn test_legacy_flow_failed_execution_marks_failed() {
    let (state, sent) = test_state("failed");
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/redirect",
            serde_json::json!({
                "amount": 20.0,
                "return_url": "https://tinytots.example/thanks",
                "booking": redirect_booking_fields(),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(get_request(
            "/api/payment/redirect/return?paymentId=PAY-TEST-1&PayerID=PAYER-7",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.oneshot(get_request("/api/bookings")).await.unwrap();
    let list = body_json(res).await;
    assert_eq!(list[0]["status"], "failed");
    assert!(sent.lock().unwrap().is_empty());
}

// ── Admin config ──

#[tokio::test]
async fn test_replace_config_requires_secret() {
    let (state, _) = test_state("COMPLETED");
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/config",
            serde_json::json!({
                "secret": "wrong",
                "stripe_secret_key": "sk_evil",
                "stripe_publishable_key": "",
                "paypal_client_id": "",
                "paypal_client_secret": "",
                "notify_email": "",
                "mail_user": "",
                "mail_api_key": "",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Store unchanged.
    let res = app.oneshot(get_request("/api/admin/config")).await.unwrap();
    let config = body_json(res).await;
    assert_eq!(config["stripe_secret_key"], "sk_test_123");
}

#[tokio::test]
async fn test_replacing_credentials_takes_effect_immediately() {
    let (state, sent) = test_state("COMPLETED");
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/config",
            serde_json::json!({
                "secret": "test-secret",
                "stripe_secret_key": "",
                "stripe_publishable_key": "",
                "paypal_client_id": "",
                "paypal_client_secret": "",
                "notify_email": "",
                "mail_user": "",
                "mail_api_key": "",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Payment paths now report unconfigured, never stale credentials.
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/card-intent",
            serde_json::json!({ "amount": 10.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/redirect",
            serde_json::json!({ "amount": 10.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Mail silently skips; the booking itself still goes through.
    let res = app
        .oneshot(json_request("POST", "/api/bookings", card_booking_body()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(sent.lock().unwrap().is_empty());
}

// ── Blog CRUD ──

#[tokio::test]
async fn test_blog_crud() {
    let (state, _) = test_state("COMPLETED");
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/blogs",
            serde_json::json!({ "secret": "wrong", "title": "t", "content": "c" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/blogs",
            serde_json::json!({ "secret": "test-secret", "title": "Open day", "content": "Join us!" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let post = body_json(res).await;
    let id = post["id"].as_str().unwrap().to_string();

    let res = app.clone().oneshot(get_request("/api/blogs")).await.unwrap();
    let list = body_json(res).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Open day");

    let res = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/blogs/{id}"),
            serde_json::json!({ "secret": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/blogs/{id}"),
            serde_json::json!({ "secret": "test-secret" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.oneshot(get_request("/api/blogs")).await.unwrap();
    assert!(body_json(res).await.as_array().unwrap().is_empty());
}
