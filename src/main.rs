use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tinytots::config::AppConfig;
use tinytots::db::{self, queries};
use tinytots::handlers;
use tinytots::models::SiteSettings;
use tinytots::services::mail::sendgrid::SendGridMailer;
use tinytots::services::payments::paypal::PayPalGateway;
use tinytots::services::payments::stripe::StripeGateway;
use tinytots::services::settings::SettingsHandle;
use tinytots::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    // Stored settings win; environment credentials are only the first-run
    // fallback.
    let initial = match queries::load_settings(&conn)? {
        Some(stored) => stored,
        None => SiteSettings::from_config(&config),
    };
    let settings = SettingsHandle::new(initial);

    let cards = StripeGateway::new(settings.clone());
    let redirects = PayPalGateway::new(settings.clone(), config.paypal_api_base.clone());
    let mailer = SendGridMailer::new(settings.clone());

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        settings,
        cards: Box::new(cards),
        redirects: Box::new(redirects),
        mailer: Box::new(mailer),
    });

    let app = Router::new()
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
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
