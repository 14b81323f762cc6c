mod config;
mod errors;
mod handlers;
mod hubspot_client;
mod mailer;
mod models;
mod otp_store;
mod services;
mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::hubspot_client::HubspotClient;
use crate::mailer::Mailer;
use crate::otp_store::OtpStore;
use crate::services::LeadService;
use crate::validation::Validator;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - The validator allow-lists, OTP store, SMTP mailer, and HubSpot client.
/// - HTTP routes and middleware (CORS, rate limiting, body limit).
///
/// It then starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_signup_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Allow-lists are configuration data, loaded once and injected
    let validator = Validator::from_config(&config);

    // OTP store: single active code per email, 5-minute TTL
    let otp_store = OtpStore::new();
    tracing::info!("OTP store initialized (5 minute TTL)");

    // SMTP mailer for OTP delivery
    let mailer = Mailer::new(&config).map_err(|e| anyhow::anyhow!("{}", e))?;
    tracing::info!("SMTP mailer initialized: {}:{}", config.smtp_host, config.smtp_port);

    // HubSpot contacts client
    let hubspot = HubspotClient::new(config.hubspot_base_url.clone(), config.hubspot_token.clone())
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    tracing::info!("HubSpot client initialized: {}", config.hubspot_base_url);

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        config: config.clone(),
        leads: LeadService::new(validator, otp_store, mailer, hubspot),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        .route("/api/send-otp", post(handlers::send_otp))
        .route("/api/verify-otp", post(handlers::verify_otp))
        .route("/api/signup", post(handlers::signup))
        .route("/api/check-email", post(handlers::check_email))
        .route("/api/save-specs", post(handlers::save_specs))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting) and the
    // static form pages as fallback
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .fallback_service(ServeDir::new("public"))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
