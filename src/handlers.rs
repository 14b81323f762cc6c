use crate::config::Config;
use crate::errors::AppError;
use crate::models::{
    CheckEmailRequest, SaveSpecsRequest, SendOtpRequest, SignupRequest, VerifyOtpRequest,
};
use crate::services::LeadService;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// The lead pipeline (validator, OTP store, mailer, CRM client).
    pub leads: LeadService,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-signup-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/send-otp
///
/// Issues a one-time code for the email and mails it to the lead.
///
/// # Returns
///
/// * `Result<Json<serde_json::Value>, AppError>` - The success envelope or an error.
pub async fn send_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendOtpRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /api/send-otp");

    state.leads.request_verification(payload.email).await?;

    Ok(Json(json!({
        "success": true,
        "message": "OTP sent successfully"
    })))
}

/// POST /api/verify-otp
///
/// Checks the submitted code against the stored one; a match consumes it.
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /api/verify-otp");

    state
        .leads
        .confirm_verification(payload.email, payload.otp)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "OTP verified successfully"
    })))
}

/// POST /api/signup
///
/// Validates the signup form and upserts the CRM contact keyed by email.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /api/signup");

    let outcome = state.leads.signup(payload).await?;

    let message = if outcome.created {
        "Contact created successfully"
    } else {
        "Contact updated successfully"
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "result": outcome.contact
    })))
}

/// POST /api/check-email
///
/// Reports whether a contact exists for the email (used by later form
/// steps to gate navigation).
pub async fn check_email(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckEmailRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /api/check-email");

    let exists = state.leads.check_email_exists(payload.email).await?;

    Ok(Json(json!({
        "success": true,
        "exists": exists
    })))
}

/// POST /api/save-specs
///
/// Attaches the vendor selection and sizing answers to the existing
/// contact and marks it submitted.
pub async fn save_specs(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SaveSpecsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /api/save-specs");

    let contact = state.leads.save_specs(payload).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Software & server specs saved successfully",
        "result": contact
    })))
}
