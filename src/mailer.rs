use crate::config::Config;
use crate::errors::AppError;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// Sends verification codes to leads over the configured SMTP relay.
///
/// Delivery failure is a hard failure of the request-OTP operation: there is
/// no retry and no fallback channel.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl Mailer {
    /// Creates a new `Mailer` from the SMTP settings in the configuration.
    ///
    /// Uses STARTTLS on the configured port (587 by default).
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create SMTP transport: {}", e))
            })?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_pass.clone(),
            ))
            .timeout(Some(Duration::from_secs(30)))
            .build();

        Ok(Self {
            transport,
            from: config.from_email.clone(),
        })
    }

    /// Sends the OTP mail to a lead.
    ///
    /// # Arguments
    ///
    /// * `to` - The recipient address (already normalized and validated).
    /// * `code` - The 6-digit code to deliver.
    pub async fn send_otp(&self, to: &str, code: &str) -> Result<(), AppError> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| {
                AppError::InternalError(format!("Invalid FROM_EMAIL address: {}", e))
            })?)
            .to(to
                .parse()
                .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {}", e)))?)
            .subject("Your OTP Code")
            .header(ContentType::TEXT_HTML)
            .body(format!(
                "<p>Your OTP code is <b>{}</b>. It will expire in 5 minutes.</p>",
                code
            ))
            .map_err(|e| {
                AppError::InternalError(format!("Failed to build OTP message: {}", e))
            })?;

        tracing::info!("Sending OTP mail to {}", to);

        self.transport.send(message).await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to send OTP mail: {}", e))
        })?;

        tracing::info!("OTP mail delivered to relay for {}", to);
        Ok(())
    }
}
