use crate::errors::{AppError, ResultExt};
use crate::hubspot_client::{sanitize_properties, Contact, HubspotClient};
use crate::mailer::Mailer;
use crate::models::{LeadStatus, SaveSpecsRequest, SignupRequest};
use crate::otp_store::OtpStore;
use crate::validation::{normalize_email, Validator};
use serde_json::{json, Map, Value};

/// Outcome of a signup upsert.
#[derive(Debug, Clone)]
pub struct SignupOutcome {
    /// The contact as returned by the CRM.
    pub contact: Contact,
    /// Whether the contact was created (as opposed to updated in place).
    pub created: bool,
}

/// Orchestrates the lead pipeline: validation, OTP verification, and the
/// create-or-update protocol against the CRM.
///
/// Signup uses upsert semantics (update-if-exists, create-if-absent) so a
/// re-submitted first step is idempotent instead of a duplicate-email error.
#[derive(Clone)]
pub struct LeadService {
    validator: Validator,
    otp_store: OtpStore,
    mailer: Mailer,
    hubspot: HubspotClient,
}

impl LeadService {
    pub fn new(
        validator: Validator,
        otp_store: OtpStore,
        mailer: Mailer,
        hubspot: HubspotClient,
    ) -> Self {
        Self {
            validator,
            otp_store,
            mailer,
            hubspot,
        }
    }

    /// Normalizes and gate-checks an email, with the caller's message for
    /// the not-accepted case.
    fn accepted_email(&self, raw: &str, rejection: &str) -> Result<String, AppError> {
        let email = normalize_email(raw);
        if !self.validator.is_accepted_email(&email) {
            return Err(AppError::BadRequest(rejection.to_string()));
        }
        Ok(email)
    }

    /// Issues an OTP for the email and mails it to the lead.
    ///
    /// Validation failures never reach the mail relay. If delivery fails the
    /// stored code is simply left to expire on its own.
    pub async fn request_verification(&self, email: Option<String>) -> Result<(), AppError> {
        let raw = email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;
        let email = self.accepted_email(raw, "Invalid or unsupported email domain")?;

        let code = self.otp_store.issue(&email).await;
        self.mailer
            .send_otp(&email, &code)
            .await
            .context("Failed to send OTP")?;

        Ok(())
    }

    /// Checks a submitted OTP. A match consumes the stored code; the CRM is
    /// never contacted.
    pub async fn confirm_verification(
        &self,
        email: Option<String>,
        otp: Option<String>,
    ) -> Result<(), AppError> {
        let (raw_email, otp) = match (email.as_deref(), otp.as_deref()) {
            (Some(e), Some(o)) if !e.trim().is_empty() && !o.trim().is_empty() => (e, o),
            _ => {
                return Err(AppError::BadRequest(
                    "Email and OTP are required".to_string(),
                ))
            }
        };

        let email = normalize_email(raw_email);
        if self.otp_store.verify(&email, otp).await {
            Ok(())
        } else {
            Err(AppError::BadRequest("Invalid OTP".to_string()))
        }
    }

    /// Creates or updates the lead's CRM contact from the signup form.
    ///
    /// Validation runs in fixed order and fails on the first broken rule,
    /// before any CRM call. On create the contact carries
    /// `lifecyclestage="lead"` and `user_status="signup"`; on update the
    /// profile fields are rewritten but `user_status` is left alone so a
    /// submitted lead never regresses to `signup`.
    pub async fn signup(&self, req: SignupRequest) -> Result<SignupOutcome, AppError> {
        let raw_email = req
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;
        let email = self.accepted_email(raw_email, "Email must be from a supported provider")?;

        let first_name = required_field(&req.first_name, "First name is required")?;
        let last_name = required_field(&req.last_name, "Last name is required")?;
        let business_name = required_field(&req.business_name, "Business name is required")?;
        let country = required_field(&req.country_, "Country is required")?;

        if let Some(vat) = req.vat_number.as_deref().filter(|v| !v.is_empty()) {
            if !self.validator.is_accepted_vat(vat) {
                return Err(AppError::BadRequest(
                    "VAT number can contain only letters and numbers".to_string(),
                ));
            }
        }

        let mut properties = Map::new();
        properties.insert("firstname".to_string(), json!(first_name));
        properties.insert("lastname".to_string(), json!(last_name));
        properties.insert("business_name".to_string(), json!(business_name));
        properties.insert("vat_number".to_string(), json!(req.vat_number));
        properties.insert("country_".to_string(), json!(country));

        match self.hubspot.find_by_email(&email).await? {
            Some(existing) => {
                tracing::info!("Signup upsert: updating existing contact {}", existing.id);
                let contact = self
                    .hubspot
                    .update_contact(&existing.id, sanitize_properties(properties))
                    .await?;
                Ok(SignupOutcome {
                    contact,
                    created: false,
                })
            }
            None => {
                tracing::info!("Signup upsert: creating contact for {}", email);
                properties.insert("email".to_string(), json!(email));
                properties.insert("lifecyclestage".to_string(), json!("lead"));
                properties.insert(
                    "user_status".to_string(),
                    json!(LeadStatus::Signup.as_str()),
                );
                let contact = self
                    .hubspot
                    .create_contact(sanitize_properties(properties))
                    .await?;
                Ok(SignupOutcome {
                    contact,
                    created: true,
                })
            }
        }
    }

    /// Reports whether a contact exists for the email. Used by the later
    /// form steps to gate navigation.
    pub async fn check_email_exists(&self, email: Option<String>) -> Result<bool, AppError> {
        let raw = email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;
        let email = self.accepted_email(raw, "Invalid or unsupported email domain")?;

        let contact = self.hubspot.find_by_email(&email).await?;
        Ok(contact.is_some())
    }

    /// Attaches the vendor selection and sizing answers to the lead's
    /// existing contact and marks it `submitted`.
    pub async fn save_specs(&self, req: SaveSpecsRequest) -> Result<Contact, AppError> {
        let (raw_email, vendors, users) = match (
            req.email.as_deref().filter(|e| !e.trim().is_empty()),
            req.vendor.as_ref(),
            req.number_of_users,
        ) {
            (Some(e), Some(v), Some(n)) => (e, v, n),
            _ => {
                return Err(AppError::BadRequest(
                    "Email, vendor and number_of_users are required".to_string(),
                ))
            }
        };

        let email = self.accepted_email(raw_email, "Invalid or unsupported email domain")?;

        if vendors.is_empty() {
            return Err(AppError::BadRequest(
                "At least one software must be selected".to_string(),
            ));
        }
        if let Some(invalid) = self.validator.first_invalid_vendor(vendors) {
            return Err(AppError::BadRequest(format!(
                "Invalid software selected: {}",
                invalid
            )));
        }
        if !self.validator.is_positive_integer(users) {
            return Err(AppError::BadRequest(
                "Number of users must be a valid positive number".to_string(),
            ));
        }

        let contact = self
            .hubspot
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("Contact not found".to_string()))?;

        let mut properties = Map::new();
        properties.insert("vendor".to_string(), json!(vendors.join(", ")));
        properties.insert("number_of_users".to_string(), json!(users));
        properties.insert("recommended_cpu".to_string(), opt_value(req.recommended_cpu));
        properties.insert("recommended_ram".to_string(), opt_value(req.recommended_ram));
        properties.insert(
            "recommended_storage".to_string(),
            opt_value(req.recommended_storage),
        );
        properties.insert("final_ram".to_string(), opt_value(req.final_ram));
        properties.insert("final_storage".to_string(), opt_value(req.final_storage));
        properties.insert(
            "user_status".to_string(),
            json!(LeadStatus::Submitted.as_str()),
        );

        tracing::info!("Saving specs on contact {}", contact.id);
        self.hubspot
            .update_contact(&contact.id, sanitize_properties(properties))
            .await
    }
}

/// Presence check for a required form field; whitespace-only counts as
/// missing.
fn required_field<'a>(field: &'a Option<String>, message: &str) -> Result<&'a str, AppError> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}

fn opt_value(value: Option<Value>) -> Value {
    value.unwrap_or(Value::Null)
}
