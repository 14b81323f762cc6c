use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============ Request Payloads ============
//
// Required-ness is enforced by the pipeline, not by serde, so a missing
// field produces the form's own message ("First name is required") instead
// of a deserialization error.

/// POST /api/send-otp
#[derive(Debug, Clone, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// POST /api/verify-otp
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
}

/// POST /api/signup
///
/// Field names mirror the form payload: the person fields are camelCase,
/// the company fields already use the CRM property names.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, rename = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub vat_number: Option<String>,
    #[serde(default)]
    pub country_: Option<String>,
}

/// POST /api/check-email
#[derive(Debug, Clone, Deserialize)]
pub struct CheckEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// POST /api/save-specs
///
/// The sizing fields are produced by the calculator step and passed through
/// to the CRM verbatim (numeric or text).
#[derive(Debug, Clone, Deserialize)]
pub struct SaveSpecsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub vendor: Option<Vec<String>>,
    #[serde(default)]
    pub number_of_users: Option<i64>,
    #[serde(default)]
    pub recommended_cpu: Option<Value>,
    #[serde(default)]
    pub recommended_ram: Option<Value>,
    #[serde(default)]
    pub recommended_storage: Option<Value>,
    #[serde(default)]
    pub final_ram: Option<Value>,
    #[serde(default)]
    pub final_storage: Option<Value>,
}

// ============ Lead lifecycle ============

/// Coarse lifecycle marker persisted as the `user_status` CRM property.
///
/// The only transition is `Signup -> Submitted`; nothing moves a lead back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    Signup,
    Submitted,
}

impl LeadStatus {
    /// The wire value stored in the CRM.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Signup => "signup",
            LeadStatus::Submitted => "submitted",
        }
    }
}
