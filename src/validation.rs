use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// Consumer/ISP mail providers accepted at signup. Kept in sync with the
/// form's client-side list.
const DEFAULT_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "outlook.com",
    "hotmail.com",
    "icloud.com",
    "aol.com",
    "protonmail.com",
    "zoho.com",
    "mail.com",
    "gmx.com",
    "yandex.com",
    "live.com",
    "msn.com",
    "comcast.net",
    "verizon.net",
    "att.net",
    "me.com",
    "mac.com",
    "fastmail.com",
    "hushmail.com",
    "tutanota.com",
    "rediffmail.com",
    "qq.com",
    "naver.com",
    "daum.net",
    "hanmail.net",
    "seznam.cz",
    "orange.fr",
    "wanadoo.fr",
    "laposte.net",
    "bluewin.ch",
    "telia.com",
    "btinternet.com",
    "virginmedia.com",
    "shaw.ca",
    "rogers.com",
];

/// Software vendors selectable in the sizing step (checkbox values).
const DEFAULT_VENDORS: &[&str] = &["E-Soft", "BTMS", "Pastel"];

/// Normalizes an email address for use as the lead's unique key.
///
/// Trims surrounding whitespace and lowercases. Idempotent.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Input validation rules for the signup pipeline.
///
/// Holds the allow-lists as immutable sets so they can be overridden from
/// configuration at startup without touching pipeline logic. All rules are
/// pure and never panic.
#[derive(Debug, Clone)]
pub struct Validator {
    allowed_domains: Arc<HashSet<String>>,
    allowed_vendors: Arc<HashSet<String>>,
    email_shape: Regex,
}

impl Validator {
    /// Creates a validator with the compiled-in allow-lists.
    pub fn new() -> Self {
        Self::with_lists(
            DEFAULT_EMAIL_DOMAINS.iter().map(|d| d.to_string()),
            DEFAULT_VENDORS.iter().map(|v| v.to_string()),
        )
    }

    /// Creates a validator from explicit allow-lists (configuration overrides).
    pub fn with_lists(
        domains: impl IntoIterator<Item = String>,
        vendors: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            allowed_domains: Arc::new(domains.into_iter().collect()),
            allowed_vendors: Arc::new(vendors.into_iter().collect()),
            // local@domain.tld, no whitespace, single @
            email_shape: Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
                .expect("email shape regex is valid"),
        }
    }

    /// Builds a validator from configuration, falling back to the defaults
    /// for any list the config does not override.
    pub fn from_config(config: &crate::config::Config) -> Self {
        let domains: Vec<String> = config
            .allowed_email_domains
            .clone()
            .unwrap_or_else(|| DEFAULT_EMAIL_DOMAINS.iter().map(|d| d.to_string()).collect());
        let vendors: Vec<String> = config
            .allowed_vendors
            .clone()
            .unwrap_or_else(|| DEFAULT_VENDORS.iter().map(|v| v.to_string()).collect());
        Self::with_lists(domains, vendors)
    }

    /// Checks whether an email is acceptable for signup.
    ///
    /// The address must have `local@domain.tld` shape AND its domain must be
    /// on the allow-list of consumer mail providers. This is a policy gate,
    /// not a general syntax check: RFC-valid business addresses are rejected.
    pub fn is_accepted_email(&self, email: &str) -> bool {
        if !self.email_shape.is_match(email) {
            return false;
        }
        match email.rsplit_once('@') {
            Some((_, domain)) => self.allowed_domains.contains(domain),
            None => false,
        }
    }

    /// Checks a VAT number: non-empty, ASCII letters and digits only.
    ///
    /// VAT is optional at signup; absence is handled by the caller.
    pub fn is_accepted_vat(&self, vat: &str) -> bool {
        !vat.is_empty() && vat.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// Checks that a vendor selection is non-empty and fully allow-listed.
    pub fn is_accepted_vendor_set(&self, vendors: &[String]) -> bool {
        !vendors.is_empty() && self.first_invalid_vendor(vendors).is_none()
    }

    /// Returns the first selected vendor that is not on the allow-list,
    /// so rejections can name the offending entry.
    pub fn first_invalid_vendor<'a>(&self, vendors: &'a [String]) -> Option<&'a str> {
        vendors
            .iter()
            .find(|v| !self.allowed_vendors.contains(v.as_str()))
            .map(|v| v.as_str())
    }

    /// Checks that a count is a positive integer.
    pub fn is_positive_integer(&self, n: i64) -> bool {
        n > 0
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
