use moka::future::Cache;
use rand::Rng;
use std::time::{Duration, Instant};

/// Default lifetime of an issued code.
const OTP_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    expires_at: Instant,
}

/// Time-expiring store of one-time passcodes, keyed by normalized email.
///
/// At most one live code per email: issuing a new code overwrites the
/// previous entry and restarts its expiry. A successful verification
/// consumes the code in the same operation that compares it, so a code can
/// never be redeemed twice. The backing cache owns expiry scheduling;
/// entries also carry their own deadline so a code past the 5-minute window
/// is refused even before the cache evicts it.
///
/// In-memory only: codes do not survive a restart, which is acceptable for
/// their lifetime. A multi-instance deployment needs a networked TTL store
/// behind the same contract. There is no lockout or backoff on failed
/// attempts (known hardening gap).
#[derive(Clone)]
pub struct OtpStore {
    codes: Cache<String, OtpEntry>,
    ttl: Duration,
}

impl OtpStore {
    /// Creates a store with the standard 5-minute code lifetime.
    pub fn new() -> Self {
        Self::with_ttl(OTP_TTL)
    }

    /// Creates a store with a custom code lifetime. Used by tests to
    /// exercise expiry without waiting out the real window.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            codes: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(10_000)
                .build(),
            ttl,
        }
    }

    /// Issues a fresh 6-digit code for the given (normalized) email,
    /// replacing any previously issued code and resetting its expiry.
    pub async fn issue(&self, email: &str) -> String {
        let code = format!("{}", rand::thread_rng().gen_range(100_000..=999_999));
        let entry = OtpEntry {
            code: code.clone(),
            expires_at: Instant::now() + self.ttl,
        };
        self.codes.insert(email.to_string(), entry).await;
        tracing::debug!("Issued OTP for {}", email);
        code
    }

    /// Verifies a submitted code against the stored one.
    ///
    /// The entry is removed atomically before comparison: on a match the
    /// code is consumed, on a mismatch the original entry (with its original
    /// deadline) is put back, and an expired or absent entry always fails.
    pub async fn verify(&self, email: &str, code: &str) -> bool {
        match self.codes.remove(email).await {
            Some(entry) if entry.expires_at <= Instant::now() => {
                tracing::debug!("OTP for {} expired before verification", email);
                false
            }
            Some(entry) if entry.code == code => {
                tracing::info!("OTP verified for {}", email);
                true
            }
            Some(entry) => {
                // Wrong code: restore the entry so the real one stays usable.
                self.codes.insert(email.to_string(), entry).await;
                tracing::debug!("OTP mismatch for {}", email);
                false
            }
            None => false,
        }
    }
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new()
    }
}
