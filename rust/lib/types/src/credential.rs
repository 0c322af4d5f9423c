use chrono::{DateTime, Duration, Utc};

/// Seconds shaved off the advertised lifetime so a token is never used
/// right at its upstream expiry.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Advertised lifetimes beyond this are treated as this.
const MAX_LIFETIME_SECS: i64 = 10 * 365 * 24 * 3600;

/// An upstream bearer token and the instant it stops being handed out.
///
/// Replaced wholesale on renewal; never mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build from a token response issued at `now` with `expires_in` seconds
    /// of advertised lifetime. The safety margin is already subtracted.
    pub fn issued(token: impl Into<String>, expires_in: u64, now: DateTime<Utc>) -> Self {
        let lifetime = i64::try_from(expires_in)
            .unwrap_or(MAX_LIFETIME_SECS)
            .min(MAX_LIFETIME_SECS);
        Self {
            token: token.into(),
            expires_at: now + Duration::seconds(lifetime - EXPIRY_MARGIN_SECS),
        }
    }

    /// Valid strictly before `expires_at`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
