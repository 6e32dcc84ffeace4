//! Restart retention of session cookies.
//!
//! A session cookie has no expiry of its own. When it is exported the export
//! time is recorded, and on restore the cookie is only re-admitted while that
//! export is recent enough. Because the clock restarts at every export, a
//! session cookie that keeps being saved never ages out.
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCookiePolicy {
    alive: Duration,
}

impl SessionCookiePolicy {
    /// Zero or negative `alive` disables the policy.
    pub fn new(alive: Duration) -> Self {
        Self { alive }
    }

    pub fn is_enabled(&self) -> bool {
        self.alive > Duration::zero()
    }

    /// `true` if a session cookie exported at `exported_at` must not be restored at `now`.
    pub fn is_stale(&self, exported_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.is_enabled() && now.signed_duration_since(exported_at) > self.alive
    }
}
