use chrono::Duration;

/// Default time a session cookie survives a restart, counted from its last export.
const DEFAULT_SESSION_COOKIE_ALIVE_HOURS: i64 = 24;

/// Cookie jar configuration.
#[derive(Debug, Clone)]
pub struct JarConfig {
    /// How long after its last export a session cookie may still be restored.
    /// Zero or negative keeps session cookies forever.
    pub session_cookie_alive: Duration,
}

impl JarConfig {
    pub fn with_session_cookie_alive(mut self, alive: Duration) -> Self {
        self.session_cookie_alive = alive;
        self
    }
}

impl Default for JarConfig {
    fn default() -> Self {
        Self {
            session_cookie_alive: Duration::hours(DEFAULT_SESSION_COOKIE_ALIVE_HOURS),
        }
    }
}
