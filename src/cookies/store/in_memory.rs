use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use crate::cookies::cookie_jar::DefaultCookieJar;
use crate::cookies::store::CookieStore;

/// Keeps the last persisted state as text in memory.
#[derive(Debug, Default)]
pub struct InMemoryCookieStore {
    snapshot: Mutex<Option<String>>,
}

impl InMemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from previously serialized jar text.
    pub fn with_snapshot(text: impl Into<String>) -> Self {
        Self {
            snapshot: Mutex::new(Some(text.into())),
        }
    }

    /// The serialized text of the last persist, if any.
    pub fn snapshot(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CookieStore for InMemoryCookieStore {
    fn load_into(&self, jar: &DefaultCookieJar) -> Result<()> {
        let Some(text) = self.snapshot() else {
            return Ok(());
        };
        jar.deserialize_cookies_from_str(&text, jar.config().session_cookie_alive)?;
        Ok(())
    }

    fn persist(&self, jar: &DefaultCookieJar) -> Result<()> {
        let text = jar.serialize_cookies_to_str()?;
        *self.lock() = Some(text);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.lock().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::{Cookie, CookieJar};
    use url::Url;

    #[test]
    fn empty_store_loads_nothing() {
        let store = InMemoryCookieStore::new();
        let jar = DefaultCookieJar::new();
        store.load_into(&jar).unwrap();
        assert!(jar.get_all_cookies().is_empty());
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn persist_then_load_into_fresh_jar() {
        let store = InMemoryCookieStore::new();
        let u = Url::parse("http://example.com/").unwrap();

        let jar = DefaultCookieJar::new();
        jar.set_cookies(&u, vec![Cookie::new("a", "1")]);
        store.persist(&jar).unwrap();
        assert!(store.snapshot().unwrap().contains("\"Name\":\"a\""));

        let fresh = DefaultCookieJar::new();
        store.load_into(&fresh).unwrap();
        assert_eq!(fresh.get_request_cookies(&u).as_deref(), Some("a=1"));

        store.clear().unwrap();
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn seeded_snapshot_must_decode() {
        let store = InMemoryCookieStore::with_snapshot("not json");
        assert!(store.load_into(&DefaultCookieJar::new()).is_err());
    }
}
