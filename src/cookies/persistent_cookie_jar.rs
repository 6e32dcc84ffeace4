use std::sync::Arc;

use http::HeaderMap;
use log::warn;
use url::Url;

use crate::cookies::cookie_jar::DefaultCookieJar;
use crate::cookies::{Cookie, CookieJar, CookieStoreHandle};

/// A `CookieJar` decorator that persists changes after each mutation.
///
/// This type is *transparent* for reads but *eagerly* persists after writes.
/// Persisting is best-effort: failures are logged and never panic.
pub struct PersistentCookieJar {
    /// Inner cookie jar that holds the actual cookie state.
    inner: Arc<DefaultCookieJar>,
    /// Handle to the cookie store responsible for persistence.
    store_handle: CookieStoreHandle,
}

impl PersistentCookieJar {
    /// Wraps `jar` after restoring the store's state into it.
    pub fn open(jar: Arc<DefaultCookieJar>, store_handle: CookieStoreHandle) -> anyhow::Result<Self> {
        store_handle.load_into(&jar)?;
        Ok(Self::new(jar, store_handle))
    }

    /// Wraps `jar` without loading anything.
    pub fn new(jar: Arc<DefaultCookieJar>, store_handle: CookieStoreHandle) -> Self {
        Self {
            inner: jar,
            store_handle,
        }
    }

    pub fn inner(&self) -> &Arc<DefaultCookieJar> {
        &self.inner
    }

    /// Writes the current state of the inner jar to the store.
    pub fn persist(&self) {
        if let Err(e) = self.store_handle.persist(&self.inner) {
            warn!("failed to persist cookies: {:#}", e);
        }
    }

    /// Stores `cookies` for `url`, then persists.
    pub fn set_cookies(&self, url: &Url, cookies: Vec<Cookie>) {
        self.inner.set_cookies(url, cookies);
        self.persist();
    }
}

impl CookieJar for PersistentCookieJar {
    /// Stores cookies from a response, then persists the updated state.
    fn store_response_cookies(&self, url: &Url, headers: &HeaderMap) {
        self.inner.store_response_cookies(url, headers);
        self.persist();
    }

    /// Returns the `Cookie` request header value for `url` without persisting.
    fn get_request_cookies(&self, url: &Url) -> Option<String> {
        self.inner.get_request_cookies(url)
    }

    /// Clears all cookies in the jar, then persists the updated state.
    fn clear(&self) {
        self.inner.clear();
        self.persist();
    }

    fn get_all_cookies(&self) -> Vec<Cookie> {
        self.inner.get_all_cookies()
    }

    /// Removes a single cookie by name for `url`, then persists the updated state.
    fn remove_cookie(&self, url: &Url, cookie_name: &str) {
        self.inner.remove_cookie(url, cookie_name);
        self.persist();
    }

    /// Removes all cookies for `url`, then persists the updated state.
    fn remove_cookies_for_url(&self, url: &Url) {
        self.inner.remove_cookies_for_url(url);
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::{CookieJarHandle, InMemoryCookieStore};
    use http::HeaderValue;

    #[test]
    fn mutations_are_persisted() {
        let store = Arc::new(InMemoryCookieStore::new());
        let jar = PersistentCookieJar::open(Arc::new(DefaultCookieJar::new()), store.clone()).unwrap();
        let u = Url::parse("https://example.com/").unwrap();

        let mut headers = HeaderMap::new();
        headers.append(http::header::SET_COOKIE, HeaderValue::from_static("token=xyz; Max-Age=600"));
        jar.store_response_cookies(&u, &headers);
        assert!(store.snapshot().unwrap().contains("token"));

        jar.remove_cookie(&u, "token");
        assert_eq!(store.snapshot().as_deref(), Some("[]"));
    }

    #[test]
    fn reopening_restores_state() {
        let store = Arc::new(InMemoryCookieStore::new());
        let u = Url::parse("https://example.com/").unwrap();
        {
            let jar = PersistentCookieJar::open(Arc::new(DefaultCookieJar::new()), store.clone()).unwrap();
            jar.set_cookies(&u, vec![Cookie::new("a", "1")]);
        }

        let reopened: CookieJarHandle =
            Arc::new(PersistentCookieJar::open(Arc::new(DefaultCookieJar::new()), store).unwrap());
        assert_eq!(reopened.get_request_cookies(&u).as_deref(), Some("a=1"));
        assert_eq!(reopened.get_all_cookies().len(), 1);
    }
}
