//! Cookie jar abstraction and the in-memory implementation.
//!
//! This module defines the [`CookieJar`] trait and the reference
//! implementation, [`DefaultCookieJar`], which keeps cookies in memory and
//! follows RFC 6265 for storage and retrieval.
//!
//! ## Storage
//! Entries are grouped by **registrable-domain key** (see
//! [`KeyResolver`](crate::cookies::KeyResolver)): the jar is a map of key to
//! submap, and each submap maps an entry id (`domain;path;name`) to its
//! [`Entry`]. Re-inserting an id updates the entry in place and keeps its
//! creation time and sequence number, which keeps retrieval order stable.
//!
//! ## Concurrency
//! One mutex guards the whole map. Every public operation holds it for its
//! full duration, so the jar can be shared as an `Arc` without further
//! locking. No I/O happens while the lock is held.
//!
//! ## Expiry
//! There is no background sweeper. Expired persistent entries are removed the
//! next time their submap is touched, by a write or by a retrieval. Retrieval
//! therefore **mutates** the jar, see [`DefaultCookieJar::cookies_at`].
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use http::HeaderMap;
use log::{debug, warn};
use url::Url;

use crate::config::JarConfig;
use crate::cookies::entry::{Entry, Incoming, UpsertContext};
use crate::cookies::key::{canonical_host, default_path, KeyResolver, LastTwoLabels};
use crate::cookies::Cookie;
use crate::errors::CookieError;

/// Process-wide creation counter, the final tie-break of retrieval order.
static NEXT_SEQ_NUM: AtomicU64 = AtomicU64::new(0);

type Submap = HashMap<String, Entry>;

/// A cookie jar holds the cookies of one client.
///
/// Implementations are internally synchronized; all methods take `&self`.
pub trait CookieJar: Send + Sync {
    /// Stores cookies found in the `Set-Cookie` headers of a response for `url`.
    fn store_response_cookies(&self, url: &Url, headers: &HeaderMap);

    /// Returns the `Cookie` request header value to send for `url`, if any.
    ///
    /// Expired cookies met on the way are evicted.
    fn get_request_cookies(&self, url: &Url) -> Option<String>;

    /// Removes all cookies from the jar.
    fn clear(&self);

    /// Returns every stored cookie as received, in no particular order.
    fn get_all_cookies(&self) -> Vec<Cookie>;

    /// Removes the cookies named `cookie_name` that apply to the host of `url`.
    fn remove_cookie(&self, url: &Url, cookie_name: &str);

    /// Removes all cookies that apply to the host of `url`.
    fn remove_cookies_for_url(&self, url: &Url);
}

/// Result of [`DefaultCookieJar::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Removed,
    /// A removal for an id that was not stored.
    Ignored,
}

/// In-memory cookie jar.
pub struct DefaultCookieJar {
    entries: Mutex<HashMap<String, Submap>>,
    resolver: Arc<dyn KeyResolver>,
    config: JarConfig,
}

impl Default for DefaultCookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultCookieJar {
    /// Creates an empty jar keyed by [`LastTwoLabels`].
    pub fn new() -> Self {
        Self::with_config(JarConfig::default())
    }

    pub fn with_config(config: JarConfig) -> Self {
        DefaultCookieJar {
            entries: Mutex::new(HashMap::new()),
            resolver: Arc::new(LastTwoLabels),
            config,
        }
    }

    /// Replaces the registrable-domain key computation.
    pub fn with_key_resolver(mut self, resolver: impl KeyResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn config(&self) -> &JarConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Submap>> {
        // Every critical section leaves the map consistent, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Derives the upsert context for a live request. `None` for non-HTTP(S) URLs.
    pub fn context_for(&self, url: &Url) -> Option<UpsertContext> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }
        let host = canonical_host(url)?;
        Some(UpsertContext {
            key: self.resolver.registrable_key(&host),
            def_path: default_path(url.path()),
            host,
            url: Some(url.clone()),
        })
    }

    /// Inserts, updates or removes the entry `cookie` maps to.
    ///
    /// A new id gets `creation = now` and a fresh sequence number; an existing
    /// id keeps both. Expired entries of the touched submap are swept first.
    pub fn upsert(
        &self,
        ctx: &UpsertContext,
        cookie: Cookie,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, CookieError> {
        let incoming = Entry::from_cookie(cookie, ctx, now, self.resolver.as_ref())?;

        let mut entries = self.lock();
        let submap = entries.entry(ctx.key.clone()).or_default();
        submap.retain(|_, e| !e.is_expired(now));

        let outcome = match incoming {
            Incoming::Remove { id } => match submap.remove(&id) {
                Some(_) => UpsertOutcome::Removed,
                None => UpsertOutcome::Ignored,
            },
            Incoming::Store(mut entry) => {
                let id = entry.id();
                let outcome = match submap.get(&id) {
                    Some(old) => {
                        entry.creation = old.creation;
                        entry.seq_num = old.seq_num;
                        UpsertOutcome::Updated
                    }
                    None => {
                        entry.seq_num = NEXT_SEQ_NUM.fetch_add(1, Ordering::Relaxed);
                        UpsertOutcome::Created
                    }
                };
                entry.last_access = now;
                submap.insert(id, entry);
                outcome
            }
        };

        if submap.is_empty() {
            entries.remove(&ctx.key);
        }
        Ok(outcome)
    }

    /// Stores `cookies` received in a response to `url`.
    ///
    /// Cookies for non-HTTP(S) URLs are ignored. A cookie with an illegal
    /// domain is skipped and does not affect the others.
    pub fn set_cookies(&self, url: &Url, cookies: Vec<Cookie>) {
        self.set_cookies_at(url, cookies, Utc::now());
    }

    pub fn set_cookies_at(&self, url: &Url, cookies: Vec<Cookie>, now: DateTime<Utc>) {
        let Some(ctx) = self.context_for(url) else {
            return;
        };
        for cookie in cookies {
            let name = cookie.name.clone();
            match self.upsert(&ctx, cookie, now) {
                Ok(outcome) => debug!("cookie {:?} for {}: {:?}", name, ctx.host, outcome),
                Err(e) => warn!("rejecting cookie {:?} from {}: {}", name, ctx.host, e),
            }
        }
    }

    /// Flattened snapshot of every entry, in no particular order.
    pub fn all_entries(&self) -> Vec<Entry> {
        self.lock().values().flat_map(|submap| submap.values().cloned()).collect()
    }

    /// Snapshot of the submap stored under `key`.
    pub fn submap_for(&self, key: &str) -> HashMap<String, Entry> {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    /// Evicts every expired entry and returns a snapshot of the rest.
    pub(crate) fn sweep_all(&self, now: DateTime<Utc>) -> Vec<Entry> {
        let mut entries = self.lock();
        entries.retain(|_, submap| {
            submap.retain(|_, e| !e.is_expired(now));
            !submap.is_empty()
        });
        entries.values().flat_map(|submap| submap.values().cloned()).collect()
    }

    /// Selects the entries to send to `url` at `now`, in RFC 6265 order.
    ///
    /// Evicts expired entries of the URL's submap and refreshes the last
    /// access time of the selected ones.
    fn select(&self, url: &Url, now: DateTime<Utc>) -> Vec<Entry> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Vec::new();
        }
        let Some(host) = canonical_host(url) else {
            return Vec::new();
        };
        let key = self.resolver.registrable_key(&host);
        let https = url.scheme() == "https";
        let path = match url.path() {
            "" => "/",
            p => p,
        };

        let mut entries = self.lock();
        let Some(submap) = entries.get_mut(&key) else {
            return Vec::new();
        };

        let mut selected = Vec::new();
        submap.retain(|_, e| {
            if e.is_expired(now) {
                return false;
            }
            if e.should_send(https, &host, path) {
                e.last_access = now;
                selected.push(e.clone());
            }
            true
        });
        if submap.is_empty() {
            entries.remove(&key);
        }
        drop(entries);

        // RFC 6265 section 5.4 point 2: longest path first, then earliest
        // creation, then insertion order.
        selected.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then(a.creation.cmp(&b.creation))
                .then(a.seq_num.cmp(&b.seq_num))
        });
        selected
    }

    /// Cookies to send to `url`, reduced to name and value.
    ///
    /// **Mutates the jar**: expired entries of the URL's submap are evicted and
    /// the returned ones get their last access time set to `now`.
    pub fn cookies_at(&self, url: &Url, now: DateTime<Utc>) -> Vec<Cookie> {
        self.select(url, now).iter().map(Entry::stripped).collect()
    }

    /// [`cookies_at`](Self::cookies_at) at the current time.
    pub fn cookies(&self, url: &Url) -> Vec<Cookie> {
        self.cookies_at(url, Utc::now())
    }

    /// Same selection and side effects as [`cookies_at`](Self::cookies_at), but
    /// returns the cookies as they were stored, with every attribute.
    pub fn cookies_original_at(&self, url: &Url, now: DateTime<Utc>) -> Vec<Cookie> {
        self.select(url, now).into_iter().map(|e| e.cookie).collect()
    }

    pub fn cookies_original(&self, url: &Url) -> Vec<Cookie> {
        self.cookies_original_at(url, Utc::now())
    }

    /// `name=value` pairs for `url` joined with `;`.
    pub fn cookies_to_str_by_semi(&self, url: &Url) -> String {
        self.cookies(url)
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// First cookie named `name`, among those for `url` or, without a URL,
    /// among every stored cookie.
    pub fn get_cookie_by_name(&self, url: Option<&Url>, name: &str) -> Option<Cookie> {
        let cookies = match url {
            Some(url) => self.cookies(url),
            None => self.get_all_cookies_raw(),
        };
        cookies.into_iter().find(|c| c.name == name)
    }

    /// Every stored cookie as received. Does not sweep.
    pub fn get_all_cookies_raw(&self) -> Vec<Cookie> {
        self.lock()
            .values()
            .flat_map(|submap| submap.values().map(|e| e.cookie.clone()))
            .collect()
    }

    /// Removes entries of `url`'s submap that apply to its host and satisfy `pred`.
    fn remove_matching(&self, url: &Url, pred: impl Fn(&Entry) -> bool) {
        let Some(host) = canonical_host(url) else {
            return;
        };
        let key = self.resolver.registrable_key(&host);

        let mut entries = self.lock();
        if let Some(submap) = entries.get_mut(&key) {
            submap.retain(|_, e| !(e.domain_match(&host) && pred(e)));
            if submap.is_empty() {
                entries.remove(&key);
            }
        }
    }
}

impl CookieJar for DefaultCookieJar {
    fn store_response_cookies(&self, url: &Url, headers: &HeaderMap) {
        let cookies = headers
            .get_all(http::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(Cookie::parse_set_cookie)
            .collect();
        self.set_cookies(url, cookies);
    }

    fn get_request_cookies(&self, url: &Url) -> Option<String> {
        let header = self
            .cookies(url)
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn get_all_cookies(&self) -> Vec<Cookie> {
        self.get_all_cookies_raw()
    }

    fn remove_cookie(&self, url: &Url, cookie_name: &str) {
        self.remove_matching(url, |e| e.name == cookie_name);
    }

    fn remove_cookies_for_url(&self, url: &Url) {
        self.remove_matching(url, |_| true);
    }
}
