//! Saving and restoring the full state of a [`DefaultCookieJar`].
//!
//! The jar is exported as a JSON list of [`PersistenceItem`]s, one per stored
//! cookie. Two older record layouts are still accepted on restore and
//! migrated to the current one:
//!
//! | schema  | origin URL `U`      | timestamps                          |
//! |---------|---------------------|-------------------------------------|
//! | current | string              | `SessionCookieExportTime` (+ set time) |
//! | v1      | structured object   | `SessionCookieSetTime` only         |
//! | v0      | absent              | none                                |
//!
//! Restored records go through [`DefaultCookieJar::upsert`], the path live
//! cookies take, so an id already present keeps its creation time and
//! sequence number. Restore is not atomic: each record takes the jar lock on
//! its own and a failure leaves earlier records applied.
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cookies::cookie_jar::DefaultCookieJar;
use crate::cookies::cookies::zero_time;
use crate::cookies::date::parse_date_string;
use crate::cookies::entry::{Entry, UpsertContext};
use crate::cookies::session_policy::SessionCookiePolicy;
use crate::cookies::Cookie;
use crate::errors::CookieError;

/// One stored cookie in the current record schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersistenceItem {
    /// Registrable-domain key the entry lived under.
    pub key: String,
    pub def_path: String,
    pub host: String,
    pub cookie: Cookie,
    /// Origin URL, empty when unknown.
    pub u: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "zero_time::deserialize")]
    pub session_cookie_set_time: Option<DateTime<Utc>>,
    /// Set on session cookies only; judges their staleness on restore.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "zero_time::deserialize")]
    pub session_cookie_export_time: Option<DateTime<Utc>>,
    /// Effective domain of the entry.
    #[serde(default)]
    pub domain: String,
}

/// Record schema v1: the origin URL is a structured object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersistenceItemV1 {
    pub key: String,
    pub def_path: String,
    pub host: String,
    pub cookie: Cookie,
    pub u: LegacyUrl,
    #[serde(default, deserialize_with = "zero_time::deserialize")]
    pub session_cookie_set_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub domain: String,
}

/// Record schema v0: just the cookie and where it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersistenceItemV0 {
    pub key: String,
    pub def_path: String,
    pub host: String,
    pub cookie: Cookie,
}

/// URL as written by v1 records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LegacyUrl {
    pub scheme: String,
    pub opaque: String,
    pub host: String,
    pub path: String,
    pub raw_path: String,
    pub omit_host: bool,
    pub force_query: bool,
    pub raw_query: String,
    pub fragment: String,
    pub raw_fragment: String,
}

impl LegacyUrl {
    /// Reassembles the URL text.
    pub fn to_url_string(&self) -> String {
        let mut s = String::new();
        if !self.scheme.is_empty() {
            s.push_str(&self.scheme);
            s.push(':');
        }
        if !self.opaque.is_empty() {
            s.push_str(&self.opaque);
        } else {
            let path = if self.raw_path.is_empty() { &self.path } else { &self.raw_path };
            let authority = !self.scheme.is_empty() || !self.host.is_empty();
            if authority && !(self.omit_host && self.host.is_empty()) && (!self.host.is_empty() || !path.is_empty()) {
                s.push_str("//");
                s.push_str(&self.host);
            }
            if !path.is_empty() && !path.starts_with('/') && !self.host.is_empty() {
                s.push('/');
            }
            // A bare relative path whose first segment has a colon would read as a scheme.
            if s.is_empty() && path.split('/').next().is_some_and(|seg| seg.contains(':')) {
                s.push_str("./");
            }
            s.push_str(path);
        }
        if self.force_query || !self.raw_query.is_empty() {
            s.push('?');
            s.push_str(&self.raw_query);
        }
        if !self.fragment.is_empty() {
            s.push('#');
            s.push_str(if self.raw_fragment.is_empty() { &self.fragment } else { &self.raw_fragment });
        }
        s
    }
}

impl From<PersistenceItemV1> for PersistenceItem {
    fn from(v1: PersistenceItemV1) -> Self {
        PersistenceItem {
            key: v1.key,
            def_path: v1.def_path,
            host: v1.host,
            cookie: v1.cookie,
            // Without a host the URL carries no origin; the record's own key and host are used.
            u: if v1.u.host.is_empty() { String::new() } else { v1.u.to_url_string() },
            session_cookie_set_time: v1.session_cookie_set_time,
            // v1 has no export time; its set time is the best stand-in.
            session_cookie_export_time: v1.session_cookie_set_time,
            domain: v1.domain,
        }
    }
}

impl From<PersistenceItemV0> for PersistenceItem {
    fn from(v0: PersistenceItemV0) -> Self {
        PersistenceItem {
            key: v0.key,
            def_path: v0.def_path,
            host: v0.host,
            cookie: v0.cookie,
            u: String::new(),
            session_cookie_set_time: None,
            session_cookie_export_time: None,
            domain: String::new(),
        }
    }
}

/// A decoded record list, tagged with the schema it matched.
#[derive(Debug, Clone)]
pub enum PersistenceRecord {
    Current(Vec<PersistenceItem>),
    V1(Vec<PersistenceItemV1>),
    V0(Vec<PersistenceItemV0>),
}

impl PersistenceRecord {
    /// Decodes `text`, trying the current schema, then v1, then v0.
    ///
    /// When nothing matches, the current schema's error is returned.
    pub fn decode(text: &str) -> Result<Self, CookieError> {
        let current_err = match serde_json::from_str::<Vec<PersistenceItem>>(text) {
            Ok(items) => return Ok(PersistenceRecord::Current(items)),
            Err(e) => e,
        };
        if let Ok(items) = serde_json::from_str::<Vec<PersistenceItemV1>>(text) {
            return Ok(PersistenceRecord::V1(items));
        }
        if let Ok(items) = serde_json::from_str::<Vec<PersistenceItemV0>>(text) {
            return Ok(PersistenceRecord::V0(items));
        }
        Err(CookieError::Decode(current_err))
    }

    pub fn schema(&self) -> &'static str {
        match self {
            PersistenceRecord::Current(_) => "current",
            PersistenceRecord::V1(_) => "v1",
            PersistenceRecord::V0(_) => "v0",
        }
    }

    /// Migrates the records to the current schema.
    pub fn into_items(self) -> Vec<PersistenceItem> {
        match self {
            PersistenceRecord::Current(items) => items,
            PersistenceRecord::V1(items) => items.into_iter().map(Into::into).collect(),
            PersistenceRecord::V0(items) => items.into_iter().map(Into::into).collect(),
        }
    }
}

impl Entry {
    /// Snapshot of this entry for export at `now`.
    fn to_persistence_item(&self, now: DateTime<Utc>) -> PersistenceItem {
        let mut cookie = self.cookie.clone();
        // Max-Age is relative to receipt; once stored only the absolute expiry means anything.
        if cookie.max_age > 0 {
            if cookie.expires.is_none() {
                cookie.expires = self.expires;
            }
            cookie.max_age = 0;
        }

        PersistenceItem {
            key: self.key.clone(),
            def_path: self.def_path.clone(),
            host: self.host.clone(),
            cookie,
            u: self.url.as_ref().map(Url::to_string).unwrap_or_default(),
            session_cookie_set_time: None,
            session_cookie_export_time: (!self.is_persistent()).then_some(now),
            domain: self.domain.clone(),
        }
    }
}

impl DefaultCookieJar {
    /// Exports every live entry at `now`, ordered by key and creation order.
    ///
    /// Expired entries are evicted instead of exported.
    pub fn get_all_cookies_as_persistence_items_at(&self, now: DateTime<Utc>) -> Vec<PersistenceItem> {
        let mut live = self.sweep_all(now);
        live.sort_by(|a, b| a.key.cmp(&b.key).then(a.seq_num.cmp(&b.seq_num)));
        live.iter().map(|e| e.to_persistence_item(now)).collect()
    }

    pub fn get_all_cookies_as_persistence_items(&self) -> Vec<PersistenceItem> {
        self.get_all_cookies_as_persistence_items_at(Utc::now())
    }

    pub fn serialize_cookies_to_items(&self) -> Vec<PersistenceItem> {
        self.get_all_cookies_as_persistence_items()
    }

    /// Serializes the whole jar as current-schema JSON.
    pub fn serialize_cookies_to_str(&self) -> Result<String, CookieError> {
        serde_json::to_string(&self.serialize_cookies_to_items()).map_err(CookieError::Encode)
    }

    /// Restores `items` into the jar.
    ///
    /// Per record: a legacy `RawExpires` is reparsed (failure aborts the
    /// restore), expired persistent cookies and stale session cookies are
    /// dropped, everything else is upserted. `session_cookie_alive <= 0`
    /// keeps all session cookies.
    pub fn deserialize_cookies_from_items_with_duration(
        &self,
        items: Vec<PersistenceItem>,
        session_cookie_alive: Duration,
    ) -> Result<(), CookieError> {
        self.deserialize_cookies_from_items_with_duration_at(items, session_cookie_alive, Utc::now())
    }

    pub fn deserialize_cookies_from_items_with_duration_at(
        &self,
        items: Vec<PersistenceItem>,
        session_cookie_alive: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), CookieError> {
        let policy = SessionCookiePolicy::new(session_cookie_alive);

        for item in items {
            let mut cookie = item.cookie;
            if !cookie.raw_expires.is_empty() {
                cookie.expires = Some(parse_date_string(&cookie.raw_expires)?);
            }

            if cookie.expires.is_some_and(|t| t < now) {
                debug!("dropping expired cookie {:?} for {}", cookie.name, item.host);
                continue;
            }

            if cookie.max_age == 0 && cookie.expires.is_none() {
                if let Some(exported) = item.session_cookie_export_time {
                    if policy.is_stale(exported, now) {
                        debug!("dropping stale session cookie {:?} for {}", cookie.name, item.host);
                        continue;
                    }
                }
            }

            let url = if item.u.is_empty() {
                None
            } else {
                Some(Url::parse(&item.u)?)
            };
            let ctx = match url.as_ref().and_then(|u| self.context_for(u)) {
                Some(ctx) => ctx,
                None => UpsertContext {
                    key: item.key,
                    host: item.host,
                    def_path: item.def_path,
                    url,
                },
            };

            let name = cookie.name.clone();
            if let Err(e) = self.upsert(&ctx, cookie, now) {
                warn!("skipping restored cookie {:?} for {}: {}", name, ctx.host, e);
            }
        }
        Ok(())
    }

    /// Restores a jar saved by [`serialize_cookies_to_str`](Self::serialize_cookies_to_str)
    /// or by an older client. Nothing is applied unless `text` decodes under some schema.
    pub fn deserialize_cookies_from_str(
        &self,
        text: &str,
        session_cookie_alive: Duration,
    ) -> Result<(), CookieError> {
        self.deserialize_cookies_from_str_at(text, session_cookie_alive, Utc::now())
    }

    pub fn deserialize_cookies_from_str_at(
        &self,
        text: &str,
        session_cookie_alive: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), CookieError> {
        let record = PersistenceRecord::decode(text)?;
        debug!("restoring cookies from {} schema", record.schema());
        self.deserialize_cookies_from_items_with_duration_at(record.into_items(), session_cookie_alive, now)
    }
}
