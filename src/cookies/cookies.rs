//! Cookie core types.
//!
//! This module defines the serializable [`Cookie`] data structure and the
//! type-erased [`CookieJarHandle`] used by callers that only need the
//! [`CookieJar`] surface.
//!
//! # Wire form
//! [`Cookie`] (de)serializes with `PascalCase` field names. An absent expiry is
//! written as the zero time `0001-01-01T00:00:00Z`, and that value reads back
//! as "no expiry", so cookie files written by older clients stay readable.
//!
//! ```rust
//! use cookiejar::cookies::{Cookie, SameSite};
//!
//! let c = Cookie::parse_set_cookie("session=abc123; Path=/; Secure; SameSite=Lax").unwrap();
//! assert_eq!(c.name, "session");
//! assert_eq!(c.path, "/");
//! assert!(c.secure);
//! assert_eq!(c.same_site, SameSite::Lax);
//! ```
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::cookies::date::parse_date_string;
use crate::cookies::same_site::SameSite;
use crate::cookies::CookieJar;

/// A handle to a cookie jar trait.
///
/// Jars are internally synchronized, so the handle is a plain `Arc`.
pub type CookieJarHandle = Arc<dyn CookieJar>;

/// A cookie as received from a response or restored from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// `Path` attribute. Empty means "derive from the request URL".
    pub path: String,

    /// `Domain` attribute as sent. Empty means host-only.
    pub domain: String,

    /// Absolute expiry. `None` for session cookies.
    #[serde(with = "zero_time")]
    pub expires: Option<DateTime<Utc>>,

    /// `Expires` text exactly as received, reparsed on restore.
    pub raw_expires: String,

    /// `0` means unspecified, negative means "delete now", positive is seconds.
    pub max_age: i64,

    pub secure: bool,

    pub http_only: bool,

    pub same_site: SameSite,

    /// Full `Set-Cookie` text, when parsed from a header.
    pub raw: String,

    /// Attributes that were not understood.
    #[serde(deserialize_with = "null_as_default")]
    pub unparsed: Vec<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Cookie {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Parses one `Set-Cookie` header value.
    ///
    /// Only the attributes the jar acts on are interpreted: `Path`, `Domain`,
    /// `Expires`, `Max-Age`, `Secure`, `HttpOnly` and `SameSite`. Others are
    /// kept in [`Cookie::unparsed`]. Returns `None` without a `name=value` pair.
    pub fn parse_set_cookie(header: &str) -> Option<Cookie> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie::new(name, value.trim());
        cookie.raw = header.to_string();

        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (attr, val) = match part.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (part, ""),
            };

            match attr.to_ascii_lowercase().as_str() {
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "domain" => cookie.domain = val.to_string(),
                "path" => cookie.path = val.to_string(),
                "samesite" => cookie.same_site = SameSite::from_attribute(part),
                "max-age" => {
                    // Leading zeros are not a valid delta-seconds.
                    match val.parse::<i64>() {
                        Ok(secs) if secs != 0 && val.starts_with('0') => {}
                        Ok(secs) => cookie.max_age = if secs <= 0 { -1 } else { secs },
                        Err(_) => {}
                    }
                }
                "expires" => {
                    cookie.raw_expires = val.to_string();
                    cookie.expires = parse_date_string(val).ok();
                }
                _ => cookie.unparsed.push(part.to_string()),
            }
        }

        Some(cookie)
    }
}

/// Optional timestamps where the zero time stands in for "unset".
pub(crate) mod zero_time {
    use chrono::{DateTime, Datelike, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    const ZERO: &str = "0001-01-01T00:00:00Z";

    pub fn serialize<S: Serializer>(t: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => t.serialize(s),
            None => s.serialize_str(ZERO),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let t = Option::<DateTime<Utc>>::deserialize(d)?;
        Ok(t.filter(|t| t.year() > 1))
    }
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}
