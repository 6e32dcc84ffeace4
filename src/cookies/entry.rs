//! Stored cookie entries.
//!
//! An [`Entry`] is a [`Cookie`] after canonicalization against the request it
//! arrived with: its effective domain and path are resolved, host-only is
//! decided, and `Max-Age`/`Expires` are folded into a single absolute expiry.
use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::cookies::key::{has_dot_suffix, is_ip, KeyResolver};
use crate::cookies::same_site::SameSite;
use crate::cookies::Cookie;
use crate::errors::CookieError;

/// Where an incoming cookie came from.
///
/// For live traffic this is derived from the request URL. Restored records
/// carry it explicitly, and the oldest record schema has no URL at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertContext {
    /// Registrable-domain key the cookie is stored under.
    pub key: String,
    /// Canonical request host.
    pub host: String,
    /// Default path of the request URL.
    pub def_path: String,
    /// Origin URL, when known.
    pub url: Option<Url>,
}

/// One stored cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub value: String,
    /// Effective domain (host for host-only cookies).
    pub domain: String,
    pub host_only: bool,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    /// Absolute expiry. `None` marks a session cookie.
    pub expires: Option<DateTime<Utc>>,
    pub creation: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub seq_num: u64,

    /// The cookie as it was received.
    pub cookie: Cookie,
    pub key: String,
    pub host: String,
    pub def_path: String,
    pub url: Option<Url>,
}

/// What an incoming cookie asks the jar to do.
#[derive(Debug)]
pub(crate) enum Incoming {
    Store(Entry),
    Remove { id: String },
}

impl Entry {
    /// Canonicalizes `cookie` for storage.
    ///
    /// `creation` and `last_access` start at `now` and `seq_num` at zero; the
    /// jar assigns or carries them forward when inserting.
    pub(crate) fn from_cookie(
        cookie: Cookie,
        ctx: &UpsertContext,
        now: DateTime<Utc>,
        resolver: &dyn KeyResolver,
    ) -> Result<Incoming, CookieError> {
        let path = if cookie.path.starts_with('/') {
            cookie.path.clone()
        } else {
            ctx.def_path.clone()
        };
        let (domain, host_only) = domain_and_type(&ctx.host, &cookie.domain, resolver)?;

        // Max-Age takes precedence over Expires.
        let expires = if cookie.max_age < 0 {
            None
        } else if cookie.max_age > 0 {
            Some(
                Duration::try_seconds(cookie.max_age)
                    .and_then(|d| now.checked_add_signed(d))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            )
        } else {
            cookie.expires
        };
        let removal = cookie.max_age < 0 || expires.is_some_and(|t| t <= now);

        if removal {
            return Ok(Incoming::Remove {
                id: entry_id(&domain, &path, &cookie.name),
            });
        }

        Ok(Incoming::Store(Entry {
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            domain,
            host_only,
            path,
            secure: cookie.secure,
            http_only: cookie.http_only,
            same_site: cookie.same_site,
            expires,
            creation: now,
            last_access: now,
            seq_num: 0,
            cookie,
            key: ctx.key.clone(),
            host: ctx.host.clone(),
            def_path: ctx.def_path.clone(),
            url: ctx.url.clone(),
        }))
    }

    /// Identity within a submap: `domain;path;name`.
    pub fn id(&self) -> String {
        entry_id(&self.domain, &self.path, &self.name)
    }

    pub fn is_persistent(&self) -> bool {
        self.expires.is_some()
    }

    /// A persistent entry is dead once its expiry is not after `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|t| t <= now)
    }

    /// Whether this entry belongs on a request to `host` and `path`.
    pub fn should_send(&self, https: bool, host: &str, path: &str) -> bool {
        (https || !self.secure) && self.domain_match(host) && self.path_match(path)
    }

    /// Domain matching (RFC 6265 section 5.1.3), host-only aware.
    pub fn domain_match(&self, host: &str) -> bool {
        if self.domain == host {
            return true;
        }
        !self.host_only && has_dot_suffix(host, &self.domain)
    }

    /// Path matching (RFC 6265 section 5.1.4).
    pub fn path_match(&self, request_path: &str) -> bool {
        if request_path == self.path {
            return true;
        }
        if let Some(rest) = request_path.strip_prefix(self.path.as_str()) {
            return self.path.ends_with('/') || rest.starts_with('/');
        }
        false
    }

    /// The cookie reduced to what a request header carries.
    pub fn stripped(&self) -> Cookie {
        Cookie::new(self.name.clone(), self.value.clone())
    }
}

fn entry_id(domain: &str, path: &str, name: &str) -> String {
    format!("{};{};{}", domain, path, name)
}

/// Resolves the effective domain of a cookie and whether it is host-only.
fn domain_and_type(
    host: &str,
    domain: &str,
    resolver: &dyn KeyResolver,
) -> Result<(String, bool), CookieError> {
    if domain.is_empty() {
        return Ok((host.to_string(), true));
    }

    if is_ip(host) {
        // RFC 6265 is unclear here; only an exact match is allowed.
        if host != domain {
            return Err(CookieError::IllegalDomain);
        }
        return Ok((host.to_string(), true));
    }

    let domain = domain.strip_prefix('.').unwrap_or(domain);
    if domain.is_empty() || domain.starts_with('.') || domain.ends_with('.') || !domain.is_ascii() {
        return Err(CookieError::MalformedDomain);
    }
    let domain = domain.to_ascii_lowercase();

    if let Some(suffix) = resolver.public_suffix(&domain) {
        if !suffix.is_empty() && !has_dot_suffix(&domain, &suffix) {
            if host == domain {
                return Ok((host.to_string(), true));
            }
            return Err(CookieError::IllegalDomain);
        }
    }

    if host != domain && !has_dot_suffix(host, &domain) {
        return Err(CookieError::IllegalDomain);
    }

    Ok((domain, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::key::LastTwoLabels;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn ctx(host: &str, def_path: &str) -> UpsertContext {
        UpsertContext {
            key: LastTwoLabels.registrable_key(host),
            host: host.to_string(),
            def_path: def_path.to_string(),
            url: None,
        }
    }

    fn store(cookie: Cookie, ctx: &UpsertContext) -> Entry {
        match Entry::from_cookie(cookie, ctx, now(), &LastTwoLabels).unwrap() {
            Incoming::Store(e) => e,
            Incoming::Remove { id } => panic!("unexpected removal of {}", id),
        }
    }

    #[test]
    fn host_only_without_domain() {
        let e = store(Cookie::new("a", "1"), &ctx("www.example.com", "/docs"));
        assert!(e.host_only);
        assert_eq!(e.domain, "www.example.com");
        assert_eq!(e.path, "/docs");
        assert_eq!(e.id(), "www.example.com;/docs;a");
        assert!(e.domain_match("www.example.com"));
        assert!(!e.domain_match("sub.www.example.com"));
    }

    #[test]
    fn domain_cookie_matches_subdomains() {
        let mut c = Cookie::new("a", "1");
        c.domain = ".Example.com".into();
        c.path = "/".into();
        let e = store(c, &ctx("www.example.com", "/"));
        assert!(!e.host_only);
        assert_eq!(e.domain, "example.com");
        assert!(e.domain_match("example.com"));
        assert!(e.domain_match("deep.www.example.com"));
        assert!(!e.domain_match("notexample.com"));
    }

    #[test]
    fn foreign_or_malformed_domain_is_rejected() {
        let mut c = Cookie::new("a", "1");
        c.domain = "other.org".into();
        assert!(matches!(
            Entry::from_cookie(c, &ctx("www.example.com", "/"), now(), &LastTwoLabels),
            Err(CookieError::IllegalDomain)
        ));

        let mut c = Cookie::new("a", "1");
        c.domain = "example.com.".into();
        assert!(matches!(
            Entry::from_cookie(c, &ctx("www.example.com", "/"), now(), &LastTwoLabels),
            Err(CookieError::MalformedDomain)
        ));

        let mut c = Cookie::new("a", "1");
        c.domain = "10.0.0.2".into();
        assert!(matches!(
            Entry::from_cookie(c, &ctx("10.0.0.1", "/"), now(), &LastTwoLabels),
            Err(CookieError::IllegalDomain)
        ));
    }

    struct ComSuffix;

    impl KeyResolver for ComSuffix {
        fn registrable_key(&self, host: &str) -> String {
            LastTwoLabels.registrable_key(host)
        }

        fn public_suffix(&self, domain: &str) -> Option<String> {
            domain.ends_with("com").then(|| "com".to_string())
        }
    }

    #[test]
    fn public_suffix_domain_becomes_host_only_or_rejected() {
        let mut c = Cookie::new("a", "1");
        c.domain = "com".into();
        let ctx_com = UpsertContext { key: "com".into(), host: "com".into(), def_path: "/".into(), url: None };
        match Entry::from_cookie(c.clone(), &ctx_com, now(), &ComSuffix).unwrap() {
            Incoming::Store(e) => assert!(e.host_only),
            Incoming::Remove { .. } => panic!("expected store"),
        }
        assert!(matches!(
            Entry::from_cookie(c, &ctx("www.example.com", "/"), now(), &ComSuffix),
            Err(CookieError::IllegalDomain)
        ));
    }

    #[test]
    fn max_age_wins_over_expires() {
        let mut c = Cookie::new("a", "1");
        c.max_age = 60;
        c.expires = Some(now() - Duration::days(1));
        let e = store(c, &ctx("example.com", "/"));
        assert_eq!(e.expires, Some(now() + Duration::seconds(60)));
        assert!(e.is_persistent());
    }

    #[test]
    fn past_expiry_and_negative_max_age_remove() {
        let mut c = Cookie::new("a", "1");
        c.expires = Some(now());
        assert!(matches!(
            Entry::from_cookie(c, &ctx("example.com", "/"), now(), &LastTwoLabels).unwrap(),
            Incoming::Remove { .. }
        ));

        let mut c = Cookie::new("a", "1");
        c.max_age = -1;
        c.path = "/x".into();
        match Entry::from_cookie(c, &ctx("example.com", "/"), now(), &LastTwoLabels).unwrap() {
            Incoming::Remove { id } => assert_eq!(id, "example.com;/x;a"),
            Incoming::Store(_) => panic!("expected removal"),
        }
    }

    #[test]
    fn session_cookie_has_no_expiry() {
        let e = store(Cookie::new("a", "1"), &ctx("example.com", "/"));
        assert!(!e.is_persistent());
        assert!(!e.is_expired(now() + Duration::days(10_000)));
    }

    #[test]
    fn path_matching() {
        let mut c = Cookie::new("a", "1");
        c.path = "/docs".into();
        let e = store(c, &ctx("example.com", "/"));
        assert!(e.path_match("/docs"));
        assert!(e.path_match("/docs/"));
        assert!(e.path_match("/docs/web"));
        assert!(!e.path_match("/docsets"));
        assert!(!e.path_match("/"));

        let mut c = Cookie::new("a", "1");
        c.path = "/docs/".into();
        let e = store(c, &ctx("example.com", "/"));
        assert!(e.path_match("/docs/web"));
        assert!(!e.path_match("/docs"));
    }

    #[test]
    fn secure_cookies_need_https() {
        let mut c = Cookie::new("a", "1");
        c.secure = true;
        c.path = "/".into();
        let e = store(c, &ctx("example.com", "/"));
        assert!(e.should_send(true, "example.com", "/"));
        assert!(!e.should_send(false, "example.com", "/"));
    }
}
