//! Grouping keys and request canonicalization.
//!
//! Cookies are bucketed by a **registrable-domain key** so that all hosts of
//! one site share a submap. Computing that key properly needs a public suffix
//! list, which this crate does not ship: callers plug one in through
//! [`KeyResolver`]. [`LastTwoLabels`] is the fallback used when none is given.
use std::net::IpAddr;

use url::{Host, Url};

/// Maps a canonical host to the key its cookies are stored under.
pub trait KeyResolver: Send + Sync {
    /// Returns the registrable-domain key for `host`.
    fn registrable_key(&self, host: &str) -> String;

    /// Returns the public suffix of `domain`, if known.
    ///
    /// A `Domain` attribute naming a public suffix is only accepted as a
    /// host-only cookie for exactly that host.
    fn public_suffix(&self, _domain: &str) -> Option<String> {
        None
    }
}

/// Uses the last two labels of the host as its key (`a.b.example.com` → `example.com`).
#[derive(Debug, Default, Clone, Copy)]
pub struct LastTwoLabels;

impl KeyResolver for LastTwoLabels {
    fn registrable_key(&self, host: &str) -> String {
        if is_ip(host) {
            return host.to_string();
        }
        let last_dot = match host.rfind('.') {
            Some(i) if i > 0 => i,
            _ => return host.to_string(),
        };
        match host[..last_dot].rfind('.') {
            Some(prev_dot) => host[prev_dot + 1..].to_string(),
            None => host.to_string(),
        }
    }
}

impl<F> KeyResolver for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn registrable_key(&self, host: &str) -> String {
        self(host)
    }
}

/// Lowercased host without port or trailing dot. IPv6 hosts lose their brackets.
pub(crate) fn canonical_host(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(d) => Some(d.trim_end_matches('.').to_ascii_lowercase()),
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}

pub(crate) fn is_ip(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok()
}

/// Default cookie path for a request path (RFC 6265 section 5.1.4).
pub(crate) fn default_path(path: &str) -> String {
    if !path.starts_with('/') {
        return "/".to_string();
    }
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

/// `true` if `s` ends with `.suffix`.
pub(crate) fn has_dot_suffix(s: &str, suffix: &str) -> bool {
    s.len() > suffix.len() && s.ends_with(suffix) && s.as_bytes()[s.len() - suffix.len() - 1] == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_two_labels() {
        let r = LastTwoLabels;
        assert_eq!(r.registrable_key("www.example.com"), "example.com");
        assert_eq!(r.registrable_key("a.b.example.com"), "example.com");
        assert_eq!(r.registrable_key("example.com"), "example.com");
        assert_eq!(r.registrable_key("localhost"), "localhost");
        assert_eq!(r.registrable_key("10.0.0.1"), "10.0.0.1");
        assert_eq!(r.registrable_key("::1"), "::1");
    }

    #[test]
    fn closures_are_resolvers() {
        let r = |host: &str| format!("k:{}", host);
        assert_eq!(r.registrable_key("x.test"), "k:x.test");
        assert_eq!(r.public_suffix("x.test"), None);
    }

    #[test]
    fn canonical_host_strips_port_and_dot() {
        let u = Url::parse("https://WWW.Example.COM.:8443/x").unwrap();
        assert_eq!(canonical_host(&u).as_deref(), Some("www.example.com"));
        let u = Url::parse("http://[::1]:8080/").unwrap();
        assert_eq!(canonical_host(&u).as_deref(), Some("::1"));
    }

    #[test]
    fn default_path_cases() {
        assert_eq!(default_path(""), "/");
        assert_eq!(default_path("abc"), "/");
        assert_eq!(default_path("/"), "/");
        assert_eq!(default_path("/abc"), "/");
        assert_eq!(default_path("/abc/def"), "/abc");
        assert_eq!(default_path("/abc/def/"), "/abc/def");
    }

    #[test]
    fn dot_suffix() {
        assert!(has_dot_suffix("www.example.com", "example.com"));
        assert!(!has_dot_suffix("wwwexample.com", "example.com"));
        assert!(!has_dot_suffix("example.com", "example.com"));
    }
}
