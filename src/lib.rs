//! In-process cookie jar for HTTP clients.
//!
//! [`DefaultCookieJar`] stores cookies received in responses and hands back the
//! cookies for an outgoing request in RFC 6265 order. Its state can be saved
//! as JSON and restored after a restart, including from files written with
//! older record layouts.
//!
//! ```rust
//! use cookiejar::{Cookie, CookieJar, DefaultCookieJar};
//! use url::Url;
//!
//! let jar = DefaultCookieJar::new();
//! let url = Url::parse("https://www.example.com/account").unwrap();
//! jar.set_cookies(&url, vec![Cookie::parse_set_cookie("sid=42; Path=/; Max-Age=3600").unwrap()]);
//! assert_eq!(jar.get_request_cookies(&url).as_deref(), Some("sid=42"));
//!
//! let saved = jar.serialize_cookies_to_str().unwrap();
//! let restored = DefaultCookieJar::new();
//! restored
//!     .deserialize_cookies_from_str(&saved, jar.config().session_cookie_alive)
//!     .unwrap();
//! assert_eq!(restored.get_request_cookies(&url).as_deref(), Some("sid=42"));
//! ```
pub mod config;
pub mod cookies;
pub mod errors;

pub use config::JarConfig;
pub use cookies::{Cookie, CookieJar, DefaultCookieJar, PersistentCookieJar, SameSite};
pub use errors::CookieError;
