//! Cookies: [`CookieJar`], persistence and [`CookieStore`] backends.

mod cookie_jar;
mod cookies;
mod date;
mod entry;
mod key;
mod persistence;
mod persistent_cookie_jar;
mod same_site;
mod session_policy;
mod store;

pub use cookies::Cookie;
pub use cookies::CookieJarHandle;

pub use cookie_jar::CookieJar;
pub use cookie_jar::DefaultCookieJar;
pub use cookie_jar::UpsertOutcome;
pub use persistent_cookie_jar::PersistentCookieJar;

pub use date::parse_date_string;
pub use entry::{Entry, UpsertContext};
pub use key::{KeyResolver, LastTwoLabels};
pub use same_site::SameSite;
pub use session_policy::SessionCookiePolicy;

pub use persistence::{LegacyUrl, PersistenceItem, PersistenceItemV0, PersistenceItemV1, PersistenceRecord};

pub use store::CookieStore;
pub use store::CookieStoreHandle;
pub use store::InMemoryCookieStore;
pub use store::JsonCookieStore;
