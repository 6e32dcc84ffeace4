//! Cookie store infrastructure.
//!
//! A **cookie store** is the durable home of a jar's state. It knows how to
//! write a [`DefaultCookieJar`] somewhere and how to read it back, using the
//! jar's own persistence codec, so every backend stores the same records.
//!
//! This module exports two implementations:
//! - [`JsonCookieStore`]: one JSON file on disk.
//! - [`InMemoryCookieStore`]: keeps the serialized text in memory (tests,
//!   private sessions).
//!
//! Stores are usually not called directly: wrap the jar in a
//! [`PersistentCookieJar`](crate::cookies::PersistentCookieJar) and every
//! mutation is persisted.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use cookiejar::cookies::{CookieStore, DefaultCookieJar, JsonCookieStore};
//!
//! # fn main() -> anyhow::Result<()> {
//! let jar = DefaultCookieJar::new();
//! let store = JsonCookieStore::new("cookies.json".into());
//! store.load_into(&jar)?;
//! // ... use the jar ...
//! store.persist(&jar)?;
//! # Ok(()) }
//! ```
mod in_memory;
mod json;

use std::sync::Arc;

use anyhow::Result;

use crate::cookies::cookie_jar::DefaultCookieJar;

pub use in_memory::InMemoryCookieStore;
pub use json::JsonCookieStore;

/// A handle to a cookie store trait.
pub type CookieStoreHandle = Arc<dyn CookieStore>;

/// Durable storage for the state of one jar.
///
/// Implementations must be `Send + Sync` and safe for concurrent use.
pub trait CookieStore: Send + Sync {
    /// Restores the stored state into `jar`.
    ///
    /// Session cookies are filtered with the jar's configured
    /// `session_cookie_alive`. An empty store leaves `jar` untouched.
    fn load_into(&self, jar: &DefaultCookieJar) -> Result<()>;

    /// Replaces the stored state with the current state of `jar`.
    fn persist(&self, jar: &DefaultCookieJar) -> Result<()>;

    /// Removes all stored state. Idempotent.
    fn clear(&self) -> Result<()>;
}
