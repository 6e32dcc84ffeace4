//! `SameSite` cookie attribute.
//!
//! Parsing is permissive: anything that is not recognizably `lax`, `strict`
//! or `none` becomes [`SameSite::Default`] instead of an error.
use std::fmt;

use serde::{Deserialize, Serialize};

/// SameSite mode of a cookie.
///
/// Serialized as its integer wire value (`0..=4`), which keeps stored cookie
/// records compatible with existing cookie files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum SameSite {
    /// Attribute never seen.
    #[default]
    Unset,
    /// Attribute present without a recognized value.
    Default,
    Lax,
    Strict,
    None,
}

impl SameSite {
    /// Converts an attribute fragment such as `SameSite=Lax` into a mode.
    ///
    /// The part after the first `=` is compared case-insensitively. Empty or
    /// malformed input yields [`SameSite::Default`].
    pub fn from_attribute(attr: &str) -> Self {
        match attr.split('=').nth(1) {
            Some(value) => Self::from_value(value),
            None => SameSite::Default,
        }
    }

    /// Converts a bare attribute value (`Lax`, `strict`, ...) into a mode.
    pub fn from_value(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("lax") {
            SameSite::Lax
        } else if value.eq_ignore_ascii_case("strict") {
            SameSite::Strict
        } else if value.eq_ignore_ascii_case("none") {
            SameSite::None
        } else {
            SameSite::Default
        }
    }

    /// Lowercase attribute value, or `""` for the unnamed modes.
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "lax",
            SameSite::Strict => "strict",
            SameSite::None => "none",
            SameSite::Unset | SameSite::Default => "",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SameSite> for u8 {
    fn from(mode: SameSite) -> u8 {
        match mode {
            SameSite::Unset => 0,
            SameSite::Default => 1,
            SameSite::Lax => 2,
            SameSite::Strict => 3,
            SameSite::None => 4,
        }
    }
}

impl From<u8> for SameSite {
    fn from(v: u8) -> Self {
        match v {
            0 => SameSite::Unset,
            2 => SameSite::Lax,
            3 => SameSite::Strict,
            4 => SameSite::None,
            _ => SameSite::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_values_are_case_insensitive() {
        assert_eq!(SameSite::from_attribute("SameSite=Lax"), SameSite::Lax);
        assert_eq!(SameSite::from_attribute("samesite=STRICT"), SameSite::Strict);
        assert_eq!(SameSite::from_attribute("SameSite=none"), SameSite::None);
    }

    #[test]
    fn unknown_or_malformed_input_is_default_mode() {
        assert_eq!(SameSite::from_attribute(""), SameSite::Default);
        assert_eq!(SameSite::from_attribute("SameSite=bogus"), SameSite::Default);
        assert_eq!(SameSite::from_attribute("SameSite"), SameSite::Default);
        assert_eq!(SameSite::from_attribute("SameSite="), SameSite::Default);
    }

    #[test]
    fn as_str_inverts_named_modes() {
        for mode in [SameSite::Lax, SameSite::Strict, SameSite::None] {
            let attr = format!("SameSite={}", mode.as_str());
            assert_eq!(SameSite::from_attribute(&attr), mode);
        }
        assert_eq!(SameSite::Default.as_str(), "");
        assert_eq!(SameSite::Unset.to_string(), "");
    }

    #[test]
    fn wire_value_is_an_integer() {
        assert_eq!(serde_json::to_string(&SameSite::Strict).unwrap(), "3");
        let mode: SameSite = serde_json::from_str("2").unwrap();
        assert_eq!(mode, SameSite::Lax);
        let unknown: SameSite = serde_json::from_str("42").unwrap();
        assert_eq!(unknown, SameSite::Default);
    }
}
