//! Parsing of legacy cookie expiry strings.
//!
//! Servers have sent `Expires` in many historical formats. Zone abbreviations
//! (`GMT`, `MST`, ...) are skipped and the time is read as UTC.
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

use crate::errors::CookieError;

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// A layout, whether it starts with a weekday name, and whether its year has
/// two digits.
struct Layout {
    format: &'static str,
    weekday: bool,
    short_year: bool,
}

const fn layout(format: &'static str, weekday: bool, short_year: bool) -> Layout {
    Layout {
        format,
        weekday,
        short_year,
    }
}

/// Layouts tried after RFC 3339, in order.
///
/// The weekday name is matched by [`strip_weekday`] and never checked against
/// the date. Two digit years go first: `%Y` would also accept `06`.
const LAYOUTS: &[Layout] = &[
    // RFC 850
    layout(", %d-%b-%y %H:%M:%S %Z", true, true),
    layout(", %e-%b-%y %H:%M:%S %Z", true, true),
    // RFC 1123
    layout(", %d %b %Y %H:%M:%S %Z", true, false),
    layout(", %e %b %Y %H:%M:%S %Z", true, false),
    layout(", %d-%b-%Y %H:%M:%S %Z", true, false),
    layout(", %e-%b-%Y %H:%M:%S %Z", true, false),
    // RFC 822
    layout("%d %b %y %H:%M %Z", false, true),
    // ctime
    layout(" %b %e %H:%M:%S %Z %Y", true, false),
];

/// Splits off a leading three letter weekday name, in any case.
fn strip_weekday(text: &str) -> Option<&str> {
    let name = text.get(..3)?;
    WEEKDAYS
        .iter()
        .any(|day| name.eq_ignore_ascii_case(day))
        .then(|| &text[3..])
}

fn parse_layout(text: &str, layout: &Layout) -> Option<NaiveDateTime> {
    let text = if layout.weekday { strip_weekday(text)? } else { text };
    let parsed = NaiveDateTime::parse_from_str(text, layout.format).ok()?;
    // Two digit years from 69 on are 19xx; chrono starts that window at 70.
    if layout.short_year && parsed.year() == 2069 {
        return parsed.with_year(1969);
    }
    Some(parsed)
}

/// Parses `text` with the first matching known date layout.
pub fn parse_date_string(text: &str) -> Result<DateTime<Utc>, CookieError> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Ok(t.with_timezone(&Utc));
    }

    LAYOUTS
        .iter()
        .find_map(|layout| parse_layout(text, layout))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CookieError::DateParse(text.to_string()))
}
