//! German display formatting for dates, money and durations.
//!
//! Backend timestamps are shown with the wall-clock time they carry; no
//! timezone conversion is applied.

use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

pub const NOT_AVAILABLE: &str = "N/A";
pub const INVALID_DATE: &str = "Invalid Date";

/// `2024-03-01T10:15:00` → `01.03.2024, 10:15`.
///
/// Missing or empty input gives `N/A`; unparseable input gives `Invalid Date`.
#[must_use]
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return NOT_AVAILABLE.to_owned();
    };
    parse_wall_clock(raw)
        .and_then(|dt| dt.format(format_description!("[day].[month].[year], [hour]:[minute]")).ok())
        .unwrap_or_else(|| INVALID_DATE.to_owned())
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS`
/// followed by anything (fractions, `Z`, offsets), which is ignored.
fn parse_wall_clock(raw: &str) -> Option<PrimitiveDateTime> {
    if let Some(head) = raw.get(..19) {
        let head = head.replacen(' ', "T", 1);
        if let Ok(dt) =
            PrimitiveDateTime::parse(&head, format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
        {
            return Some(dt);
        }
    }
    let date = raw.get(..10)?;
    if raw.len() > 10 && !raw[10..].starts_with(['T', ' ']) {
        return None;
    }
    Date::parse(date, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(Date::midnight)
}

/// Unix milliseconds → `01.03.2024, 10:15:00` (UTC); zero or missing gives `N/A`.
#[must_use]
pub fn format_timestamp_ms(ms: Option<i64>) -> String {
    let Some(ms) = ms.filter(|ms| *ms != 0) else {
        return NOT_AVAILABLE.to_owned();
    };
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .ok()
        .and_then(|dt| {
            dt.format(format_description!("[day].[month].[year], [hour]:[minute]:[second]"))
                .ok()
        })
        .unwrap_or_else(|| INVALID_DATE.to_owned())
}

/// `1234.5` → `1.234,50 €`; missing gives `N/A`.
#[must_use]
pub fn format_currency(amount: Option<f64>) -> String {
    let Some(amount) = amount.filter(|a| a.is_finite()) else {
        return NOT_AVAILABLE.to_owned();
    };

    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') { "-" } else { "" };
    format!("{sign}{grouped},{frac_part}\u{a0}€")
}

/// Elapsed seconds as `m:ss`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_elapsed(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds.floor() as u64 } else { 0 };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
