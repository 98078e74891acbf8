use super::*;

#[test]
fn format_date_missing() {
    assert_eq!(format_date(None), "N/A");
    assert_eq!(format_date(Some("  ")), "N/A");
}

#[test]
fn format_date_variants() {
    assert_eq!(format_date(Some("2024-03-01T10:15:00")), "01.03.2024, 10:15");
    assert_eq!(format_date(Some("2024-03-01 10:15:42.123456")), "01.03.2024, 10:15");
    assert_eq!(format_date(Some("2024-12-24T23:59:59+01:00")), "24.12.2024, 23:59");
    assert_eq!(format_date(Some("2024-03-01")), "01.03.2024, 00:00");
}

#[test]
fn format_date_invalid() {
    assert_eq!(format_date(Some("gestern")), "Invalid Date");
    assert_eq!(format_date(Some("2024-13-01T00:00:00")), "Invalid Date");
    assert_eq!(format_date(Some("2024-03-01x")), "Invalid Date");
}

#[test]
fn format_timestamp_ms_utc() {
    assert_eq!(format_timestamp_ms(Some(1_709_288_100_000)), "01.03.2024, 10:15:00");
    assert_eq!(format_timestamp_ms(Some(0)), "N/A");
    assert_eq!(format_timestamp_ms(None), "N/A");
}

#[test]
fn format_currency_grouping() {
    assert_eq!(format_currency(Some(0.0)), "0,00\u{a0}€");
    assert_eq!(format_currency(Some(50.0)), "50,00\u{a0}€");
    assert_eq!(format_currency(Some(1234.5)), "1.234,50\u{a0}€");
    assert_eq!(format_currency(Some(1_234_567.891)), "1.234.567,89\u{a0}€");
    assert_eq!(format_currency(Some(-99.9)), "-99,90\u{a0}€");
    assert_eq!(format_currency(None), "N/A");
}

#[test]
fn format_elapsed_minutes_seconds() {
    assert_eq!(format_elapsed(0.0), "0:00");
    assert_eq!(format_elapsed(59.9), "0:59");
    assert_eq!(format_elapsed(125.4), "2:05");
    assert_eq!(format_elapsed(-3.0), "0:00");
}
