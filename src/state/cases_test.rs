use super::*;
use crate::state::query::TimeRange;

fn case(id: &str, insurance: Option<&str>) -> RepairCase {
    serde_json::from_value(serde_json::json!({ "caseId": id, "insuranceName": insurance })).unwrap()
}

fn page_of(cases: Vec<RepairCase>, total_count: u64, page: u32, total_pages: u32) -> CasePage {
    CasePage { cases, total_count, page, limit: 50, total_pages }
}

#[test]
fn apply_page_normalizes_zero_pages() {
    let mut state = CaseListState::default();
    let echoed = state.apply_page(page_of(vec![], 0, 1, 0));
    assert_eq!(echoed, 1);
    assert_eq!(state.total_pages, 1);
    assert!(state.rows.is_empty());
}

#[test]
fn apply_error_clears_rows() {
    let mut state = CaseListState::default();
    state.apply_page(page_of(vec![case("1", None)], 1, 1, 1));
    state.apply_error(&ApiError::Malformed("missing field `cases`".into()));
    assert!(state.rows.is_empty());
    assert_eq!(state.total_count, 0);
    assert_eq!(state.total_pages, 1);
    let err = state.error.clone().unwrap();
    assert!(err.malformed);
    assert!(err.message.starts_with("Invalid data format received from API"));

    state.apply_page(page_of(vec![], 0, 1, 0));
    assert!(state.error.is_none());
}

#[test]
fn range_label_last_partial_page() {
    let state = CaseListState { total_count: 120, total_pages: 3, ..CaseListState::default() };
    assert_eq!(state.range_label(3, 50), "101–120 von 120");
    assert_eq!(state.range_label(1, 50), "1–50 von 120");
}

#[test]
fn range_label_empty() {
    assert_eq!(CaseListState::default().range_label(1, 25), "0 von 0");
}

#[test]
fn status_message_variants() {
    let mut state = CaseListState { total_count: 1, ..CaseListState::default() };
    let mut query = QueryState::default();
    assert_eq!(state.status_message(&query), "1 aktive Fall");

    state.total_count = 42;
    query.show_active_only = false;
    assert_eq!(state.status_message(&query), "42 Fälle");

    query.insurance = InsuranceFilter::Named("Haspa Versicherung".into());
    query.time_range = TimeRange::LastThreeMonths;
    query.search = "müller".into();
    assert_eq!(
        state.status_message(&query),
        "42 Fälle für Haspa Versicherung (Letzte 3 Monate) (gefiltert)"
    );
}

#[test]
fn insurance_options_derived_once_without_wertgarantie() {
    let mut state = CaseListState::default();
    state.apply_page(page_of(
        vec![
            case("1", Some("Haspa Versicherung")),
            case("2", Some("WERTGARANTIE")),
            case("3", Some("S-Mobilgeräteschutz")),
            case("4", Some("Haspa Versicherung")),
            case("5", None),
        ],
        5,
        1,
        1,
    ));
    assert!(state.derive_insurance_options(&QueryState::default()));
    let labels: Vec<&str> = state.insurance_options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Alle Versicherungen", "Haspa Versicherung", "S-Mobilgeräteschutz"]);
    assert_eq!(state.insurance_options[0].value, "_ALL_INSURANCES_");

    state.apply_page(page_of(vec![case("9", Some("Other"))], 1, 1, 1));
    assert!(!state.derive_insurance_options(&QueryState::default()));
    assert_eq!(state.insurance_options.len(), 3);
}

#[test]
fn insurance_options_skip_filtered_or_later_pages() {
    let mut state = CaseListState::default();
    state.apply_page(page_of(vec![case("1", Some("Haspa"))], 60, 2, 2));
    let query = QueryState { page: 2, ..QueryState::default() };
    assert!(!state.derive_insurance_options(&query));

    let query = QueryState { insurance: InsuranceFilter::Named("Haspa".into()), ..QueryState::default() };
    assert!(!state.derive_insurance_options(&query));
    assert!(state.insurance_options.is_empty());
}

#[test]
fn empty_message_explains_filter() {
    let state = CaseListState::default();
    let mut query = QueryState::default();
    assert_eq!(state.empty_message(&query), "Keine aktiven Reparaturfälle mit Versicherungsschutz gefunden.");

    query.insurance = InsuranceFilter::Named("Haspa".into());
    assert_eq!(state.empty_message(&query), "Keine Fälle für die ausgewählte Versicherung gefunden.");

    query.search = "4711".into();
    assert_eq!(state.empty_message(&query), "Keine Fälle für Ihre Suche \"4711\" gefunden.");
}
