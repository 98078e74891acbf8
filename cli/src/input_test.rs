use super::*;

#[test]
fn plain_lines_are_search_text() {
    assert_eq!(parse_input("müller\n"), Ok(Input::Search("müller".into())));
    assert_eq!(parse_input(""), Ok(Input::Search(String::new())));
}

#[test]
fn page_and_limit() {
    assert_eq!(parse_input(":page 3"), Ok(Input::Page(3)));
    assert_eq!(parse_input(":limit 200"), Ok(Input::Limit(PageSize::Max)));
    assert!(parse_input(":limit 30").is_err());
    assert!(parse_input(":page x").is_err());
}

#[test]
fn insurance_names_keep_spaces() {
    assert_eq!(
        parse_input(":insurance Haspa Versicherung"),
        Ok(Input::Insurance(InsuranceFilter::Named("Haspa Versicherung".into())))
    );
    assert_eq!(parse_input(":insurance all"), Ok(Input::Insurance(InsuranceFilter::All)));
    assert!(parse_input(":insurance").is_err());
}

#[test]
fn months_active_sort() {
    assert_eq!(parse_input(":months 6"), Ok(Input::Months(TimeRange::LastSixMonths)));
    assert!(parse_input(":months 2").is_err());
    assert_eq!(parse_input(":active off"), Ok(Input::Active(false)));
    assert_eq!(parse_input(":sort customerName"), Ok(Input::Sort(SortKey::CustomerName)));
    assert!(parse_input(":sort symptoms").is_err());
}

#[test]
fn bare_commands() {
    assert_eq!(parse_input(":sync"), Ok(Input::Sync(SyncKind::Changed)));
    assert_eq!(parse_input(":sync-all"), Ok(Input::Sync(SyncKind::All)));
    assert_eq!(parse_input("  :quit "), Ok(Input::Quit));
    assert_eq!(parse_input(":refresh"), Ok(Input::Refresh));
    assert!(parse_input(":frobnicate").unwrap_err().contains(":help"));
}
