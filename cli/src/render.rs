//! Plain-text rendering of dashboard state.

use std::fmt::Write;

use casedesk::format::{NOT_AVAILABLE, format_currency, format_date, format_timestamp_ms};
use casedesk::net::types::{RepairCase, UserDetails};
use casedesk::services::case_list::CaseListController;
use casedesk::state::query::{SortDirection, SortKey};
use casedesk::state::sync::SyncState;

const COLUMNS: [(SortKey, &str, usize); 7] = [
    (SortKey::InsuranceContractNumber, "Versicherungsnr.", 16),
    (SortKey::CaseNumber, "Fallnummer", 12),
    (SortKey::CustomerName, "Kunde", 22),
    (SortKey::ProductName, "Produkt", 22),
    (SortKey::Status, "Status", 14),
    (SortKey::InsuranceName, "Versicherung", 20),
    (SortKey::LastApiUpdate, "Letzte Änderung", 17),
];

fn or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(NOT_AVAILABLE)
}

/// Pad or cut `text` to exactly `width` characters.
fn cell(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{text}{}", " ".repeat(width - count))
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

fn row_cells(case: &RepairCase) -> [String; 7] {
    [
        or_na(case.insurance_contract_number.as_deref()).to_owned(),
        or_na(case.case_number.as_deref()).to_owned(),
        or_na(case.customer_name.as_deref()).to_owned(),
        or_na(case.product_name.as_deref()).to_owned(),
        or_na(case.status.as_deref()).to_owned(),
        or_na(case.insurance_name.as_deref()).to_owned(),
        format_date(case.last_api_update.as_deref()),
    ]
}

/// Case table with a sort marker on the active column.
#[must_use]
pub fn case_table(rows: &[RepairCase], sort: Option<(SortKey, SortDirection)>) -> String {
    let mut out = String::new();
    let header: Vec<String> = COLUMNS
        .iter()
        .map(|(key, title, width)| {
            let marker = match sort {
                Some((active, SortDirection::Ascending)) if active == *key => " ↑",
                Some((active, SortDirection::Descending)) if active == *key => " ↓",
                _ => "",
            };
            cell(&format!("{title}{marker}"), *width)
        })
        .collect();
    let _ = writeln!(out, "{}", header.join(" │ ").trim_end());
    let rule: Vec<String> = COLUMNS.iter().map(|(_, _, width)| "─".repeat(*width)).collect();
    let _ = writeln!(out, "{}", rule.join("─┼─"));

    for case in rows {
        let cells: Vec<String> = row_cells(case)
            .iter()
            .zip(COLUMNS.iter())
            .map(|(text, (_, _, width))| cell(text, *width))
            .collect();
        let _ = writeln!(out, "{}", cells.join(" │ ").trim_end());
    }
    out
}

/// Header, table (or empty notice) and pagination footer for the current page.
#[must_use]
pub fn case_list(ctl: &CaseListController) -> String {
    let state = ctl.state();
    let query = ctl.query();
    let mut out = String::new();
    let _ = writeln!(out, "{}", ctl.status_message());

    if let Some(err) = &state.error {
        let _ = writeln!(out, "Fehler beim Laden der Daten: {}", err.message);
        if err.malformed {
            let _ = writeln!(
                out,
                "Die Daten haben ein unerwartetes Format. Bitte führen Sie eine Synchronisierung durch."
            );
        }
        return out;
    }

    if state.rows.is_empty() {
        let _ = writeln!(out, "Keine Fälle gefunden");
        let _ = writeln!(out, "{}", state.empty_message(query));
        return out;
    }

    let sort_key = query.sort_key.unwrap_or(SortKey::LastApiUpdate);
    out.push_str(&case_table(&state.rows, Some((sort_key, query.sort_direction))));
    let _ = writeln!(
        out,
        "Seite {} von {} | {} | {} pro Seite",
        query.page,
        state.total_pages,
        ctl.range_label(),
        query.page_size.limit()
    );
    out
}

fn amount_with_currency(amount: Option<f64>, currency: Option<&str>) -> String {
    match amount {
        Some(value) => format!("{value:.2} {}", currency.unwrap_or_default()).trim_end().to_owned(),
        None => NOT_AVAILABLE.to_owned(),
    }
}

/// Full case detail with the dashboard's section headings.
#[must_use]
pub fn case_detail(case: &RepairCase) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Falldetails");
    let _ = writeln!(out, "Details für Fall-ID: {}", case.case_id);

    let sections: [(&str, Vec<(&str, String)>); 5] = [
        (
            "Versicherungsinformationen",
            vec![
                ("Versicherungsname", or_na(case.insurance_name.as_deref()).to_owned()),
                ("Vertragsnummer", or_na(case.insurance_contract_number.as_deref()).to_owned()),
                (
                    "Versicherung aktiv",
                    if case.insurance_is_active == Some(true) { "Ja" } else { "Nein" }.to_owned(),
                ),
                (
                    "Selbstbeteiligung",
                    amount_with_currency(case.insurance_deductible, case.currency.as_deref()),
                ),
                ("Regulierungsbetrag", format_currency(case.insurance_settlement_amount)),
            ],
        ),
        (
            "Kunden- & Fallinformationen",
            vec![
                ("Fallnummer", or_na(case.case_number.as_deref()).to_owned()),
                ("Kundennummer", or_na(case.customer_number.as_deref()).to_owned()),
                ("Kundenname", or_na(case.customer_name.as_deref()).to_owned()),
                ("Firma", or_na(case.customer_company_name.as_deref()).to_owned()),
                ("E-Mail", or_na(case.customer_email.as_deref()).to_owned()),
                ("Telefon", or_na(case.customer_phone_main.as_deref()).to_owned()),
                ("Stadt", or_na(case.customer_city.as_deref()).to_owned()),
                ("PLZ", or_na(case.customer_zip_code.as_deref()).to_owned()),
            ],
        ),
        (
            "Produktinformationen",
            vec![
                ("Produktname", or_na(case.product_name.as_deref()).to_owned()),
                ("Hersteller", or_na(case.manufacturer.as_deref()).to_owned()),
                ("Seriennummer", or_na(case.product_serial_number.as_deref()).to_owned()),
                ("Symptome/Fehlerbeschreibung", or_na(case.symptoms.as_deref()).to_owned()),
            ],
        ),
        (
            "Fallstatus & Service",
            vec![
                ("Status", or_na(case.status.as_deref()).to_owned()),
                ("Servicetyp", or_na(case.service_type.as_deref()).to_owned()),
                ("Garantie", or_na(case.warranty.as_deref()).to_owned()),
                ("Geschäftstelle", or_na(case.store_name.as_deref()).to_owned()),
                (
                    "Reparaturkosten gesamt",
                    amount_with_currency(case.total_repair_cost, case.currency.as_deref()),
                ),
            ],
        ),
        (
            "Zeitstempel",
            vec![
                ("Erfasst am", format_date(case.fetched_at.as_deref())),
                ("Letzte API Aktualisierung", format_date(case.last_api_update.as_deref())),
            ],
        ),
    ];

    for (title, fields) in sections {
        let _ = writeln!(out, "\n{title}");
        for (label, value) in fields {
            let _ = writeln!(out, "  {label}: {value}");
        }
    }
    out
}

/// Progress line for a running sync, or `None` when nothing is running.
#[must_use]
pub fn sync_line(sync: &SyncState) -> Option<String> {
    if !sync.is_running() {
        return None;
    }
    let progress = sync.progress()?;
    Some(format!("Synchronisierung: {}", progress.summary()))
}

#[must_use]
pub fn users_table(users: &[UserDetails]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} │ {} │ {} │ {} │ {}",
        cell("UID", 28),
        cell("E-Mail", 30),
        cell("Status", 10),
        cell("Erstellt", 20),
        "Letzte Anmeldung"
    );
    for user in users {
        let status = match (user.disabled, user.email_verified) {
            (true, _) => "deaktiviert",
            (false, true) => "verifiziert",
            (false, false) => "aktiv",
        };
        let _ = writeln!(
            out,
            "{} │ {} │ {} │ {} │ {}",
            cell(&user.uid, 28),
            cell(or_na(user.email.as_deref()), 30),
            cell(status, 10),
            cell(&format_timestamp_ms(user.metadata.creation_timestamp_ms), 20),
            format_timestamp_ms(user.metadata.last_sign_in_timestamp_ms)
        );
    }
    out
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
