//! Line commands of the live dashboard.
//!
//! Plain lines are search text. Lines starting with `:` are commands.

use casedesk::net::types::SyncKind;
use casedesk::state::query::{InsuranceFilter, PageSize, SortKey, TimeRange};

pub const HELP: &str = "\
Befehle:
  <text>                 Suche (leer = Suche löschen)
  :page N                Seite wechseln
  :limit 25|50|100|200   Fälle pro Seite
  :insurance NAME|all    Versicherung filtern
  :months 0|1|3|6|12     Zeitraum (0 = alle)
  :active on|off         nur aktive Fälle
  :sort SPALTE           sortieren (erneut = Richtung wechseln)
  :sync | :sync-all      Synchronisierung starten
  :refresh               neu laden
  :help                  diese Hilfe
  :quit                  beenden";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Search(String),
    Page(u32),
    Limit(PageSize),
    Insurance(InsuranceFilter),
    Months(TimeRange),
    Active(bool),
    Sort(SortKey),
    Sync(SyncKind),
    Refresh,
    Help,
    Quit,
}

/// Parse one stdin line.
///
/// # Errors
///
/// Returns a German message for unknown commands or bad arguments.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(command) = line.trim_start().strip_prefix(':') else {
        return Ok(Input::Search(line.to_owned()));
    };

    let (name, arg) = command
        .trim()
        .split_once(char::is_whitespace)
        .map_or((command.trim(), ""), |(name, arg)| (name, arg.trim()));

    match name {
        "page" => arg
            .parse()
            .map(Input::Page)
            .map_err(|_| format!("Ungültige Seite: '{arg}'")),
        "limit" => arg
            .parse()
            .ok()
            .and_then(PageSize::from_limit)
            .map(Input::Limit)
            .ok_or_else(|| format!("Ungültige Seitengröße: '{arg}' (25, 50, 100 oder 200)")),
        "insurance" => {
            if arg.is_empty() {
                return Err("Bitte eine Versicherung angeben (oder 'all').".to_owned());
            }
            let filter = if arg.eq_ignore_ascii_case("all") { InsuranceFilter::All } else { InsuranceFilter::from_value(arg) };
            Ok(Input::Insurance(filter))
        }
        "months" => arg
            .parse()
            .ok()
            .and_then(TimeRange::from_months)
            .map(Input::Months)
            .ok_or_else(|| format!("Ungültiger Zeitraum: '{arg}' (0, 1, 3, 6 oder 12)")),
        "active" => match arg {
            "on" | "ja" | "true" => Ok(Input::Active(true)),
            "off" | "nein" | "false" => Ok(Input::Active(false)),
            _ => Err(format!("Ungültiger Wert: '{arg}' (on oder off)")),
        },
        "sort" => SortKey::from_column(arg)
            .map(Input::Sort)
            .ok_or_else(|| format!("Unbekannte Spalte: '{arg}'")),
        "sync" => Ok(Input::Sync(SyncKind::Changed)),
        "sync-all" => Ok(Input::Sync(SyncKind::All)),
        "refresh" => Ok(Input::Refresh),
        "help" | "?" => Ok(Input::Help),
        "quit" | "q" | "exit" => Ok(Input::Quit),
        other => Err(format!("Unbekannter Befehl: ':{other}' (:help für Hilfe)")),
    }
}

#[cfg(test)]
#[path = "input_test.rs"]
mod tests;
