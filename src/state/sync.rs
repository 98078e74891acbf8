//! Displayed sync status and its progress presentation.

use crate::format::format_elapsed;
use crate::net::types::{SyncKind, SyncStatus};

pub const STARTING_MESSAGE: &str = "Synchronisierung wird gestartet...";

/// Title and detail shown once a sync was accepted by the backend.
#[must_use]
pub fn started_notice(kind: SyncKind) -> (&'static str, &'static str) {
    match kind {
        SyncKind::Changed => (
            "Sync gestartet",
            "Die Synchronisierung läuft im Hintergrund. Die Daten werden automatisch aktualisiert.",
        ),
        SyncKind::All => (
            "Sync All gestartet",
            "Alle Fälle werden synchronisiert. Die API-Timestamp wird nur bei Änderungen aktualisiert.",
        ),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPhase {
    #[default]
    Idle,
    Polling,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    pub phase: SyncPhase,
    /// Last status the backend reported; only replaced by a newer one.
    pub status: Option<SyncStatus>,
}

impl SyncState {
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.phase == SyncPhase::Polling
    }

    /// Whether the progress bar should be shown.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.is_polling() || self.status.as_ref().is_some_and(|s| s.is_running)
    }

    #[must_use]
    pub fn progress(&self) -> Option<SyncProgress> {
        self.status.as_ref().map(SyncProgress::from)
    }
}

/// Progress numbers derived from one status report.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncProgress {
    pub processed: u64,
    pub total: u64,
    pub upserted: u64,
    pub skipped: u64,
    pub errors: u64,
    pub elapsed_seconds: Option<f64>,
}

impl From<&SyncStatus> for SyncProgress {
    fn from(status: &SyncStatus) -> Self {
        let stats = status.stats;
        Self {
            processed: stats.processed,
            total: stats.total_cases,
            upserted: stats.upserted,
            skipped: stats.skipped_no_change + stats.skipped_not_insurance,
            errors: stats.errors,
            elapsed_seconds: status.elapsed_seconds,
        }
    }
}

impl SyncProgress {
    /// Whole percent processed, capped at 100. Zero while the total is unknown.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.processed.min(self.total) * 100) / self.total;
        u8::try_from(pct).unwrap_or(100)
    }

    #[must_use]
    pub fn elapsed_label(&self) -> Option<String> {
        self.elapsed_seconds.map(format_elapsed)
    }

    /// One-line summary, e.g. `"120 / 480 (25%) | 2:05 | 3 übersprungen | 0 Fehler"`.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.total == 0 {
            return STARTING_MESSAGE.to_owned();
        }
        let mut line = format!("{} / {} ({}%)", self.processed, self.total, self.percent());
        if let Some(elapsed) = self.elapsed_label() {
            line.push_str(" | ");
            line.push_str(&elapsed);
        }
        line.push_str(&format!(" | {} übersprungen | {} Fehler", self.skipped, self.errors));
        line
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
