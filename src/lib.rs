//! # casedesk
//!
//! Client library for the repair-case dashboard backend.
//!
//! The crate contains the typed API client, the Firebase-backed session
//! provider, the case-list controller with its filter/sort/pagination state,
//! and the sync-status poller. `Dashboard` ties these together for the
//! lifetime of one view; the `cli` crate renders it in a terminal.

pub mod config;
pub mod dashboard;
pub mod format;
pub mod net;
pub mod services;
pub mod state;

pub use dashboard::{Dashboard, DashboardEvent, DashboardUpdate, SyncStartError};
