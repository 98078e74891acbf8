//! Stateful client services behind the dashboard.
//!
//! ARCHITECTURE
//! ============
//! Services own state and background tasks; the `net` layer only moves
//! bytes. The controller and poller reach the backend through
//! [`backend::DashboardBackend`] so they can be driven by an in-memory
//! backend in tests.

pub mod backend;
pub mod case_list;
pub mod debounce;
pub mod session;
pub mod sync_poller;

#[cfg(test)]
pub(crate) mod test_helpers;
