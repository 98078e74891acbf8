use super::*;

use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_guard() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// # Safety
/// Callers must hold [`env_guard`] so no other test reads the environment.
unsafe fn clear_desk_env() {
    unsafe {
        std::env::remove_var("CASEDESK_API_URL");
        std::env::remove_var("FIREBASE_API_KEY");
        std::env::remove_var("CASEDESK_IDENTITY_URL");
        std::env::remove_var("CASEDESK_SECURE_TOKEN_URL");
        std::env::remove_var("CASEDESK_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("CASEDESK_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("CASEDESK_SYNC_POLL_MS");
        std::env::remove_var("CASEDESK_REFETCH_DELAY_MS");
        std::env::remove_var("CASEDESK_SEARCH_DEBOUNCE_MS");
        std::env::remove_var("CASEDESK_ADMIN_UIDS");
        std::env::set_var("CASEDESK_SESSION_FILE", "/tmp/casedesk-test/session.json");
    }
}

#[test]
fn from_env_defaults() {
    let _env = env_guard();
    unsafe { clear_desk_env() };

    let cfg = DeskConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, DEFAULT_API_URL);
    assert!(cfg.firebase.is_none());
    assert_eq!(cfg.timeouts, HttpTimeouts::default());
    assert_eq!(cfg.timings, DashboardTimings::default());
    assert_eq!(cfg.timings.search_debounce, Duration::from_millis(300));
    assert!(cfg.admin_uids.is_empty());
    assert_eq!(cfg.session_file, PathBuf::from("/tmp/casedesk-test/session.json"));
}

#[test]
fn from_env_parses_overrides() {
    let _env = env_guard();
    unsafe {
        clear_desk_env();
        std::env::set_var("CASEDESK_API_URL", "https://api.example.test/");
        std::env::set_var("FIREBASE_API_KEY", " key-123 ");
        std::env::set_var("CASEDESK_IDENTITY_URL", "http://localhost:9099/identitytoolkit.googleapis.com/v1/");
        std::env::set_var("CASEDESK_SYNC_POLL_MS", "500");
        std::env::set_var("CASEDESK_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("CASEDESK_ADMIN_UIDS", "uid-a, uid-b,,");
    }

    let cfg = DeskConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, "https://api.example.test");
    let firebase = cfg.firebase.clone().expect("firebase configured");
    assert_eq!(firebase.api_key, "key-123");
    assert_eq!(firebase.identity_url, "http://localhost:9099/identitytoolkit.googleapis.com/v1");
    assert_eq!(firebase.secure_token_url, DEFAULT_SECURE_TOKEN_URL);
    assert_eq!(cfg.timings.sync_poll, Duration::from_millis(500));
    assert_eq!(cfg.timeouts.request_secs, 42);
    assert_eq!(cfg.admin_uids, vec!["uid-a".to_owned(), "uid-b".to_owned()]);
    assert!(cfg.is_admin("uid-b"));
    assert!(!cfg.is_admin("uid-c"));

    unsafe { clear_desk_env() };
}

#[test]
fn from_env_rejects_non_http_url() {
    let _env = env_guard();
    unsafe {
        clear_desk_env();
        std::env::set_var("CASEDESK_API_URL", "ftp://example.test");
    }

    let err = DeskConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "CASEDESK_API_URL", .. }));

    unsafe { clear_desk_env() };
}

#[test]
fn blank_firebase_key_disables_auth() {
    let _env = env_guard();
    unsafe {
        clear_desk_env();
        std::env::set_var("FIREBASE_API_KEY", "   ");
    }

    let cfg = DeskConfig::from_env().unwrap();
    assert!(cfg.firebase.is_none());

    unsafe { clear_desk_env() };
}

#[test]
fn parse_base_url_strips_trailing_slashes() {
    assert_eq!(parse_base_url("X", "http://host:8000//").unwrap(), "http://host:8000");
}

#[test]
fn parse_uid_list_skips_blanks() {
    assert!(parse_uid_list(None).is_empty());
    assert_eq!(parse_uid_list(Some(" a ,b")), vec!["a".to_owned(), "b".to_owned()]);
}

#[test]
fn env_parse_invalid_returns_default() {
    unsafe { std::env::set_var("__CASEDESK_TEST_EP_INVALID__", "soon") };
    let val: u64 = env_parse("__CASEDESK_TEST_EP_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__CASEDESK_TEST_EP_INVALID__") };
}
