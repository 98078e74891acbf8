use super::*;

#[test]
fn default_state_is_loading_and_signed_out() {
    let state = AuthState::default();
    assert!(state.loading);
    assert!(!state.is_signed_in());
}

#[test]
fn user_from_session_drops_tokens() {
    let session = Session {
        uid: "uid-1".into(),
        email: Some("admin@example.com".into()),
        id_token: "id".into(),
        refresh_token: "refresh".into(),
        expires_at: 1_700_000_000,
    };
    let user = AuthUser::from(&session);
    assert_eq!(user, AuthUser { uid: "uid-1".into(), email: Some("admin@example.com".into()) });

    let state = AuthState { user: Some(user), loading: false };
    assert!(state.is_signed_in());
}
