//! Session lifecycle against the mock site: sign-in, guards, server-side
//! expiry routed through the logout dispatcher, and sign-out.

#![allow(clippy::unwrap_used)]

use bep_client::session::keys;
use bep_client::{ApiError, GuardState, GuardView, SessionStorage, ToastLevel};
use bep_core::{Area, Locale, Message, Role, VideoSlot};
use bep_integration_tests::{Harness, MockSite, PASSWORD, account};

#[tokio::test]
async fn test_login_persists_identity_and_guard_admits_admin() {
    let site = MockSite::start(account(Role::Admin)).await;
    let h = Harness::new(&site);

    let user = h.office.login("chi-hoa", PASSWORD).await.unwrap();
    assert_eq!(user.role, Role::Admin);
    assert!(h.office.identity().is_authenticated());
    assert!(h.storage.get(keys::LOGIN_TIME).is_some());

    let mut guard = h.office.guard(Area::Admin);
    assert_eq!(guard.view(), GuardView::Loading);
    assert!(matches!(guard.resolve().await, GuardState::Authenticated(u) if u.username == "chi-hoa"));
    assert!(h.ui.routes().is_empty());
}

#[tokio::test]
async fn test_wrong_password_is_an_error_not_a_logout() {
    let site = MockSite::start(account(Role::Staff)).await;
    let h = Harness::new(&site);

    let err = h.office.login("lan", "wrong-password").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(h.ui.toasts().is_empty());
    assert!(h.ui.routes().is_empty());
    assert_eq!(h.office.client().dispatcher().subscriber_count(), 1);
}

#[tokio::test]
async fn test_guard_without_session_redirects_once() {
    let site = MockSite::start(account(Role::Admin)).await;
    let h = Harness::new(&site);

    let mut guard = h.office.guard(Area::Staff);
    assert_eq!(*guard.resolve().await, GuardState::Unauthenticated);
    assert_eq!(guard.view(), GuardView::Redirecting);

    // Settled: no second request, no second redirect.
    guard.resolve().await;
    assert_eq!(site.hits("/api/staff/me"), 1);
    assert_eq!(h.ui.routes(), vec!["/login".to_string()]);
    assert!(h.ui.toasts().is_empty());
}

#[tokio::test]
async fn test_staff_in_admin_area_sees_error_and_stays_signed_in() {
    let site = MockSite::start(account(Role::Staff)).await;
    let h = Harness::new(&site);
    h.office.login("lan", PASSWORD).await.unwrap();

    let mut guard = h.office.guard(Area::Admin);
    assert!(matches!(guard.resolve().await, GuardState::Failed(_)));
    assert!(matches!(guard.view(), GuardView::Error(m) if m.contains("Admin access required")));
    assert!(h.ui.routes().is_empty());
    assert!(h.office.identity().is_authenticated());

    let mut staff_guard = h.office.guard(Area::Staff);
    assert!(matches!(staff_guard.resolve().await, GuardState::Authenticated(_)));
}

#[tokio::test]
async fn test_revoked_session_clears_storage_and_redirects_after_toast() {
    let site = MockSite::start(account(Role::Admin)).await;
    let h = Harness::new(&site);
    h.office.login("chi-hoa", PASSWORD).await.unwrap();

    site.revoke_sessions();
    let activated = h.office.activate_video(VideoSlot::Hero).await.unwrap();
    assert!(activated.is_none());

    for key in keys::ALL {
        assert!(h.storage.get(key).is_none(), "{key} should be cleared");
    }
    assert_eq!(
        h.ui.toasts(),
        vec![(ToastLevel::Error, Message::SessionExpired.text(Locale::En))]
    );
    assert!(h.ui.wait_for_route("/login").await);

    // Already anonymous: a further 401 is silent.
    assert!(h.office.activate_video(VideoSlot::Hero).await.unwrap().is_none());
    assert_eq!(h.ui.toasts().len(), 1);
}

#[tokio::test]
async fn test_logout_clears_identity_and_goes_home() {
    let site = MockSite::start(account(Role::Staff)).await;
    let h = Harness::new(&site);
    h.office.login("lan", PASSWORD).await.unwrap();

    h.office.logout().await.unwrap();

    assert!(!h.office.identity().is_authenticated());
    assert_eq!(h.ui.routes(), vec!["/".to_string()]);
    assert_eq!(site.hits("/api/admin/logout"), 1);

    // The cookie was dropped with the session.
    let mut guard = h.office.guard(Area::Staff);
    assert_eq!(*guard.resolve().await, GuardState::Unauthenticated);
}
