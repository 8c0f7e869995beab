//! Navigation guard integration tests: public short-circuits, login and 403
//! redirects, permission-set caching across role switches, and supersession
//! of in-flight navigations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::Notify;

use shopadmin::guard::{Decision, NavGuard, NavOutcome, PermissionProvider, StaticPermissions};
use shopadmin::identity::{SessionStore, UserPayload};
use shopadmin::permissions::PermissionSet;
use shopadmin::routes::default_table;

fn active_user(role: &str) -> UserPayload {
    UserPayload {
        id: Some(1),
        username: Some("op".into()),
        full_name: Some("Operator".into()),
        role: Some(role.into()),
        is_active: Some(true),
        ..Default::default()
    }
}

fn guard_with(store: Arc<SessionStore>, paths: &[&str]) -> NavGuard<StaticPermissions> {
    let table = Arc::new(default_table().expect("default table"));
    let set = PermissionSet::from_paths(paths.iter().copied());
    NavGuard::new(store, table, StaticPermissions(set))
}

async fn decision(guard: &NavGuard<impl PermissionProvider>, path: &str) -> Decision {
    match guard.decide(path).await {
        NavOutcome::Done(nav) => nav.decision,
        NavOutcome::Stale => panic!("unexpected stale outcome for {}", path),
    }
}

#[tokio::test]
async fn permitted_path_with_active_identity_authorizes() {
    let store = Arc::new(SessionStore::new());
    store.set_user(active_user("staff"));
    let guard = guard_with(Arc::clone(&store), &["/product"]);
    assert_eq!(decision(&guard, "/product").await, Decision::Authorized);
}

#[tokio::test]
async fn staff_scenario_product_allowed_staff_forbidden() {
    let store = Arc::new(SessionStore::new());
    store.set_user(active_user("staff"));
    let guard = guard_with(Arc::clone(&store), &["/product"]);
    assert_eq!(decision(&guard, "/product").await, Decision::Authorized);
    assert_eq!(decision(&guard, "/staff").await, Decision::RedirectForbidden);
}

#[tokio::test]
async fn not_found_page_is_always_authorized() {
    let store = Arc::new(SessionStore::new());
    let guard = guard_with(Arc::clone(&store), &[]);
    assert_eq!(decision(&guard, "/404").await, Decision::Authorized);

    store.set_user(active_user("staff"));
    assert_eq!(decision(&guard, "/404").await, Decision::Authorized);
}

#[tokio::test]
async fn unmatched_path_lands_on_404_and_authorizes() {
    let store = Arc::new(SessionStore::new());
    let guard = guard_with(store, &[]);
    match guard.decide("/no/such/page").await {
        NavOutcome::Done(nav) => {
            assert_eq!(nav.route_name, "404");
            assert_eq!(nav.decision, Decision::Authorized);
        }
        NavOutcome::Stale => panic!("unexpected stale outcome"),
    }
}

#[tokio::test]
async fn protected_path_without_identity_redirects_to_login() {
    let store = Arc::new(SessionStore::new());
    let guard = guard_with(store, &["/product"]);
    assert_eq!(decision(&guard, "/product").await, Decision::RedirectLogin);
}

#[tokio::test]
async fn inactive_identity_is_treated_as_unauthenticated() {
    let store = Arc::new(SessionStore::new());
    let mut payload = active_user("staff");
    payload.is_active = Some(false);
    store.set_user(payload);
    let guard = guard_with(store, &["/product"]);
    assert_eq!(decision(&guard, "/product").await, Decision::RedirectLogin);
}

#[tokio::test]
async fn login_page_short_circuits_regardless_of_identity() {
    let store = Arc::new(SessionStore::new());
    let guard = guard_with(Arc::clone(&store), &[]);
    assert_eq!(decision(&guard, "/login").await, Decision::Authorized);
    store.set_user(active_user("staff"));
    assert_eq!(decision(&guard, "/login").await, Decision::Authorized);
}

#[tokio::test]
async fn param_route_authorizes_via_family_root() {
    let store = Arc::new(SessionStore::new());
    store.set_user(active_user("staff"));
    let guard = guard_with(store, &["/product"]);
    match guard.decide("/product/edit/3").await {
        NavOutcome::Done(nav) => {
            assert_eq!(nav.decision, Decision::Authorized);
            assert_eq!(nav.route_name, "product_edit");
            assert_eq!(nav.params, vec![("id".to_string(), "3".to_string())]);
        }
        NavOutcome::Stale => panic!("unexpected stale outcome"),
    }
}

struct CountingProvider {
    set: PermissionSet,
    fetches: Arc<AtomicUsize>,
}

impl PermissionProvider for CountingProvider {
    async fn fetch(&self) -> Result<PermissionSet> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.set.clone())
    }
}

#[tokio::test]
async fn permission_set_is_cached_until_role_switch() {
    let store = Arc::new(SessionStore::new());
    store.set_user(active_user("staff"));
    let table = Arc::new(default_table().unwrap());
    let fetches = Arc::new(AtomicUsize::new(0));
    let provider = CountingProvider {
        set: PermissionSet::from_paths(["/product", "/order"]),
        fetches: Arc::clone(&fetches),
    };
    let guard = NavGuard::new(Arc::clone(&store), table, provider);

    assert_eq!(decision(&guard, "/product").await, Decision::Authorized);
    assert_eq!(decision(&guard, "/order").await, Decision::Authorized);
    // Same session, same role: one fetch serves both navigations.
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    store.switch_role("admin");
    assert_eq!(decision(&guard, "/product").await, Decision::Authorized);
    assert_eq!(fetches.load(Ordering::SeqCst), 2, "role switch must refetch");
}

struct FailingProvider;

impl PermissionProvider for FailingProvider {
    async fn fetch(&self) -> Result<PermissionSet> {
        Err(anyhow!("permission service unavailable"))
    }
}

#[tokio::test]
async fn unreadable_permission_tree_fails_closed() {
    let store = Arc::new(SessionStore::new());
    store.set_user(active_user("staff"));
    let table = Arc::new(default_table().unwrap());
    let guard = NavGuard::new(store, table, FailingProvider);
    assert_eq!(decision(&guard, "/product").await, Decision::RedirectForbidden);
}

struct GatedProvider {
    gate: Arc<Notify>,
    set: PermissionSet,
}

impl PermissionProvider for GatedProvider {
    async fn fetch(&self) -> Result<PermissionSet> {
        self.gate.notified().await;
        Ok(self.set.clone())
    }
}

#[tokio::test]
async fn superseded_navigation_reports_stale() {
    let store = Arc::new(SessionStore::new());
    store.set_user(active_user("staff"));
    let table = Arc::new(default_table().unwrap());
    let gate = Arc::new(Notify::new());
    let guard = Arc::new(NavGuard::new(
        store,
        table,
        GatedProvider { gate: Arc::clone(&gate), set: PermissionSet::from_paths(["/product", "/order"]) },
    ));

    let first = {
        let guard = Arc::clone(&guard);
        tokio::spawn(async move { guard.decide("/product").await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let second = {
        let guard = Arc::clone(&guard);
        tokio::spawn(async move { guard.decide("/order").await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // Release both in-flight permission fetches.
    gate.notify_waiters();

    let first = first.await.expect("first navigation task");
    let second = second.await.expect("second navigation task");
    assert_eq!(first, NavOutcome::Stale, "older navigation must be abandoned");
    match second {
        NavOutcome::Done(nav) => assert_eq!(nav.decision, Decision::Authorized),
        NavOutcome::Stale => panic!("newest navigation must not be stale"),
    }
}
