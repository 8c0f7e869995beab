use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::dprintln;

use super::principal::{Identity, RoleDescriptor, UserPayload};

/// Holder of the current operator identity. Explicitly owned and passed to the
/// navigation guard and session lifecycle rather than looked up ambiently;
/// create one per console instance and share it behind an `Arc`.
///
/// The role generation counter moves on every mutation that can change what
/// the identity is allowed to see, so permission caches keyed on it refetch
/// lazily instead of on every navigation.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<Option<Identity>>,
    role_gen: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self { Self::default() }

    /// Replace the stored identity wholesale with a normalized record.
    /// No partial merge; absent payload fields become empty defaults.
    pub fn set_user(&self, payload: UserPayload) {
        let ident = Identity::from_payload(payload);
        dprintln!("session.set user={:?} role={:?}", ident.username, ident.role);
        *self.inner.write() = Some(ident);
        self.role_gen.fetch_add(1, Ordering::SeqCst);
    }

    /// Clear back to the initial empty state. Every derived accessor
    /// subsequently returns `None`/empty defaults.
    pub fn reset_user(&self) {
        dprintln!("session.reset");
        *self.inner.write() = None;
        self.role_gen.fetch_add(1, Ordering::SeqCst);
    }

    /// Switch the active role. Updates `role` and `current_role` atomically
    /// under one write lock and records the role in `roles` if missing.
    /// Returns false when no identity is set.
    pub fn switch_role(&self, name: &str) -> bool {
        let mut guard = self.inner.write();
        let Some(ident) = guard.as_mut() else { return false };
        ident.role = Some(name.to_string());
        ident.current_role = RoleDescriptor::named(name);
        if !ident.roles.iter().any(|d| d.name == name) {
            ident.roles.push(RoleDescriptor::named(name));
        }
        drop(guard);
        self.role_gen.fetch_add(1, Ordering::SeqCst);
        dprintln!("session.switch_role name={}", name);
        true
    }

    /// Cheap snapshot of the current identity for guard evaluation.
    pub fn snapshot(&self) -> Option<Identity> { self.inner.read().clone() }

    pub fn is_logged_in(&self) -> bool { self.inner.read().is_some() }

    /// Monotonic counter bumped on set/reset/switch; permission caches key on it.
    pub fn role_generation(&self) -> u64 { self.role_gen.load(Ordering::SeqCst) }

    // Derived accessors: pure projections, safe defaults when unset.
    pub fn user_id(&self) -> Option<i64> { self.inner.read().as_ref().and_then(|u| u.id) }
    pub fn username(&self) -> Option<String> { self.inner.read().as_ref().and_then(|u| u.username.clone()) }
    pub fn nick_name(&self) -> Option<String> { self.inner.read().as_ref().and_then(|u| u.nick_name.clone()) }
    pub fn avatar(&self) -> Option<String> { self.inner.read().as_ref().and_then(|u| u.avatar.clone()) }
    pub fn email(&self) -> Option<String> { self.inner.read().as_ref().and_then(|u| u.email.clone()) }
    pub fn role(&self) -> Option<String> { self.inner.read().as_ref().and_then(|u| u.role.clone()) }
    pub fn is_active(&self) -> bool { self.inner.read().as_ref().map(|u| u.is_active).unwrap_or(false) }
    pub fn current_role(&self) -> Option<RoleDescriptor> { self.inner.read().as_ref().map(|u| u.current_role.clone()) }
    pub fn roles(&self) -> Vec<RoleDescriptor> { self.inner.read().as_ref().map(|u| u.roles.clone()).unwrap_or_default() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(role: &str) -> UserPayload {
        UserPayload {
            id: Some(7),
            username: Some("op".into()),
            email: Some("op@example.com".into()),
            full_name: Some("Operator".into()),
            role: Some(role.into()),
            is_active: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn set_then_accessors_project_identity() {
        let store = SessionStore::new();
        store.set_user(payload("admin"));
        assert_eq!(store.user_id(), Some(7));
        assert_eq!(store.username().as_deref(), Some("op"));
        assert_eq!(store.nick_name().as_deref(), Some("Operator"));
        assert_eq!(store.email().as_deref(), Some("op@example.com"));
        assert_eq!(store.role().as_deref(), Some("admin"));
        assert!(store.is_active());
        assert_eq!(store.current_role().map(|r| r.name).as_deref(), Some("admin"));
        assert_eq!(store.roles(), vec![RoleDescriptor::named("admin")]);
    }

    #[test]
    fn reset_returns_empty_defaults() {
        let store = SessionStore::new();
        store.set_user(payload("admin"));
        store.reset_user();
        assert_eq!(store.user_id(), None);
        assert_eq!(store.username(), None);
        assert_eq!(store.nick_name(), None);
        assert_eq!(store.avatar(), None);
        assert_eq!(store.email(), None);
        assert_eq!(store.role(), None);
        assert!(!store.is_active());
        assert_eq!(store.current_role(), None);
        assert!(store.roles().is_empty());
    }

    #[test]
    fn switch_role_updates_both_fields_and_generation() {
        let store = SessionStore::new();
        store.set_user(payload("staff"));
        let gen = store.role_generation();
        assert!(store.switch_role("admin"));
        assert_eq!(store.role().as_deref(), Some("admin"));
        assert_eq!(store.current_role().map(|r| r.name).as_deref(), Some("admin"));
        assert!(store.roles().iter().any(|d| d.name == "admin"));
        assert!(store.roles().iter().any(|d| d.name == "staff"));
        assert!(store.role_generation() > gen);
    }

    #[test]
    fn switch_role_without_identity_is_a_no_op() {
        let store = SessionStore::new();
        assert!(!store.switch_role("admin"));
        assert_eq!(store.role(), None);
    }
}
