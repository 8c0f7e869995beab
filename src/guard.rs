//! Navigation guard: decides whether a navigation to a given path is
//! authorized for the current identity, falling back to the login or 403
//! routes. Dependencies are passed in explicitly; the guard holds no ambient
//! global state.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::identity::SessionStore;
use crate::permissions::{PermissionCache, PermissionSet};
use crate::routes::{Resolved, RouteTable};

/// Terminal states of one navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Authorized,
    RedirectLogin,
    RedirectForbidden,
}

/// Outcome record for a finished navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub route_name: String,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub decision: Decision,
}

/// A navigation superseded by a newer one reports `Stale`; callers discard it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Done(Navigation),
    Stale,
}

impl NavOutcome {
    pub fn decision(&self) -> Option<Decision> {
        match self {
            NavOutcome::Done(nav) => Some(nav.decision),
            NavOutcome::Stale => None,
        }
    }
}

/// Source of the permission tree for the active identity. The production
/// implementation fetches it over the REST API; tests supply a fixed set.
pub trait PermissionProvider: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<PermissionSet>> + Send;
}

pub struct NavGuard<P: PermissionProvider> {
    store: Arc<SessionStore>,
    table: Arc<RouteTable>,
    provider: P,
    cache: PermissionCache,
    // Monotonic navigation counter; a decision whose ticket is no longer
    // current when its permission check resolves is stale.
    epoch: AtomicU64,
}

impl<P: PermissionProvider> NavGuard<P> {
    pub fn new(store: Arc<SessionStore>, table: Arc<RouteTable>, provider: P) -> Self {
        Self { store, table, provider, cache: PermissionCache::default(), epoch: AtomicU64::new(0) }
    }

    pub fn table(&self) -> &RouteTable { &self.table }

    /// Drop the cached reachable-path set (logout, external permission edits).
    pub fn invalidate_permissions(&self) { self.cache.invalidate(); }

    /// Evaluate one navigation attempt. Transition order:
    /// unmatched -> 404 (public), public routes short-circuit, missing or
    /// inactive identity redirects to login, then the target is checked
    /// against the cached reachable-path set.
    pub async fn decide(&self, path: &str) -> NavOutcome {
        let ticket = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let (route, params) = match self.table.resolve(path) {
            Resolved::Matched { route, params } => (route, params),
            Resolved::NotFound(route) => (route, Vec::new()),
        };

        if route.is_public() {
            return self.finish(route.name(), path, params, Decision::Authorized);
        }

        let Some(ident) = self.store.snapshot() else {
            return self.finish(route.name(), path, params, Decision::RedirectLogin);
        };
        if !ident.is_active {
            debug!(target: "shopadmin", "guard: inactive identity treated as unauthenticated");
            return self.finish(route.name(), path, params, Decision::RedirectLogin);
        }

        let generation = self.store.role_generation();
        let set = match self.cache.get(generation) {
            Some(set) => set,
            None => match self.provider.fetch().await {
                Ok(set) => self.cache.put(generation, set),
                Err(e) => {
                    // Fail closed: an unreadable permission tree authorizes nothing.
                    warn!(target: "shopadmin", "guard: permission fetch failed: {}", e);
                    self.cache.invalidate();
                    if self.epoch.load(Ordering::SeqCst) != ticket {
                        return NavOutcome::Stale;
                    }
                    return self.finish(route.name(), path, params, Decision::RedirectForbidden);
                }
            },
        };

        if self.epoch.load(Ordering::SeqCst) != ticket {
            return NavOutcome::Stale;
        }

        // Concrete paths authorize against the matched route's pattern, with
        // the family root as fallback for menu entries that only list the
        // family (e.g. `/product` covering `/product/edit/:id`).
        let allowed = set.contains(route.path()) || set.contains(&route.family_root());
        let decision = if allowed { Decision::Authorized } else { Decision::RedirectForbidden };
        self.finish(route.name(), path, params, decision)
    }

    fn finish(&self, route_name: &str, path: &str, params: Vec<(String, String)>, decision: Decision) -> NavOutcome {
        debug!(target: "shopadmin", "guard: {} -> {:?} (route {})", path, decision, route_name);
        NavOutcome::Done(Navigation {
            route_name: route_name.to_string(),
            path: path.to_string(),
            params,
            decision,
        })
    }
}

/// Fixed permission set, for tests and offline operation.
pub struct StaticPermissions(pub PermissionSet);

impl PermissionProvider for StaticPermissions {
    async fn fetch(&self) -> Result<PermissionSet> { Ok(self.0.clone()) }
}
