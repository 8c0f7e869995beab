//! Console bootstrap and session lifecycle: persisted-credential hydration,
//! login/logout, role switching, and guarded navigation, wired together from
//! explicitly-passed parts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::config::Config;
use crate::guard::{NavGuard, NavOutcome, PermissionProvider};
use crate::identity::SessionStore;
use crate::permissions::PermissionSet;
use crate::routes::{default_table, RouteTable};

/// Persisted bearer token, the cookie-hydration analog for a terminal console.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    token: String,
}

fn session_file(state_dir: &str) -> PathBuf { Path::new(state_dir).join("session.json") }

pub fn load_token(state_dir: &str) -> Option<String> {
    let raw = std::fs::read_to_string(session_file(state_dir)).ok()?;
    let p: PersistedSession = serde_json::from_str(&raw).ok()?;
    if p.token.is_empty() { None } else { Some(p.token) }
}

pub fn save_token(state_dir: &str, token: &str) -> Result<()> {
    std::fs::create_dir_all(state_dir).with_context(|| format!("creating state dir '{}'", state_dir))?;
    let raw = serde_json::to_string_pretty(&PersistedSession { token: token.to_string() })?;
    std::fs::write(session_file(state_dir), raw)?;
    Ok(())
}

pub fn clear_token(state_dir: &str) {
    let _ = std::fs::remove_file(session_file(state_dir));
}

/// Production permission source: the full permission tree from the backend,
/// flattened to the reachable-path set.
pub struct ApiPermissions {
    api: Arc<ApiClient>,
}

impl PermissionProvider for ApiPermissions {
    async fn fetch(&self) -> Result<PermissionSet> {
        let tree = self.api.get_all_permission_tree().await?;
        Ok(PermissionSet::from_tree(&tree))
    }
}

pub struct App {
    pub config: Config,
    pub api: Arc<ApiClient>,
    pub store: Arc<SessionStore>,
    pub guard: NavGuard<ApiPermissions>,
}

impl App {
    /// Boot flow: load persisted credentials, hydrate the session store,
    /// install the route table, construct the guard.
    pub async fn bootstrap(config: Config) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config.api_base)?);
        let store = Arc::new(SessionStore::new());

        if let Some(token) = load_token(&config.state_dir) {
            api.set_token(token);
            match api.get_user().await {
                Ok(payload) => {
                    if payload.is_active.unwrap_or(false) {
                        info!(target: "shopadmin", "session hydrated for {:?}", payload.username);
                        store.set_user(payload);
                    } else {
                        debug!(target: "shopadmin", "persisted session belongs to an inactive account, discarding");
                        api.clear_token();
                        clear_token(&config.state_dir);
                    }
                }
                Err(e) => {
                    debug!(target: "shopadmin", "persisted session rejected: {}", e);
                    api.clear_token();
                    clear_token(&config.state_dir);
                }
            }
        }

        let table: Arc<RouteTable> = Arc::new(default_table()?);
        let guard = NavGuard::new(
            Arc::clone(&store),
            Arc::clone(&table),
            ApiPermissions { api: Arc::clone(&api) },
        );
        Ok(Self { config, api, store, guard })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let resp = self
            .api
            .login(&json!({ "username": username, "password": password }))
            .await?;
        let token = extract_token(&resp).ok_or_else(|| anyhow!("login response carried no token"))?;
        self.api.set_token(token.clone());
        save_token(&self.config.state_dir, &token)?;
        let payload = self.api.get_user().await?;
        self.store.set_user(payload);
        info!(target: "shopadmin", "logged in as {}", username);
        Ok(())
    }

    /// Best-effort server-side logout, then local teardown. The API call's
    /// failure is swallowed: the local session is cleared regardless.
    pub async fn logout(&self) {
        let _ = self.api.logout().await;
        self.api.clear_token();
        clear_token(&self.config.state_dir);
        self.store.reset_user();
        self.guard.invalidate_permissions();
        info!(target: "shopadmin", "logged out");
    }

    /// Switch the active role on the server and mirror it in the store. The
    /// store bump moves the role generation, so the next navigation refetches
    /// the permission set.
    pub async fn switch_role(&self, role: &str) -> Result<()> {
        self.api.switch_current_role(role).await?;
        if !self.store.switch_role(role) {
            return Err(anyhow!("no identity to switch role on"));
        }
        Ok(())
    }

    pub async fn navigate(&self, path: &str) -> NavOutcome {
        let outcome = self.guard.decide(path).await;
        debug!(target: "shopadmin", "navigate {} -> {:?}", path, outcome.decision());
        outcome
    }
}

fn extract_token(resp: &Value) -> Option<String> {
    for candidate in [
        resp.get("token"),
        resp.get("access_token"),
        resp.get("data").and_then(|d| d.get("token")),
        resp.get("data").and_then(|d| d.get("access_token")),
    ] {
        if let Some(tok) = candidate.and_then(|v| v.as_str()) {
            if !tok.is_empty() {
                return Some(tok.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().to_str().unwrap();
        assert_eq!(load_token(state), None);
        save_token(state, "tok-123").unwrap();
        assert_eq!(load_token(state).as_deref(), Some("tok-123"));
        clear_token(state);
        assert_eq!(load_token(state), None);
    }

    #[test]
    fn empty_persisted_token_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().to_str().unwrap();
        save_token(state, "").unwrap();
        assert_eq!(load_token(state), None);
    }

    #[test]
    fn token_extraction_accepts_common_shapes() {
        assert_eq!(extract_token(&json!({"token": "a"})).as_deref(), Some("a"));
        assert_eq!(extract_token(&json!({"access_token": "b"})).as_deref(), Some("b"));
        assert_eq!(extract_token(&json!({"data": {"token": "c"}})).as_deref(), Some("c"));
        assert_eq!(extract_token(&json!({"data": {"access_token": "d"}})).as_deref(), Some("d"));
        assert_eq!(extract_token(&json!({"status": "ok"})), None);
    }
}
