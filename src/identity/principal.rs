use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A role name plus whatever extra attributes the backend attaches to it.
/// Order of roles is irrelevant; they are treated as a set for authorization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub attrs: serde_json::Map<String, Value>,
}

impl RoleDescriptor {
    pub fn named<S: Into<String>>(name: S) -> Self { Self { name: name.into(), attrs: Default::default() } }
}

/// Raw identity payload as the auth provider returns it. Every field is
/// optional: malformed payloads degrade to empty defaults rather than erroring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default, rename = "nickName")]
    pub nick_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    // Older identity shape: explicit role structures
    #[serde(default)]
    pub roles: Option<Vec<RoleDescriptor>>,
    #[serde(default, rename = "currentRole")]
    pub current_role: Option<RoleDescriptor>,
}

/// Normalized identity record. Built once in `SessionStore::set_user`; the
/// rest of the console only ever sees this shape, insulating it from
/// auth-payload schema drift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub nick_name: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub current_role: RoleDescriptor,
    pub roles: Vec<RoleDescriptor>,
}

impl Identity {
    /// Normalize a raw payload. `nick_name` prefers `full_name`; the legacy
    /// `roles`/`currentRole` structures are synthesized from `role` when the
    /// payload does not carry them, and `roles` always ends up containing an
    /// entry for `role`.
    pub fn from_payload(u: UserPayload) -> Self {
        let role = u.role.clone();
        let nick_name = match u.full_name.as_deref() {
            Some(s) if !s.is_empty() => u.full_name.clone(),
            _ => u.nick_name.clone(),
        };
        let current_role = u
            .current_role
            .unwrap_or_else(|| RoleDescriptor::named(role.clone().unwrap_or_default()));
        let mut roles = u.roles.unwrap_or_default();
        if let Some(r) = role.as_deref() {
            if roles.is_empty() || !roles.iter().any(|d| d.name == r) {
                roles.push(RoleDescriptor::named(r));
            }
        }
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            nick_name,
            avatar: u.avatar,
            role,
            is_active: u.is_active.unwrap_or(false),
            created_at: u.created_at,
            updated_at: u.updated_at,
            current_role,
            roles,
        }
    }
}
