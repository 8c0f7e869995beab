//! Flat REST bindings for the admin backend: each call is a single
//! verb+path+payload triple. Per-call flags mirror the console's policy:
//! `need_token` attaches the bearer token, `need_tip` decides whether a
//! failure is logged for the operator or kept quiet.

use parking_lot::RwLock;
use reqwest::{Method, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::identity::UserPayload;
use crate::permissions::PermissionNode;

#[derive(Debug, Clone, Copy)]
pub struct CallOpts {
    pub need_token: bool,
    pub need_tip: bool,
}

impl Default for CallOpts {
    fn default() -> Self { Self { need_token: true, need_tip: true } }
}

impl CallOpts {
    pub fn public() -> Self { Self { need_token: false, need_tip: true } }
    pub fn quiet() -> Self { Self { need_token: true, need_tip: false } }
}

pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(base: &str) -> AppResult<Self> {
        let base = Url::parse(base).map_err(|e| AppError::user("bad_base_url", e.to_string().as_str()))?;
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { base, http, token: RwLock::new(None) })
    }

    pub fn base(&self) -> &Url { &self.base }
    pub fn set_token(&self, token: String) { *self.token.write() = Some(token); }
    pub fn clear_token(&self) { *self.token.write() = None; }
    pub fn has_token(&self) -> bool { self.token.read().is_some() }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>, opts: CallOpts) -> AppResult<Value> {
        let url = self.base.join(path).map_err(|e| AppError::user("bad_path", e.to_string().as_str()))?;
        let mut req = self.http.request(method.clone(), url);
        if opts.need_token {
            if let Some(tok) = self.token.read().as_deref() {
                req = req.bearer_auth(tok);
            }
        }
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => return Err(self.note_failure(AppError::from(e), method.as_str(), path, opts)),
        };
        let status = resp.status();
        let val: Value = resp.json().await.unwrap_or_else(|_| json!({}));
        if !status.is_success() {
            let message = val
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("request failed")
                .to_string();
            return Err(self.note_failure(AppError::from_status(status.as_u16(), message), method.as_str(), path, opts));
        }
        Ok(val)
    }

    /// Blob-mode GET (captcha image).
    async fn send_bytes(&self, path: &str, opts: CallOpts) -> AppResult<Vec<u8>> {
        let url = self.base.join(path).map_err(|e| AppError::user("bad_path", e.to_string().as_str()))?;
        let mut req = self.http.get(url);
        if opts.need_token {
            if let Some(tok) = self.token.read().as_deref() {
                req = req.bearer_auth(tok);
            }
        }
        let resp = req.send().await.map_err(AppError::from)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(self.note_failure(
                AppError::from_status(status.as_u16(), "request failed".into()),
                "GET",
                path,
                opts,
            ));
        }
        Ok(resp.bytes().await.map_err(AppError::from)?.to_vec())
    }

    // Failures surface to the operator via warn-level logs unless the call
    // suppressed tips; then they stay at debug.
    fn note_failure(&self, err: AppError, method: &str, path: &str, opts: CallOpts) -> AppError {
        if opts.need_tip {
            warn!(target: "shopadmin", "api {} {} failed: {}", method, path, err);
        } else {
            debug!(target: "shopadmin", "api {} {} failed (quiet): {}", method, path, err);
        }
        err
    }

    // --- Authentication ---

    pub async fn login(&self, body: &Value) -> AppResult<Value> {
        self.send(Method::POST, "/api/auth/login", Some(body), CallOpts::public()).await
    }

    /// Logout failure is never surfaced; a dead session is dead either way.
    pub async fn logout(&self) -> AppResult<Value> {
        self.send(Method::POST, "/api/auth/logout", Some(&json!({})), CallOpts::quiet()).await
    }

    pub async fn refresh_token(&self) -> AppResult<Value> {
        self.send(Method::POST, "/api/auth/refresh", Some(&json!({})), CallOpts::default()).await
    }

    pub async fn get_captcha(&self) -> AppResult<Vec<u8>> {
        self.send_bytes("/api/auth/captcha", CallOpts::public()).await
    }

    // --- Profile ---

    pub async fn get_user(&self) -> AppResult<UserPayload> {
        let val = self.send(Method::GET, "/api/user/profile", None, CallOpts::default()).await?;
        // Some backends wrap the record in a `data` envelope
        let record = val.get("data").cloned().unwrap_or(val);
        serde_json::from_value(record).map_err(|e| AppError::internal("bad_profile", e.to_string().as_str()))
    }

    pub async fn update_profile(&self, body: &Value) -> AppResult<Value> {
        self.send(Method::PUT, "/api/user/profile", Some(body), CallOpts::default()).await
    }

    pub async fn change_password(&self, body: &Value) -> AppResult<Value> {
        self.send(Method::POST, "/api/user/change-password", Some(body), CallOpts::default()).await
    }

    // --- Roles & permissions ---

    pub async fn get_role_permissions(&self) -> AppResult<Value> {
        self.send(Method::GET, "/api/admin/roles/permissions", None, CallOpts::default()).await
    }

    pub async fn switch_current_role(&self, role: &str) -> AppResult<Value> {
        self.send(Method::POST, "/api/user/switch-role", Some(&json!({ "role": role })), CallOpts::default()).await
    }

    pub async fn validate_menu_path(&self, path: &str) -> AppResult<Value> {
        let q = format!("/api/permissions/validate-menu?path={}", urlencoding::encode(path));
        self.send(Method::GET, &q, None, CallOpts::default()).await
    }

    pub async fn get_menu_tree(&self) -> AppResult<Value> {
        self.send(Method::GET, "/api/admin/permissions/menu-tree", None, CallOpts::default()).await
    }

    pub async fn get_buttons(&self, parent_id: i64) -> AppResult<Value> {
        self.send(Method::GET, &format!("/api/admin/permissions/buttons/{}", parent_id), None, CallOpts::default()).await
    }

    pub async fn add_permission(&self, body: &Value) -> AppResult<Value> {
        self.send(Method::POST, "/api/admin/permissions", Some(body), CallOpts::default()).await
    }

    pub async fn update_permission(&self, id: i64, body: &Value) -> AppResult<Value> {
        self.send(Method::PUT, &format!("/api/admin/permissions/{}", id), Some(body), CallOpts::default()).await
    }

    pub async fn delete_permission(&self, id: i64) -> AppResult<Value> {
        self.send(Method::DELETE, &format!("/api/admin/permissions/{}", id), None, CallOpts::default()).await
    }

    pub async fn get_all_permission_tree(&self) -> AppResult<Vec<PermissionNode>> {
        let val = self.send(Method::GET, "/api/admin/permissions/tree", None, CallOpts::default()).await?;
        let record = val.get("data").cloned().unwrap_or(val);
        serde_json::from_value(record).map_err(|e| AppError::internal("bad_permission_tree", e.to_string().as_str()))
    }

    // --- CRUD families under /api/admin/manage ---
    // Uniform shape: GET list (plural), GET/PUT/DELETE by id (singular),
    // POST create (singular).

    pub async fn list(&self, family: &str, params: &[(&str, &str)]) -> AppResult<Value> {
        self.send(Method::GET, &manage_list_path(family, params), None, CallOpts::default()).await
    }

    pub async fn get_by_id(&self, family: &str, id: i64) -> AppResult<Value> {
        self.send(Method::GET, &format!("/api/admin/manage/{}/{}", family, id), None, CallOpts::default()).await
    }

    pub async fn create(&self, family: &str, body: &Value) -> AppResult<Value> {
        self.send(Method::POST, &format!("/api/admin/manage/{}", family), Some(body), CallOpts::default()).await
    }

    pub async fn update(&self, family: &str, id: i64, body: &Value) -> AppResult<Value> {
        self.send(Method::PUT, &format!("/api/admin/manage/{}/{}", family, id), Some(body), CallOpts::default()).await
    }

    pub async fn delete(&self, family: &str, id: i64) -> AppResult<Value> {
        self.send(Method::DELETE, &format!("/api/admin/manage/{}/{}", family, id), None, CallOpts::default()).await
    }

    // Flat per-family wrappers, one line each, mirroring the console's
    // call sites.

    pub async fn get_categories(&self, params: &[(&str, &str)]) -> AppResult<Value> { self.list("category", params).await }
    pub async fn get_category_by_id(&self, id: i64) -> AppResult<Value> { self.get_by_id("category", id).await }
    pub async fn create_category(&self, body: &Value) -> AppResult<Value> { self.create("category", body).await }
    pub async fn update_category(&self, id: i64, body: &Value) -> AppResult<Value> { self.update("category", id, body).await }
    pub async fn delete_category(&self, id: i64) -> AppResult<Value> { self.delete("category", id).await }

    pub async fn get_products(&self, params: &[(&str, &str)]) -> AppResult<Value> { self.list("product", params).await }
    pub async fn get_product_by_id(&self, id: i64) -> AppResult<Value> { self.get_by_id("product", id).await }
    pub async fn create_product(&self, body: &Value) -> AppResult<Value> { self.create("product", body).await }
    pub async fn update_product(&self, id: i64, body: &Value) -> AppResult<Value> { self.update("product", id, body).await }
    pub async fn delete_product(&self, id: i64) -> AppResult<Value> { self.delete("product", id).await }

    pub async fn get_orders(&self, params: &[(&str, &str)]) -> AppResult<Value> { self.list("order", params).await }
    pub async fn get_order_by_id(&self, id: i64) -> AppResult<Value> { self.get_by_id("order", id).await }
    pub async fn create_order(&self, body: &Value) -> AppResult<Value> { self.create("order", body).await }
    pub async fn update_order(&self, id: i64, body: &Value) -> AppResult<Value> { self.update("order", id, body).await }
    pub async fn delete_order(&self, id: i64) -> AppResult<Value> { self.delete("order", id).await }

    pub async fn get_coupons(&self, params: &[(&str, &str)]) -> AppResult<Value> { self.list("coupon", params).await }
    pub async fn get_coupon_by_id(&self, id: i64) -> AppResult<Value> { self.get_by_id("coupon", id).await }
    pub async fn create_coupon(&self, body: &Value) -> AppResult<Value> { self.create("coupon", body).await }
    pub async fn update_coupon(&self, id: i64, body: &Value) -> AppResult<Value> { self.update("coupon", id, body).await }
    pub async fn delete_coupon(&self, id: i64) -> AppResult<Value> { self.delete("coupon", id).await }

    // --- User management (admin) ---
    // The users family is plural on every verb, unlike the catalog families.

    pub async fn get_all_users(&self, params: &[(&str, &str)]) -> AppResult<Value> {
        self.send(Method::GET, &with_query("/api/admin/manage/users", params), None, CallOpts::default()).await
    }

    pub async fn create_user(&self, body: &Value) -> AppResult<Value> {
        self.send(Method::POST, "/api/admin/manage/users", Some(body), CallOpts::default()).await
    }

    pub async fn update_user(&self, id: i64, body: &Value) -> AppResult<Value> {
        self.send(Method::PUT, &format!("/api/admin/manage/users/{}", id), Some(body), CallOpts::default()).await
    }

    pub async fn delete_user(&self, id: i64) -> AppResult<Value> {
        self.send(Method::DELETE, &format!("/api/admin/manage/users/{}", id), None, CallOpts::default()).await
    }

    pub async fn reset_user_password(&self, id: i64, body: &Value) -> AppResult<Value> {
        self.send(Method::POST, &format!("/api/admin/manage/users/{}/reset-password", id), Some(body), CallOpts::default()).await
    }

    // --- Role management (admin) ---

    pub async fn get_all_roles(&self, params: &[(&str, &str)]) -> AppResult<Value> {
        self.send(Method::GET, &with_query("/api/admin/manage/roles", params), None, CallOpts::default()).await
    }

    pub async fn create_role(&self, body: &Value) -> AppResult<Value> {
        self.send(Method::POST, "/api/admin/manage/roles", Some(body), CallOpts::default()).await
    }

    pub async fn update_role(&self, id: i64, body: &Value) -> AppResult<Value> {
        self.send(Method::PUT, &format!("/api/admin/manage/roles/{}", id), Some(body), CallOpts::default()).await
    }

    pub async fn delete_role(&self, id: i64) -> AppResult<Value> {
        self.send(Method::DELETE, &format!("/api/admin/manage/roles/{}", id), None, CallOpts::default()).await
    }

    pub async fn add_role_users(&self, role_id: i64, body: &Value) -> AppResult<Value> {
        self.send(Method::POST, &format!("/api/admin/manage/roles/{}/users", role_id), Some(body), CallOpts::default()).await
    }

    pub async fn remove_role_users(&self, role_id: i64, body: &Value) -> AppResult<Value> {
        self.send(Method::DELETE, &format!("/api/admin/manage/roles/{}/users", role_id), Some(body), CallOpts::default()).await
    }
}

/// Catalog families list on the plural noun and address items on the singular.
fn manage_list_path(family: &str, params: &[(&str, &str)]) -> String {
    let plural = match family {
        "category" => "categories".to_string(),
        other => format!("{}s", other),
    };
    with_query(&format!("/api/admin/manage/{}", plural), params)
}

fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let qs = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", path, qs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_paths_pluralize_per_family() {
        assert_eq!(manage_list_path("category", &[]), "/api/admin/manage/categories");
        assert_eq!(manage_list_path("product", &[]), "/api/admin/manage/products");
        assert_eq!(manage_list_path("order", &[]), "/api/admin/manage/orders");
        assert_eq!(manage_list_path("coupon", &[]), "/api/admin/manage/coupons");
    }

    #[test]
    fn query_params_are_encoded() {
        let p = with_query("/api/admin/manage/products", &[("page", "2"), ("q", "red wine")]);
        assert_eq!(p, "/api/admin/manage/products?page=2&q=red%20wine");
    }

    #[test]
    fn call_opts_defaults_and_presets() {
        let d = CallOpts::default();
        assert!(d.need_token && d.need_tip);
        let p = CallOpts::public();
        assert!(!p.need_token && p.need_tip);
        let q = CallOpts::quiet();
        assert!(q.need_token && !q.need_tip);
    }

    #[test]
    fn token_state_round_trips() {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        assert!(!api.has_token());
        api.set_token("abc".into());
        assert!(api.has_token());
        api.clear_token();
        assert!(!api.has_token());
    }
}
