//! Static route table for the console: an ordered registry of route
//! descriptors, validated and compiled once at construction. Lookup is by
//! exact name or by path with `:param` segments matching one path segment.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Default,
    /// Bare chrome for auth and error pages; such routes are public.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    pub title: String,
    pub layout: Layout,
}

/// Static declaration of a single route.
#[derive(Debug, Clone)]
pub struct RouteDef {
    pub name: String,
    pub path: String,
    pub meta: RouteMeta,
}

impl RouteDef {
    pub fn new<S: Into<String>>(name: S, path: S, title: S) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            meta: RouteMeta { title: title.into(), layout: Layout::Default },
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.meta.layout = layout;
        self
    }
}

/// Compiled entry: the declaration plus its path matcher.
#[derive(Debug)]
pub struct Route {
    pub def: RouteDef,
    matcher: Regex,
    params: Vec<String>,
}

impl Route {
    pub fn name(&self) -> &str { &self.def.name }
    pub fn path(&self) -> &str { &self.def.path }
    pub fn title(&self) -> &str { &self.def.meta.title }

    /// Routes rendered without chrome (login, 403, 404) carry no
    /// authorization requirement and short-circuit the guard.
    pub fn is_public(&self) -> bool { self.def.meta.layout == Layout::Empty }

    /// First path segment as a family root, e.g. `/product/edit/:id` -> `/product`.
    pub fn family_root(&self) -> String {
        match self.def.path[1..].split('/').next() {
            Some(seg) if !seg.is_empty() => format!("/{}", seg),
            _ => "/".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RouteConfigError {
    #[error("duplicate route name '{0}'")]
    DuplicateName(String),
    #[error("route '{0}' has an empty path")]
    EmptyPath(String),
    #[error("route '{0}' path '{1}' must start with '/'")]
    NotRooted(String, String),
    #[error("route '{0}' has invalid path segment '{1}'")]
    BadSegment(String, String),
    #[error("route table is missing the required '{0}' catch-all entry")]
    MissingCatchAll(&'static str),
}

// Param segments: ':' followed by an identifier.
static PARAM_SEG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:[A-Za-z_][A-Za-z0-9_]*$").expect("param segment regex"));

/// Immutable once constructed; installed wholesale at boot.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

/// Result of resolving a concrete path. Unmatched paths land on the `404`
/// entry, which is an ordinary route in the same table.
#[derive(Debug)]
pub enum Resolved<'a> {
    Matched { route: &'a Route, params: Vec<(String, String)> },
    NotFound(&'a Route),
}

impl<'a> Resolved<'a> {
    pub fn route(&self) -> &'a Route {
        match self {
            Resolved::Matched { route, .. } => route,
            Resolved::NotFound(route) => route,
        }
    }
}

impl RouteTable {
    /// Validate and compile the table. Fails fast on configuration errors:
    /// duplicate names, paths that are empty or not `/`-rooted, malformed
    /// `:param` segments, and missing 404/403 catch-alls.
    pub fn new(defs: Vec<RouteDef>) -> Result<Self, RouteConfigError> {
        let mut routes: Vec<Route> = Vec::with_capacity(defs.len());
        for def in defs {
            if def.path.is_empty() {
                return Err(RouteConfigError::EmptyPath(def.name));
            }
            if !def.path.starts_with('/') {
                return Err(RouteConfigError::NotRooted(def.name, def.path));
            }
            if routes.iter().any(|r| r.def.name == def.name) {
                return Err(RouteConfigError::DuplicateName(def.name));
            }
            let (matcher, params) = compile_pattern(&def)?;
            routes.push(Route { def, matcher, params });
        }
        for required in ["404", "403"] {
            if !routes.iter().any(|r| r.def.name == required) {
                return Err(RouteConfigError::MissingCatchAll(required));
            }
        }
        Ok(Self { routes })
    }

    pub fn len(&self) -> usize { self.routes.len() }
    pub fn is_empty(&self) -> bool { self.routes.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &Route> { self.routes.iter() }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.def.name == name)
    }

    /// First match in declaration order, with extracted `:param` values.
    pub fn match_path(&self, path: &str) -> Option<(&Route, Vec<(String, String)>)> {
        for r in &self.routes {
            if let Some(caps) = r.matcher.captures(path) {
                let params = r
                    .params
                    .iter()
                    .filter_map(|p| caps.name(p).map(|m| (p.clone(), m.as_str().to_string())))
                    .collect();
                return Some((r, params));
            }
        }
        None
    }

    pub fn resolve(&self, path: &str) -> Resolved<'_> {
        match self.match_path(path) {
            Some((route, params)) => Resolved::Matched { route, params },
            // Construction guarantees the 404 entry exists.
            None => Resolved::NotFound(self.by_name("404").unwrap_or(&self.routes[0])),
        }
    }
}

fn compile_pattern(def: &RouteDef) -> Result<(Regex, Vec<String>), RouteConfigError> {
    let mut pattern = String::from("^");
    let mut params: Vec<String> = Vec::new();
    if def.path == "/" {
        pattern.push('/');
    } else {
        for seg in def.path[1..].split('/') {
            pattern.push('/');
            if let Some(stripped) = seg.strip_prefix(':') {
                if !PARAM_SEG.is_match(seg) {
                    return Err(RouteConfigError::BadSegment(def.name.clone(), seg.to_string()));
                }
                pattern.push_str(&format!("(?P<{}>[^/]+)", stripped));
                params.push(stripped.to_string());
            } else if seg.is_empty() {
                return Err(RouteConfigError::BadSegment(def.name.clone(), def.path.clone()));
            } else {
                pattern.push_str(&regex::escape(seg));
            }
        }
    }
    pattern.push('$');
    let matcher = Regex::new(&pattern)
        .map_err(|_| RouteConfigError::BadSegment(def.name.clone(), def.path.clone()))?;
    Ok((matcher, params))
}

/// The console's static table. Single source of truth: flat paths, with the
/// discount family named `coupon` to match the API surface.
pub fn default_table() -> Result<RouteTable, RouteConfigError> {
    let mut defs = vec![
        RouteDef::new("login", "/login", "Sign in").with_layout(Layout::Empty),
        RouteDef::new("home", "/", "Dashboard"),
    ];
    for (family, label) in [
        ("category", "Categories"),
        ("product", "Products"),
        ("order", "Orders"),
        ("coupon", "Coupons"),
        ("blog-category", "Blog categories"),
        ("blog", "Blog posts"),
        ("tag", "Tags"),
        ("user", "Customers"),
        ("staff", "Staff"),
    ] {
        defs.push(RouteDef::new(family.to_string(), format!("/{}", family), label.to_string()));
        defs.push(RouteDef::new(
            format!("{}_add", family),
            format!("/{}/add", family),
            format!("{} - add", label),
        ));
        defs.push(RouteDef::new(
            format!("{}_edit", family),
            format!("/{}/edit/:id", family),
            format!("{} - edit", label),
        ));
    }
    defs.push(RouteDef::new("role", "/role", "Roles"));
    defs.push(RouteDef::new("profile", "/profile", "Profile"));
    defs.push(RouteDef::new("404", "/404", "Page not found").with_layout(Layout::Empty));
    defs.push(RouteDef::new("403", "/403", "Access denied").with_layout(Layout::Empty));
    RouteTable::new(defs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_paths_are_rooted_and_names_unique() {
        let table = default_table().expect("default table");
        for r in table.iter() {
            assert!(!r.path().is_empty());
            assert!(r.path().starts_with('/'), "path {} not rooted", r.path());
        }
        let mut names: Vec<&str> = table.iter().map(|r| r.name()).collect();
        let before = names.len();
        names.sort();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn duplicate_name_fails_fast() {
        let defs = vec![
            RouteDef::new("user", "/user", "Customers"),
            RouteDef::new("user", "/staff", "Staff"),
            RouteDef::new("404", "/404", "Not found").with_layout(Layout::Empty),
            RouteDef::new("403", "/403", "Denied").with_layout(Layout::Empty),
        ];
        match RouteTable::new(defs) {
            Err(RouteConfigError::DuplicateName(name)) => assert_eq!(name, "user"),
            other => panic!("expected duplicate-name error, got {:?}", other),
        }
    }

    #[test]
    fn unrooted_path_fails_fast() {
        let defs = vec![RouteDef::new("x", "x", "X")];
        assert!(matches!(RouteTable::new(defs), Err(RouteConfigError::NotRooted(..))));
    }

    #[test]
    fn missing_catch_all_fails_fast() {
        let defs = vec![RouteDef::new("home", "/", "Dashboard")];
        assert!(matches!(RouteTable::new(defs), Err(RouteConfigError::MissingCatchAll(_))));
    }

    #[test]
    fn param_routes_extract_values() {
        let table = default_table().unwrap();
        let (route, params) = table.match_path("/product/edit/42").expect("match");
        assert_eq!(route.name(), "product_edit");
        assert_eq!(params, vec![("id".to_string(), "42".to_string())]);
    }

    #[test]
    fn unmatched_path_resolves_to_404() {
        let table = default_table().unwrap();
        match table.resolve("/no/such/page") {
            Resolved::NotFound(route) => assert_eq!(route.name(), "404"),
            Resolved::Matched { route, .. } => panic!("unexpected match: {}", route.name()),
        }
    }

    #[test]
    fn family_root_strips_to_first_segment() {
        let table = default_table().unwrap();
        let route = table.by_name("product_edit").unwrap();
        assert_eq!(route.family_root(), "/product");
        assert_eq!(table.by_name("home").unwrap().family_root(), "/");
    }
}
