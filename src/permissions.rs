//! Server-delivered permission tree and the reachable-path set derived from
//! it. The guard never walks the tree per navigation: the flattened set is
//! cached per session and invalidated when the role generation moves.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
    #[default]
    Menu,
    Button,
}

/// One node of the permission tree as `/api/admin/permissions/tree` returns
/// it. Leaves are menu or button entries; only menu nodes carry paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionNode {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: PermissionKind,
    #[serde(default)]
    pub children: Vec<PermissionNode>,
}

/// Flattened set of menu paths reachable by the active identity.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    paths: HashSet<String>,
}

impl PermissionSet {
    pub fn from_tree(nodes: &[PermissionNode]) -> Self {
        let mut paths = HashSet::new();
        fn walk(nodes: &[PermissionNode], out: &mut HashSet<String>) {
            for n in nodes {
                if n.kind == PermissionKind::Menu {
                    if let Some(p) = n.path.as_deref() {
                        if !p.is_empty() {
                            out.insert(p.to_string());
                        }
                    }
                }
                walk(&n.children, out);
            }
        }
        walk(nodes, &mut paths);
        Self { paths }
    }

    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { paths: paths.into_iter().map(Into::into).collect() }
    }

    pub fn contains(&self, path: &str) -> bool { self.paths.contains(path) }
    pub fn len(&self) -> usize { self.paths.len() }
    pub fn is_empty(&self) -> bool { self.paths.is_empty() }
}

/// Per-session memo of the reachable-path set, keyed by the session store's
/// role generation. A generation mismatch is treated as empty.
#[derive(Debug, Default)]
pub struct PermissionCache {
    slot: RwLock<Option<(u64, Arc<PermissionSet>)>>,
}

impl PermissionCache {
    pub fn get(&self, generation: u64) -> Option<Arc<PermissionSet>> {
        match self.slot.read().as_ref() {
            Some((gen, set)) if *gen == generation => Some(Arc::clone(set)),
            _ => None,
        }
    }

    pub fn put(&self, generation: u64, set: PermissionSet) -> Arc<PermissionSet> {
        let set = Arc::new(set);
        *self.slot.write() = Some((generation, Arc::clone(&set)));
        set
    }

    pub fn invalidate(&self) { *self.slot.write() = None; }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<PermissionNode> {
        vec![PermissionNode {
            id: 1,
            name: "catalog".into(),
            path: Some("/product".into()),
            kind: PermissionKind::Menu,
            children: vec![
                PermissionNode {
                    id: 2,
                    name: "edit".into(),
                    path: Some("/product/edit/:id".into()),
                    kind: PermissionKind::Menu,
                    ..Default::default()
                },
                PermissionNode {
                    id: 3,
                    name: "delete-button".into(),
                    path: Some("/product/delete".into()),
                    kind: PermissionKind::Button,
                    ..Default::default()
                },
            ],
        }]
    }

    #[test]
    fn flatten_collects_menu_paths_only() {
        let set = PermissionSet::from_tree(&tree());
        assert!(set.contains("/product"));
        assert!(set.contains("/product/edit/:id"));
        assert!(!set.contains("/product/delete"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn cache_keys_on_generation() {
        let cache = PermissionCache::default();
        assert!(cache.get(1).is_none());
        cache.put(1, PermissionSet::from_paths(["/product"]));
        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_none(), "role switch must miss the cache");
        cache.invalidate();
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn tree_deserializes_from_api_shape() {
        let raw = serde_json::json!([
            {"id": 1, "name": "catalog", "path": "/product", "type": "menu",
             "children": [{"id": 9, "name": "export", "type": "button"}]}
        ]);
        let nodes: Vec<PermissionNode> = serde_json::from_value(raw).unwrap();
        let set = PermissionSet::from_tree(&nodes);
        assert!(set.contains("/product"));
        assert_eq!(set.len(), 1);
    }
}
