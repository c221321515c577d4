use std::collections::HashMap;

use crate::node::TreeNodeId;

/// Child listings already fetched from OMERO, keyed by `Kind:Id`.
/// （已從 OMERO 取得的子節點清單快取。）
///
/// An entry exists only after a successful fetch; failures are never stored.
/// Invalidation is all-or-nothing.
#[derive(Debug, Default)]
pub struct ChildListingCache {
    entries: HashMap<String, String>,
}

impl ChildListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: &TreeNodeId) -> Option<&str> {
        self.entries.get(&node.key()).map(String::as_str)
    }

    pub fn contains(&self, node: &TreeNodeId) -> bool {
        self.entries.contains_key(&node.key())
    }

    pub fn insert(&mut self, node: &TreeNodeId, payload: String) {
        self.entries.insert(node.key(), payload);
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_by_serialized_key() {
        let mut cache = ChildListingCache::new();
        let node = TreeNodeId::new("Dataset", 23);
        assert!(cache.get(&node).is_none());

        cache.insert(&node, "[{\"id\":\"Image:1\"}]".into());
        assert_eq!(cache.get(&"Dataset:23".parse().unwrap()), Some("[{\"id\":\"Image:1\"}]"));
        assert!(!cache.contains(&TreeNodeId::new("Project", 23)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_all_clears_every_entry() {
        let mut cache = ChildListingCache::new();
        cache.insert(&TreeNodeId::new("Project", 1), "a".into());
        cache.insert(&TreeNodeId::new("Dataset", 2), "b".into());
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
