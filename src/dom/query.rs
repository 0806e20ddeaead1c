//! DOM queries scoped to a subtree: by id, class, tag; generic predicate matching.
//!
//! Queries walk the light tree only. To look inside a component, start from
//! its shadow root.

use super::node::{ElementData, NodeId};
use super::tree::Dom;

impl Dom {
    /// Find the first element below `root` (inclusive) whose `id` matches.
    pub fn query_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        self.iter_elements(root)
            .find(|(_, el)| el.id() == Some(id))
            .map(|(node_id, _)| node_id)
    }

    /// Find all elements below `root` (inclusive) that have the given CSS class.
    pub fn query_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.query_all(root, |el| el.has_class(class))
    }

    /// Find all elements below `root` (inclusive) with the given tag name.
    pub fn query_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        self.query_all(root, |el| el.tag == tag)
    }

    /// Find all elements below `root` (inclusive) matching an arbitrary predicate.
    pub fn query_all(&self, root: NodeId, predicate: impl Fn(&ElementData) -> bool) -> Vec<NodeId> {
        self.iter_elements(root)
            .filter(|(_, el)| predicate(el))
            .map(|(node_id, _)| node_id)
            .collect()
    }

    /// Iterate over elements in tree order below `root`.
    fn iter_elements(&self, root: NodeId) -> impl Iterator<Item = (NodeId, &ElementData)> {
        self.walk_depth_first(root)
            .into_iter()
            .filter_map(move |id| self.get(id)?.as_element().map(|el| (id, el)))
    }
}
