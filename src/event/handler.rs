//! Propagation path computation and listener subscriptions.
//!
//! [`propagation_path`] computes the nodes an event visits, from the target up
//! to the window. A shadow root is the end of the path unless the event is
//! composed, in which case propagation continues at the host and the event is
//! retargeted to it.

use crate::dom::node::NodeId;
use crate::dom::tree::Dom;
use crate::event::ListenerId;

// ---------------------------------------------------------------------------
// Propagation path
// ---------------------------------------------------------------------------

/// One step of an event path: the node whose listeners run and the target as
/// seen from that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEntry {
    pub node: NodeId,
    pub target: NodeId,
}

/// Compute the bubble path from `start` up to the window (inclusive).
///
/// Returns an empty vec if `start` does not exist. The window is appended only
/// when the walk reaches the document.
pub fn propagation_path(dom: &Dom, start: NodeId, composed: bool) -> Vec<PathEntry> {
    if !dom.contains(start) {
        return Vec::new();
    }
    let mut path = Vec::new();
    let mut target = start;
    let mut current = start;
    loop {
        path.push(PathEntry { node: current, target });
        if current == dom.document() {
            path.push(PathEntry {
                node: dom.window(),
                target,
            });
            break;
        }
        match dom.parent(current) {
            Some(p) => current = p,
            None => match dom.host(current) {
                Some(host) if composed => {
                    target = host;
                    current = host;
                }
                _ => break,
            },
        }
    }
    path
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// A listener registered on behalf of a component instance.
///
/// Released when the instance disconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub target: NodeId,
    pub listener: ListenerId,
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ShadowRootMode;

    /// Build a connected tree with a shadow root:
    /// ```text
    ///  body
    ///   └ host
    ///      ├ #shadow
    ///      │   └ inner
    ///      │       └ leaf
    ///      └ light
    /// ```
    fn build_tree() -> (Dom, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let host = dom.create_element("x-host");
        let light = dom.create_element("span");
        dom.append_child(dom.body(), host).unwrap();
        dom.append_child(host, light).unwrap();
        let shadow = dom.attach_shadow(host, ShadowRootMode::Open).unwrap();
        let inner = dom.create_element("div");
        let leaf = dom.create_element("button");
        dom.append_child(shadow, inner).unwrap();
        dom.append_child(inner, leaf).unwrap();
        (dom, host, shadow, inner, leaf, light)
    }

    fn nodes(path: &[PathEntry]) -> Vec<NodeId> {
        path.iter().map(|e| e.node).collect()
    }

    #[test]
    fn light_path_reaches_window() {
        let (dom, host, _, _, _, light) = build_tree();
        let html = dom.parent(dom.body()).unwrap();
        let path = propagation_path(&dom, light, false);
        assert_eq!(
            nodes(&path),
            vec![light, host, dom.body(), html, dom.document(), dom.window()]
        );
        assert!(path.iter().all(|e| e.target == light));
    }

    #[test]
    fn uncomposed_stops_at_shadow_root() {
        let (dom, _, shadow, inner, leaf, _) = build_tree();
        let path = propagation_path(&dom, leaf, false);
        assert_eq!(nodes(&path), vec![leaf, inner, shadow]);
    }

    #[test]
    fn composed_crosses_to_host_and_retargets() {
        let (dom, host, shadow, inner, leaf, _) = build_tree();
        let path = propagation_path(&dom, leaf, true);
        assert_eq!(&nodes(&path)[..4], &[leaf, inner, shadow, host]);
        assert_eq!(path[2].target, leaf);
        assert_eq!(path[3].target, host);
        assert_eq!(path.last().unwrap().node, dom.window());
        assert_eq!(path.last().unwrap().target, host);
    }

    #[test]
    fn detached_path_stops_at_root() {
        let mut dom = Dom::new();
        let a = dom.create_element("div");
        let b = dom.create_element("p");
        dom.append_child(a, b).unwrap();
        assert_eq!(nodes(&propagation_path(&dom, b, true)), vec![b, a]);
    }

    #[test]
    fn window_path_is_window() {
        let dom = Dom::new();
        assert_eq!(nodes(&propagation_path(&dom, dom.window(), false)), vec![dom.window()]);
    }

    #[test]
    fn stale_node_has_empty_path() {
        let mut dom = Dom::new();
        let ghost = dom.create_element("div");
        dom.remove(ghost);
        assert!(propagation_path(&dom, ghost, false).is_empty());
    }
}
