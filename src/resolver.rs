//! Stacking depth and max-bounds computation.
//!
//! Two post-order passes over the tree, always run in this order:
//!
//! 1. [`calculate_max_bounds`] grows each node's bounds to cover its
//!    overflowing descendants.
//! 2. [`calculate_depth`] lifts every node above the tallest earlier
//!    sibling it overlaps, using the rectangles from pass 1.
//!
//! Nodes that do not `would_show()` keep their own bounds and depth 1 and
//! are ignored as siblings, but their subtrees are still resolved so they
//! are consistent when shown again.

use crate::geometry::Rect;
use crate::tree::{NodeId, NodeTree};

/// Recompute `max_bounds` and `depth` for the whole tree.
pub fn resolve(tree: &mut NodeTree) {
    let Some(root) = tree.root() else {
        return;
    };
    calculate_max_bounds(tree, root);
    calculate_depth(tree, root);
    log::debug!(
        "Resolved {} nodes, root max bounds {:?}",
        tree.len(),
        tree.node(root).max_bounds()
    );
}

/// Post-order max-bounds pass for the subtree at `id`.
///
/// The result is expressed in the parent's frame, like `bounds`. A child
/// extends the origin when it starts before it, and extends the far edge
/// when it ends past the node's *own* far edge. Only the last child that
/// overflows an axis decides that axis' far edge.
pub fn calculate_max_bounds(tree: &mut NodeTree, id: NodeId) {
    let children = tree.children(id).to_vec();
    for &child in &children {
        calculate_max_bounds(tree, child);
    }

    let node = tree.node(id);
    let bounds = node.bounds;
    let mut total = bounds;

    if node.would_show() {
        for &child in &children {
            let child_max = tree.node(child).max_bounds().offset(bounds.x, bounds.y);

            if child_max.x < total.x {
                total.width = total.width.saturating_add(total.x.saturating_sub(child_max.x));
                total.x = child_max.x;
            }
            if child_max.y < total.y {
                total.height = total.height.saturating_add(total.y.saturating_sub(child_max.y));
                total.y = child_max.y;
            }
            if child_max.right() > bounds.right() {
                total.width = child_max.right().saturating_sub(total.x);
            }
            if child_max.bottom() > bounds.bottom() {
                total.height = child_max.bottom().saturating_sub(total.y);
            }
        }
    }

    tree.node_mut(id).set_max_bounds(total);
}

/// Post-order depth pass for the subtree at `id`.
pub fn calculate_depth(tree: &mut NodeTree, id: NodeId) {
    let children = tree.children(id).to_vec();
    for &child in &children {
        calculate_depth(tree, child);
    }

    tree.node_mut(id).set_depth(1);

    let node = tree.node(id);
    let Some(parent) = node.parent() else {
        return;
    };
    if !node.would_show() {
        return;
    }

    let own = node.max_bounds();
    let mut depth = 1;
    for &sibling in tree.children(parent) {
        if sibling == id {
            break;
        }
        let sib = tree.node(sibling);
        if sib.would_show() && sib.max_bounds().intersects(&own) {
            depth = depth.max(max_subtree_depth(tree, sibling) + 1);
        }
    }

    tree.node_mut(id).set_depth(depth);
}

/// Height of the stack rooted at `id`: its own depth plus the tallest
/// showing child. Computed on demand, never cached.
pub fn max_subtree_depth(tree: &NodeTree, id: NodeId) -> u32 {
    let node = tree.node(id);
    let mut max_depth = 0;
    let mut areas: Vec<Rect> = Vec::new();

    for &child in node.children() {
        let c = tree.node(child);
        if !c.would_show() {
            continue;
        }
        let child_depth = max_subtree_depth(tree, child);
        let rect = c.max_bounds();
        if areas.iter().any(|area| area.intersects(&rect)) {
            max_depth = max_depth.max(child_depth);
        }
        areas.push(rect);
        max_depth = max_depth.max(child_depth);
    }

    max_depth + node.depth()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;
    use crate::tree::{Node, Visibility};

    fn tree_with_root(w: i32, h: i32) -> (NodeTree, NodeId) {
        let mut tree = NodeTree::new(Color::rgb(0.2, 0.2, 0.2));
        let root = tree.add_root(Node::new("Root", Rect::new(0, 0, w, h))).unwrap();
        (tree, root)
    }

    #[test]
    fn test_leaf_max_bounds_equal_bounds() {
        let (mut tree, root) = tree_with_root(100, 100);
        let a = tree.add_child(root, Node::new("A", Rect::new(10, 10, 20, 20))).unwrap();
        resolve(&mut tree);
        assert_eq!(tree.node(a).max_bounds(), Rect::new(10, 10, 20, 20));
        assert_eq!(tree.node(root).max_bounds(), Rect::new(0, 0, 100, 100));
    }

    #[test]
    fn test_negative_origin_extends() {
        let (mut tree, root) = tree_with_root(100, 100);
        tree.add_child(root, Node::new("A", Rect::new(-10, -5, 20, 20))).unwrap();
        resolve(&mut tree);
        assert_eq!(tree.node(root).max_bounds(), Rect::new(-10, -5, 110, 105));
    }

    #[test]
    fn test_far_edge_extends_in_parent_frame() {
        let (mut tree, root) = tree_with_root(100, 100);
        let a = tree.add_child(root, Node::new("A", Rect::new(50, 50, 40, 40))).unwrap();
        tree.add_child(a, Node::new("A1", Rect::new(30, 0, 20, 10))).unwrap();
        resolve(&mut tree);
        // A1 ends at x = 50 + 30 + 20 = 100 in root's frame, past A's edge at 90
        assert_eq!(tree.node(a).max_bounds(), Rect::new(50, 50, 50, 40));
        assert_eq!(tree.node(root).max_bounds(), Rect::new(0, 0, 100, 100));
    }

    #[test]
    fn test_last_overflowing_child_wins() {
        // Growth compares against the node's own far edge, not the running
        // total, so a later, smaller overflow replaces an earlier larger one.
        let (mut tree, root) = tree_with_root(100, 100);
        tree.add_child(root, Node::new("Wide", Rect::new(0, 0, 150, 10))).unwrap();
        tree.add_child(root, Node::new("Narrow", Rect::new(0, 20, 120, 10))).unwrap();
        resolve(&mut tree);
        assert_eq!(tree.node(root).max_bounds().width, 120);
    }

    #[test]
    fn test_hidden_parent_keeps_own_bounds() {
        let (mut tree, root) = tree_with_root(100, 100);
        let a = tree.add_child(root, Node::new("A", Rect::new(0, 0, 10, 10))).unwrap();
        let a1 = tree.add_child(a, Node::new("A1", Rect::new(0, 0, 40, 40))).unwrap();
        tree.node_mut(a).show(false);
        resolve(&mut tree);
        assert_eq!(tree.node(a).max_bounds(), Rect::new(0, 0, 10, 10));
        // The hidden subtree is still resolved.
        assert_eq!(tree.node(a1).max_bounds(), Rect::new(0, 0, 40, 40));
    }

    #[test]
    fn test_max_bounds_contain_bounds() {
        let (mut tree, root) = tree_with_root(100, 100);
        let a = tree.add_child(root, Node::new("A", Rect::new(-20, 30, 50, 50))).unwrap();
        tree.add_child(a, Node::new("A1", Rect::new(-5, -40, 100, 10))).unwrap();
        tree.add_child(root, Node::new("B", Rect::new(90, 90, 30, 30))).unwrap();
        resolve(&mut tree);
        for id in tree.iter_depth_first().collect::<Vec<_>>() {
            let node = tree.node(id);
            assert!(
                node.max_bounds().contains_rect(&node.bounds),
                "{} max bounds {:?} do not contain {:?}",
                node.name,
                node.max_bounds(),
                node.bounds
            );
        }
    }

    #[test]
    fn test_disjoint_siblings_share_depth() {
        let (mut tree, root) = tree_with_root(100, 100);
        let a = tree.add_child(root, Node::new("A", Rect::new(0, 0, 50, 50))).unwrap();
        let b = tree.add_child(root, Node::new("B", Rect::new(60, 0, 50, 50))).unwrap();
        resolve(&mut tree);
        assert_eq!(tree.node(a).depth(), 1);
        assert_eq!(tree.node(b).depth(), 1);

        tree.node_mut(b).bounds = Rect::new(25, 0, 50, 50);
        resolve(&mut tree);
        assert_eq!(tree.node(a).depth(), 1);
        assert_eq!(tree.node(b).depth(), 2);
    }

    #[test]
    fn test_overlap_lifts_above_sibling_subtree() {
        let (mut tree, root) = tree_with_root(100, 100);
        let a = tree.add_child(root, Node::new("A", Rect::new(0, 0, 50, 50))).unwrap();
        tree.add_child(a, Node::new("A1", Rect::new(0, 0, 20, 20))).unwrap();
        tree.add_child(a, Node::new("A2", Rect::new(10, 10, 20, 20))).unwrap();
        let b = tree.add_child(root, Node::new("B", Rect::new(40, 40, 20, 20))).unwrap();
        resolve(&mut tree);
        // A2 overlaps A1 so A's stack is 1 (A) + 2 (A2) = 3
        assert_eq!(max_subtree_depth(&tree, a), 3);
        assert_eq!(tree.node(b).depth(), 4);
        assert!(tree.node(b).depth() > max_subtree_depth(&tree, a));
    }

    #[test]
    fn test_hidden_siblings_do_not_consume_a_slot() {
        let (mut tree, root) = tree_with_root(100, 100);
        let a = tree
            .add_child(
                root,
                Node::new("A", Rect::new(0, 0, 50, 50)).with_visibility(Visibility::Gone),
            )
            .unwrap();
        let b = tree.add_child(root, Node::new("B", Rect::new(25, 0, 50, 50))).unwrap();
        let c = tree.add_child(root, Node::new("C", Rect::new(0, 0, 10, 10))).unwrap();
        tree.node_mut(c).show(false);
        resolve(&mut tree);
        assert_eq!(tree.node(a).depth(), 1);
        assert_eq!(tree.node(b).depth(), 1);
        assert_eq!(tree.node(c).depth(), 1);
    }

    #[test]
    fn test_root_depth_is_one() {
        let (mut tree, root) = tree_with_root(10, 10);
        resolve(&mut tree);
        assert_eq!(tree.node(root).depth(), 1);
        assert_eq!(max_subtree_depth(&tree, root), 1);
    }
}
