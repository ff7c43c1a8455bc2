use hierarchy_inspector::geometry::{Color, Rect};
use hierarchy_inspector::resolver::{self, max_subtree_depth};
use hierarchy_inspector::{parse_capture, Node, NodeId, NodeTree, TreeError};

const CLEAR: Color = Color::rgb(0.2, 0.2, 0.2);
const SAMPLE: &str = include_str!("../demos/sample_capture.xml");

fn overlap_tree() -> (NodeTree, NodeId, NodeId) {
    let mut tree = NodeTree::new(CLEAR);
    let root = tree.add_root(Node::new("Root", Rect::new(0, 0, 100, 100))).unwrap();
    let a = tree.add_child(root, Node::new("A", Rect::new(0, 0, 50, 50))).unwrap();
    let b = tree.add_child(root, Node::new("B", Rect::new(25, 0, 50, 50))).unwrap();
    resolver::resolve(&mut tree);
    (tree, a, b)
}

#[test]
fn test_overlapping_sibling_is_lifted() {
    let (tree, a, b) = overlap_tree();
    assert_eq!(tree.node(a).depth(), 1);
    assert_eq!(tree.node(b).depth(), 2);
    assert_eq!(tree.node(tree.root().unwrap()).depth(), 1);
}

#[test]
fn test_hiding_sibling_releases_depth() {
    let (mut tree, a, b) = overlap_tree();

    tree.set_checked(a, false);
    resolver::resolve(&mut tree);
    assert_eq!(tree.node(b).depth(), 1);

    tree.set_checked(a, true);
    resolver::resolve(&mut tree);
    assert_eq!(tree.node(b).depth(), 2);
}

#[test]
fn test_moving_sibling_apart_shares_depth() {
    let (mut tree, _, b) = overlap_tree();
    tree.node_mut(b).bounds = Rect::new(50, 0, 50, 50);
    resolver::resolve(&mut tree);
    assert_eq!(tree.node(b).depth(), 1);
}

#[test]
fn test_sample_capture_invariants() {
    let tree = parse_capture(SAMPLE, CLEAR).unwrap();
    assert_eq!(tree.len(), 8);

    for id in tree.iter_depth_first() {
        let node = tree.node(id);
        assert!(node.depth() >= 1, "{} has depth 0", node.name);
        assert!(
            node.max_bounds().contains_rect(&node.bounds),
            "{} max bounds {:?} do not contain {:?}",
            node.name,
            node.max_bounds(),
            node.bounds
        );

        let showing: Vec<NodeId> = tree
            .children(id)
            .iter()
            .copied()
            .filter(|&c| tree.node(c).would_show())
            .collect();
        for (j, &later) in showing.iter().enumerate() {
            for &earlier in &showing[..j] {
                let overlaps = tree
                    .node(earlier)
                    .max_bounds()
                    .intersects(&tree.node(later).max_bounds());
                if overlaps {
                    assert!(
                        tree.node(later).depth() > max_subtree_depth(&tree, earlier),
                        "{} should sit above {}",
                        tree.node(later).name,
                        tree.node(earlier).name
                    );
                }
            }
        }
    }
}

#[test]
fn test_sample_capture_stacks_button_over_image() {
    let tree = parse_capture(SAMPLE, CLEAR).unwrap();
    let find = |id: &str| {
        tree.iter_depth_first()
            .find(|&n| tree.node(n).id.as_deref() == Some(id))
            .unwrap()
    };
    assert_eq!(tree.node(find("hero")).depth(), 1);
    assert_eq!(tree.node(find("action")).depth(), 2);
    assert!(!tree.node(find("spinner")).would_show());
    assert!(!tree.node(find("divider")).would_show());
}

#[test]
fn test_pick_colors_unique_until_exhausted() {
    let mut tree = NodeTree::new(CLEAR);
    let root = tree.add_root(Node::new("Root", Rect::new(0, 0, 10, 10))).unwrap();
    for i in 1..999 {
        tree.add_child(root, Node::new(format!("Child{}", i), Rect::new(0, 0, 1, 1)))
            .unwrap();
    }
    assert_eq!(tree.len(), 999);

    let err = tree
        .add_child(root, Node::new("Overflow", Rect::new(0, 0, 1, 1)))
        .unwrap_err();
    assert_eq!(err, TreeError::PaletteExhausted { capacity: 999 });

    let colors: Vec<Color> = tree
        .iter_depth_first()
        .map(|id| tree.node(id).pick_color())
        .collect();
    for (i, a) in colors.iter().enumerate() {
        assert!(!a.approx_rgb_eq(&CLEAR, 0.01));
        for b in &colors[i + 1..] {
            assert!(!a.approx_rgb_eq(b, 0.01));
        }
    }
}

#[test]
fn test_reshow_restores_drawable_flags() {
    let (mut tree, a, _) = overlap_tree();
    let node = tree.node_mut(a);
    node.set_background_shown(false);
    node.set_content_shown(false);
    node.show(false);
    assert!(!node.is_background_shown());
    node.show(true);
    assert!(node.is_background_shown());
    assert!(node.is_content_shown());
}
