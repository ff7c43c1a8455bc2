//! Arena-based storage for a captured view hierarchy.
//!
//! Nodes live in a dense `Vec` and refer to each other by [`NodeId`]:
//! children are owned in draw order, and the parent link is a plain index,
//! so there are no ownership cycles. Nodes are never removed; a tree is
//! built once per capture and then only its display flags change.
//!
//! Mutations touch exactly the flag they name. Derived geometry
//! (`max_bounds`, `depth`) is only written by [`crate::resolver`], and the
//! caller is responsible for re-running it after changing what is shown.

use crate::drawable::Drawable;
use crate::error::TreeError;
use crate::geometry::{Color, Insets, Rect};
use crate::pick_color::{PickColorAllocator, PICK_TOLERANCE};

/// Index of a node inside its [`NodeTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Visibility as reported by the captured view. Fixed at insertion.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Invisible,
    Gone,
}

/// One rectangle of the captured hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    /// Class or type name of the view.
    pub name: String,
    pub id: Option<String>,
    /// Position and size relative to the parent, in device pixels.
    pub bounds: Rect,
    pub padding: Insets,
    pub margin: Insets,
    pub drawable_padding: Insets,
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub translation_x: f32,
    pub translation_y: f32,
    pub background: Drawable,
    pub content: Drawable,

    visibility: Visibility,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    device_left: i32,
    device_top: i32,
    is_shown: bool,
    is_selected: bool,
    is_background_shown: bool,
    is_content_shown: bool,
    max_bounds: Rect,
    depth: u32,
    pick_color: Color,
}

impl Node {
    /// Create a visible, shown node with the given bounds and no drawables.
    pub fn new(name: impl Into<String>, bounds: Rect) -> Self {
        Self {
            name: name.into(),
            id: None,
            bounds,
            padding: Insets::default(),
            margin: Insets::default(),
            drawable_padding: Insets::default(),
            scroll_x: 0.0,
            scroll_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            translation_x: 0.0,
            translation_y: 0.0,
            background: Drawable::None,
            content: Drawable::None,
            visibility: Visibility::Visible,
            parent: None,
            children: Vec::new(),
            device_left: 0,
            device_top: 0,
            is_shown: true,
            is_selected: false,
            is_background_shown: true,
            is_content_shown: true,
            max_bounds: bounds,
            depth: 1,
            pick_color: Color::TRANSPARENT,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_background(mut self, background: Drawable) -> Self {
        self.background = background;
        self
    }

    pub fn with_content(mut self, content: Drawable) -> Self {
        self.content = content;
        self
    }

    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_margin(mut self, margin: Insets) -> Self {
        self.margin = margin;
        self
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn device_left(&self) -> i32 {
        self.device_left
    }

    pub fn device_top(&self) -> i32 {
        self.device_top
    }

    pub fn is_shown(&self) -> bool {
        self.is_shown
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    /// Shown by the user and visible on the device.
    pub fn would_show(&self) -> bool {
        self.is_shown && self.is_visible()
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    pub fn is_background_shown(&self) -> bool {
        self.is_background_shown
    }

    pub fn is_content_shown(&self) -> bool {
        self.is_content_shown
    }

    /// Set the shown flag. Showing a node also re-enables its background
    /// and content.
    pub fn show(&mut self, shown: bool) {
        self.is_shown = shown;
        if shown {
            self.is_background_shown = true;
            self.is_content_shown = true;
        }
    }

    pub fn set_background_shown(&mut self, shown: bool) {
        self.is_background_shown = shown;
    }

    pub fn set_content_shown(&mut self, shown: bool) {
        self.is_content_shown = shown;
    }

    /// Bounds grown to cover overflowing descendants, in the parent's frame.
    pub fn max_bounds(&self) -> Rect {
        self.max_bounds
    }

    /// Stacking level assigned by the resolver.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn pick_color(&self) -> Color {
        self.pick_color
    }

    pub fn has_area(&self) -> bool {
        self.bounds.width != 0 && self.bounds.height != 0
    }

    pub(crate) fn set_max_bounds(&mut self, rect: Rect) {
        self.max_bounds = rect;
    }

    pub(crate) fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }
}

/// A captured hierarchy with at most one root.
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    selected: Option<NodeId>,
    colors: PickColorAllocator,
}

impl NodeTree {
    /// Create an empty tree whose pick colors avoid `clear_color`.
    pub fn new(clear_color: Color) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            selected: None,
            colors: PickColorAllocator::new(clear_color),
        }
    }

    pub fn add_root(&mut self, node: Node) -> Result<NodeId, TreeError> {
        if self.root.is_some() {
            return Err(TreeError::RootAlreadySet);
        }
        let id = self.insert(node, None)?;
        self.root = Some(id);
        Ok(id)
    }

    /// Append `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, TreeError> {
        if self.nodes.get(parent.index()).is_none() {
            return Err(TreeError::MissingParent(parent));
        }
        let id = self.insert(node, Some(parent))?;
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    fn insert(&mut self, mut node: Node, parent: Option<NodeId>) -> Result<NodeId, TreeError> {
        node.pick_color = self.colors.next_color()?;
        node.parent = parent;
        node.children.clear();
        node.max_bounds = node.bounds;
        node.depth = 1;
        if let Some(parent) = parent {
            let p = &self.nodes[parent.index()];
            node.device_left = p.device_left.saturating_add(node.bounds.x);
            node.device_top = p.device_top.saturating_add(node.bounds.y);
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        Ok(id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Checkbox semantics from the hierarchy view: same as [`Node::show`].
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        self.node_mut(id).show(checked);
    }

    /// Show every node in the tree.
    pub fn show_all(&mut self) {
        for node in &mut self.nodes {
            node.show(true);
        }
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Move the selection, clearing the flag on the previous node.
    pub fn set_selected(&mut self, id: Option<NodeId>) {
        if let Some(prev) = self.selected.take() {
            self.nodes[prev.index()].is_selected = false;
        }
        if let Some(id) = id.filter(|id| self.contains(*id)) {
            self.nodes[id.index()].is_selected = true;
            self.selected = Some(id);
        }
    }

    /// Node ids in depth-first pre-order starting at the root.
    pub fn iter_depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    /// First node in depth-first order whose pick color matches `color`
    /// within the pick tolerance.
    pub fn find_by_pick_color(&self, color: Color) -> Option<NodeId> {
        self.iter_depth_first()
            .find(|&id| self.node(id).pick_color.approx_rgb_eq(&color, PICK_TOLERANCE))
    }
}

/// Iterator returned by [`NodeTree::iter_depth_first`].
pub struct DepthFirst<'a> {
    tree: &'a NodeTree,
    stack: Vec<NodeId>,
}

impl Iterator for DepthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
