//! Turns a resolved tree into draw items.
//!
//! The walk mirrors how the scene is meant to be read: each shown node is
//! moved to `(x, -y, depth * depth_unit)` relative to its parent, drawn,
//! and then its children are drawn on top in list order. The same walk in
//! [`FramePurpose::Pick`] replaces every surface with the node's pick color
//! so that the pixel under the pointer names the node on top.

use super::commands::{DrawItem, StencilMode};
use super::constants::{
    BOUNDS_COLOR, FIRST_OVERDRAW_LEVEL, LAST_OVERDRAW_LEVEL, LAYER_BACKGROUND_COLOR,
    LAYER_CONTENT_COLOR, LAYER_EMPTY_COLOR, OVERDRAW_COLORS, SELECTION_COLOR,
};
use super::drawables::{DrawableCache, Realized};
use super::primitives;
use super::{Frame, FramePurpose};
use crate::camera::Camera;
use crate::config::DisplayOptions;
use crate::geometry::Color;
use crate::transform::Transform;
use crate::tree::{NodeId, NodeTree};

/// Width of the selected node's outline in the orthographic view.
const SELECTED_LINE_WIDTH: f32 = 2.0;

/// Inputs for [`build_frame`].
pub struct SceneParams<'a> {
    pub tree: &'a NodeTree,
    pub camera: &'a Camera,
    pub options: DisplayOptions,
    pub drawables: &'a DrawableCache,
    pub width: u32,
    pub height: u32,
    pub clear_color: Color,
    pub purpose: FramePurpose,
}

/// Build the frame for the current state. An empty tree gives a frame
/// that only clears.
pub fn build_frame(params: &SceneParams<'_>) -> Frame {
    let mut builder = SceneBuilder {
        params,
        projection: params.camera.projection(params.width, params.height),
        depth_unit: params.camera.depth_unit(),
        items: Vec::new(),
    };

    if let Some(root) = params.tree.root() {
        let root_bounds = params.tree.node(root).bounds;
        let view = params.camera.view(root_bounds, params.width);
        builder.push_node(root, view);

        if builder.shows_overdraw() {
            builder.push_overdraw(view, root);
        }
    }

    log::debug!(
        "Built {:?} frame with {} items",
        params.purpose,
        builder.items.len()
    );

    Frame {
        width: params.width,
        height: params.height,
        clear_color: params.clear_color,
        purpose: params.purpose,
        items: builder.items,
    }
}

struct SceneBuilder<'a> {
    params: &'a SceneParams<'a>,
    projection: Transform,
    depth_unit: f32,
    items: Vec<DrawItem>,
}

impl SceneBuilder<'_> {
    fn is_picking(&self) -> bool {
        self.params.purpose == FramePurpose::Pick
    }

    fn is_ortho(&self) -> bool {
        self.params.camera.is_ortho()
    }

    fn option(&self, flag: DisplayOptions) -> bool {
        self.params.options.contains(flag)
    }

    fn shows_overdraw(&self) -> bool {
        !self.is_picking() && self.is_ortho() && self.option(DisplayOptions::SHOW_OVERDRAW)
    }

    fn mvp(&self, model_view: &Transform) -> Transform {
        self.projection.then(model_view)
    }

    fn push_node(&mut self, id: NodeId, parent: Transform) {
        let tree = self.params.tree;
        let node = tree.node(id);
        if !node.has_area() || !node.is_shown() || !node.is_visible() {
            return;
        }

        let w = node.bounds.width as f32;
        let h = node.bounds.height as f32;
        let depth = node.depth() as f32 * self.depth_unit;
        let model_view = parent.then(&Transform::translate(
            node.bounds.x as f32,
            -(node.bounds.y as f32),
            depth,
        ));
        let mvp = self.mvp(&model_view);

        let background = self
            .params
            .drawables
            .background(id)
            .filter(|_| node.is_background_shown());
        let content = self
            .params
            .drawables
            .content(id)
            .filter(|_| node.is_content_shown());
        let split = self.option(DisplayOptions::SPLIT_CONTENT)
            && background.is_some()
            && content.is_some();
        let half = self.depth_unit / 2.0;
        let behind = self.mvp(&model_view.then(&Transform::translate(0.0, 0.0, -half)));

        if self.is_picking() {
            let color = node.pick_color();
            self.items
                .push(DrawItem::fill(primitives::front_face(w, h, 0.0), mvp, color).opaque());
            if self.option(DisplayOptions::SHOW_DEPTH) {
                self.items.push(
                    DrawItem::fill(primitives::slab_sides(w, h, -self.depth_unit), mvp, color)
                        .opaque(),
                );
            } else if split {
                self.items
                    .push(DrawItem::fill(primitives::front_face(w, h, -half), mvp, color).opaque());
            }
        } else {
            let perspective_depth = !self.is_ortho() && self.option(DisplayOptions::SHOW_DEPTH);
            if perspective_depth {
                self.push_depth_slab(node.is_selected(), w, h, depth, mvp, behind, background, content);
            }

            let fill_stencil = if self.shows_overdraw() {
                StencilMode::Increment
            } else {
                StencilMode::Keep
            };
            match (background, content) {
                (Some(bg), Some(fg)) => {
                    let bg_transform = if self.option(DisplayOptions::SPLIT_CONTENT) {
                        behind
                    } else {
                        mvp
                    };
                    self.push_drawable(bg, w, h, bg_transform, fill_stencil);
                    self.push_drawable(fg, w, h, mvp, fill_stencil);
                }
                (Some(d), None) | (None, Some(d)) => self.push_drawable(d, w, h, mvp, fill_stencil),
                (None, None) => {}
            }

            let (outline_color, line_width) = if perspective_depth || !node.is_selected() {
                (BOUNDS_COLOR, 1.0)
            } else {
                (SELECTION_COLOR, SELECTED_LINE_WIDTH)
            };
            if node.is_selected() || !self.is_ortho() || self.option(DisplayOptions::SHOW_BOUNDS) {
                self.items.push(
                    DrawItem::lines(primitives::front_outline(w, h, 0.0), mvp, outline_color)
                        .with_line_width(line_width),
                );
            }
            if !self.is_ortho() && !self.option(DisplayOptions::SHOW_DEPTH) && split {
                self.items.push(
                    DrawItem::lines(primitives::front_outline(w, h, -half), mvp, outline_color)
                        .with_line_width(line_width),
                );
            }
        }

        for &child in node.children() {
            self.push_node(child, model_view);
        }
    }

    /// Extruded slab behind the front face, colored by what the node draws.
    /// The wireframe runs back to the parent's plane.
    #[allow(clippy::too_many_arguments)]
    fn push_depth_slab(
        &mut self,
        selected: bool,
        w: f32,
        h: f32,
        depth: f32,
        mvp: Transform,
        behind: Transform,
        background: Option<Realized>,
        content: Option<Realized>,
    ) {
        let unit = self.depth_unit;
        if selected {
            self.items.push(DrawItem::fill(
                primitives::slab_sides(w, h, -unit),
                mvp,
                SELECTION_COLOR,
            ));
        } else if background.is_some() && content.is_some() && self.option(DisplayOptions::SPLIT_CONTENT) {
            let half = unit / 2.0;
            self.items.push(DrawItem::fill(
                primitives::slab_sides(w, h, -half),
                behind,
                LAYER_BACKGROUND_COLOR,
            ));
            self.items.push(DrawItem::fill(
                primitives::slab_sides(w, h, -half),
                mvp,
                LAYER_CONTENT_COLOR,
            ));
        } else {
            let color = if content.is_some() {
                LAYER_CONTENT_COLOR
            } else if background.is_some() {
                LAYER_BACKGROUND_COLOR
            } else {
                LAYER_EMPTY_COLOR
            };
            self.items
                .push(DrawItem::fill(primitives::slab_sides(w, h, -unit), mvp, color));
        }
        self.items.push(DrawItem::lines(
            primitives::slab_edges(w, h, -depth),
            mvp,
            BOUNDS_COLOR,
        ));
    }

    fn push_drawable(&mut self, drawable: Realized, w: f32, h: f32, mvp: Transform, stencil: StencilMode) {
        let item = match drawable {
            Realized::Color(color) => DrawItem::fill(primitives::front_face(w, h, 0.0), mvp, color),
            Realized::Texture(texture) => {
                DrawItem::fill(primitives::textured_face(w, h), mvp, Color::WHITE).with_texture(texture)
            }
        };
        self.items.push(item.with_stencil(stencil));
    }

    /// Root-sized quads tinted where the stencil count reached each level.
    fn push_overdraw(&mut self, view: Transform, root: NodeId) {
        let bounds = self.params.tree.node(root).bounds;
        let model_view = view.then(&Transform::translate(bounds.x as f32, -(bounds.y as f32), 0.0));
        let mvp = self.mvp(&model_view);
        let (w, h) = (bounds.width as f32, bounds.height as f32);

        for level in FIRST_OVERDRAW_LEVEL..=LAST_OVERDRAW_LEVEL {
            let stencil = if level == LAST_OVERDRAW_LEVEL {
                StencilMode::AtLeast(level)
            } else {
                StencilMode::Equal(level)
            };
            let color = OVERDRAW_COLORS[(level - FIRST_OVERDRAW_LEVEL) as usize];
            self.items.push(
                DrawItem::fill(primitives::front_face(w, h, 0.0), mvp, color).with_stencil(stencil),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ProjectionMode;
    use crate::config::InspectorConfig;
    use crate::geometry::Rect;
    use crate::renderer::Topology;
    use crate::tree::Node;

    fn params<'a>(
        tree: &'a NodeTree,
        camera: &'a Camera,
        drawables: &'a DrawableCache,
        options: DisplayOptions,
        purpose: FramePurpose,
    ) -> SceneParams<'a> {
        SceneParams {
            tree,
            camera,
            options,
            drawables,
            width: 100,
            height: 100,
            clear_color: Color::rgb(0.2, 0.2, 0.2),
            purpose,
        }
    }

    fn single_node_tree() -> NodeTree {
        let mut tree = NodeTree::new(Color::rgb(0.2, 0.2, 0.2));
        tree.add_root(Node::new("Root", Rect::new(0, 0, 100, 100))).unwrap();
        tree
    }

    #[test]
    fn test_empty_tree_only_clears() {
        let tree = NodeTree::new(Color::BLACK);
        let camera = Camera::new(&InspectorConfig::default());
        let cache = DrawableCache::new();
        let frame = build_frame(&params(&tree, &camera, &cache, DisplayOptions::all(), FramePurpose::Display));
        assert!(frame.items.is_empty());
    }

    #[test]
    fn test_pick_frame_is_opaque_pick_color() {
        let tree = single_node_tree();
        let camera = Camera::new(&InspectorConfig::default());
        let cache = DrawableCache::new();
        let frame = build_frame(&params(&tree, &camera, &cache, DisplayOptions::all(), FramePurpose::Pick));
        let root_color = tree.node(tree.root().unwrap()).pick_color();
        assert_eq!(frame.items.len(), 2);
        assert!(frame.items.iter().all(|i| !i.blend && i.color == root_color && i.texture.is_none()));
    }

    #[test]
    fn test_overdraw_only_in_ortho_display() {
        let tree = single_node_tree();
        let mut camera = Camera::new(&InspectorConfig::default().initial_mode(ProjectionMode::Orthographic));
        let cache = DrawableCache::new();
        let frame = build_frame(&params(&tree, &camera, &cache, DisplayOptions::all(), FramePurpose::Display));
        let tests: Vec<_> = frame
            .items
            .iter()
            .filter(|i| matches!(i.stencil, StencilMode::Equal(_) | StencilMode::AtLeast(_)))
            .map(|i| i.stencil)
            .collect();
        assert_eq!(
            tests,
            vec![
                StencilMode::Equal(2),
                StencilMode::Equal(3),
                StencilMode::Equal(4),
                StencilMode::AtLeast(5)
            ]
        );

        camera.toggle_mode();
        let frame = build_frame(&params(&tree, &camera, &cache, DisplayOptions::all(), FramePurpose::Display));
        assert!(frame.items.iter().all(|i| i.stencil == StencilMode::Keep));
    }

    #[test]
    fn test_ortho_outline_needs_bounds_or_selection() {
        let mut tree = single_node_tree();
        let camera = Camera::new(&InspectorConfig::default().initial_mode(ProjectionMode::Orthographic));
        let cache = DrawableCache::new();
        let options = DisplayOptions::empty();
        let frame = build_frame(&params(&tree, &camera, &cache, options, FramePurpose::Display));
        assert!(frame.items.is_empty());

        let root = tree.root().unwrap();
        tree.set_selected(Some(root));
        let frame = build_frame(&params(&tree, &camera, &cache, options, FramePurpose::Display));
        assert_eq!(frame.items.len(), 1);
        assert_eq!(frame.items[0].topology, Topology::Lines);
        assert_eq!(frame.items[0].color, SELECTION_COLOR);
        assert_eq!(frame.items[0].line_width, SELECTED_LINE_WIDTH);
    }

    #[test]
    fn test_hidden_node_skips_subtree() {
        let mut tree = single_node_tree();
        let root = tree.root().unwrap();
        let child = tree.add_child(root, Node::new("Child", Rect::new(0, 0, 10, 10))).unwrap();
        tree.add_child(child, Node::new("Grandchild", Rect::new(0, 0, 5, 5))).unwrap();
        tree.node_mut(child).show(false);
        let camera = Camera::new(&InspectorConfig::default());
        let cache = DrawableCache::new();
        let frame = build_frame(&params(&tree, &camera, &cache, DisplayOptions::all(), FramePurpose::Pick));
        // Only the root's face and slab remain.
        assert_eq!(frame.items.len(), 2);
    }

    #[test]
    fn test_perspective_depth_slab_and_wireframe() {
        let tree = single_node_tree();
        let camera = Camera::new(&InspectorConfig::default());
        let cache = DrawableCache::new();
        let frame = build_frame(&params(&tree, &camera, &cache, DisplayOptions::all(), FramePurpose::Display));
        // Empty slab, z wireframe, front outline.
        assert_eq!(frame.items.len(), 3);
        assert_eq!(frame.items[0].color, LAYER_EMPTY_COLOR);
        assert_eq!(frame.items[1].topology, Topology::Lines);
        assert_eq!(frame.items[2].color, BOUNDS_COLOR);
    }
}
