//! Interactive controller tying a tree, a camera and a backend together.
//!
//! The [`Inspector`] owns everything needed to render a captured hierarchy.
//! It reacts to toolbar and pointer input, re-renders after each change, and
//! reports selection and check changes to subscribers over channels.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::camera::{Camera, ProjectionMode};
use crate::config::{DisplayOptions, InspectorConfig};
use crate::geometry::{Color, Point};
use crate::renderer::{build_frame, DrawableCache, FramePurpose, RenderBackend, SceneParams};
use crate::resolver;
use crate::tree::{NodeId, NodeTree};

/// Buttons of the canvas toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarEvent {
    /// Switch between the perspective and orthographic views.
    Toggle3d,
    ToggleBounds,
    ToggleDepth,
    ToggleOverdraw,
    ToggleSplitContent,
    /// Restore the default camera. Display options are kept.
    Reset,
}

impl ToolbarEvent {
    pub const ALL: [ToolbarEvent; 6] = [
        ToolbarEvent::Toggle3d,
        ToolbarEvent::ToggleBounds,
        ToolbarEvent::ToggleDepth,
        ToolbarEvent::ToggleOverdraw,
        ToolbarEvent::ToggleSplitContent,
        ToolbarEvent::Reset,
    ];

    /// Whether the button has any effect in `mode`.
    ///
    /// Bounds and overdraw only show in the orthographic view, depth and
    /// split content only in perspective.
    pub fn is_enabled_in(self, mode: ProjectionMode) -> bool {
        match self {
            ToolbarEvent::ToggleBounds | ToolbarEvent::ToggleOverdraw => {
                mode == ProjectionMode::Orthographic
            }
            ToolbarEvent::ToggleDepth | ToolbarEvent::ToggleSplitContent => {
                mode == ProjectionMode::Perspective
            }
            ToolbarEvent::Toggle3d | ToolbarEvent::Reset => true,
        }
    }

    /// Label of the mode toggle: the mode it switches to.
    pub fn toggle_label(mode: ProjectionMode) -> &'static str {
        match mode {
            ProjectionMode::Perspective => "2D",
            ProjectionMode::Orthographic => "3D",
        }
    }

    fn option(self) -> Option<DisplayOptions> {
        match self {
            ToolbarEvent::ToggleBounds => Some(DisplayOptions::SHOW_BOUNDS),
            ToolbarEvent::ToggleDepth => Some(DisplayOptions::SHOW_DEPTH),
            ToolbarEvent::ToggleOverdraw => Some(DisplayOptions::SHOW_OVERDRAW),
            ToolbarEvent::ToggleSplitContent => Some(DisplayOptions::SPLIT_CONTENT),
            ToolbarEvent::Toggle3d | ToolbarEvent::Reset => None,
        }
    }
}

/// Pointer input in canvas pixels, origin at the top left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    /// Wheel steps, positive away from the user.
    Wheel { count: f32, position: Point },
    /// The pointer left the canvas.
    Exit,
}

/// Notifications sent to [`Inspector::subscribe`] receivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectorEvent {
    /// A click landed on a node.
    NodeSelected(NodeId),
    /// A node was shown or hidden through [`Inspector::set_checked`].
    NodeChecked { id: NodeId, checked: bool },
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    down: Point,
    last: Point,
    picked: Option<NodeId>,
}

pub struct Inspector<B: RenderBackend> {
    config: InspectorConfig,
    backend: B,
    tree: Option<NodeTree>,
    drawables: DrawableCache,
    camera: Camera,
    options: DisplayOptions,
    drag: Option<DragState>,
    subscribers: Vec<Sender<InspectorEvent>>,
}

impl<B: RenderBackend> Inspector<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, InspectorConfig::default())
    }

    pub fn with_config(backend: B, config: InspectorConfig) -> Self {
        let camera = Camera::new(&config);
        let options = config.initial_options;
        Self {
            config,
            backend,
            tree: None,
            drawables: DrawableCache::new(),
            camera,
            options,
            drag: None,
            subscribers: Vec::new(),
        }
    }

    /// Bind a new tree: upload its images, resolve depths and render.
    ///
    /// Textures of the previously bound tree are released first.
    pub fn initialize(&mut self, mut tree: NodeTree) {
        self.drawables.clear();
        self.backend.release_textures();
        self.drag = None;

        self.drawables = DrawableCache::realize(&tree, &mut self.backend);
        resolver::resolve(&mut tree);
        log::info!(
            "Bound tree with {} nodes, {} textures",
            tree.len(),
            self.drawables.texture_count()
        );

        self.tree = Some(tree);
        self.refresh();
    }

    /// Color the canvas is cleared to. Pick colors never collide with it.
    pub fn clear_color(&self) -> Color {
        self.config.clear_color
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn tree(&self) -> Option<&NodeTree> {
        self.tree.as_ref()
    }

    /// Mutable access for visibility and selection edits. Call
    /// [`Inspector::relayout`] after changes that affect depth.
    pub fn tree_mut(&mut self) -> Option<&mut NodeTree> {
        self.tree.as_mut()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn options(&self) -> DisplayOptions {
        self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Receive selection and check notifications from now on.
    pub fn subscribe(&mut self) -> Receiver<InspectorEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: InspectorEvent) {
        log::debug!("Emitting {:?}", event);
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
        self.refresh();
    }

    /// Recompute max bounds and depths, then render.
    pub fn relayout(&mut self) {
        if let Some(tree) = self.tree.as_mut() {
            resolver::resolve(tree);
        }
        self.refresh();
    }

    /// Show or hide a node, re-resolve and render. The subtree of a hidden
    /// node is not drawn.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        let Some(tree) = self.tree.as_mut().filter(|tree| tree.contains(id)) else {
            return;
        };
        tree.set_checked(id, checked);
        self.emit(InspectorEvent::NodeChecked { id, checked });
        self.relayout();
    }

    /// Select a node (or clear the selection) and render.
    pub fn select(&mut self, id: Option<NodeId>) {
        if let Some(tree) = self.tree.as_mut() {
            tree.set_selected(id);
        }
        self.refresh();
    }

    /// Render the current state and present it.
    pub fn refresh(&mut self) {
        if self.render(FramePurpose::Display) {
            self.backend.present();
        }
    }

    fn render(&mut self, purpose: FramePurpose) -> bool {
        let (width, height) = self.backend.size();
        let Some(tree) = self.tree.as_ref() else {
            return false;
        };
        if width == 0 || height == 0 {
            return false;
        }

        let frame = build_frame(&SceneParams {
            tree,
            camera: &self.camera,
            options: self.options,
            drawables: &self.drawables,
            width,
            height,
            clear_color: self.config.clear_color,
            purpose,
        });
        self.backend.draw(&frame);
        true
    }

    /// Node drawn on top at `point`, or `None` over the background.
    ///
    /// Draws an off-screen pick frame that replaces the backend's current
    /// contents without presenting it.
    pub fn pick(&mut self, point: Point) -> Option<NodeId> {
        if point.x < 0.0 || point.y < 0.0 || !point.x.is_finite() || !point.y.is_finite() {
            return None;
        }
        if !self.render(FramePurpose::Pick) {
            return None;
        }

        let color = self.backend.read_pixel(point.x as u32, point.y as u32)?;
        let hit = self.tree.as_ref()?.find_by_pick_color(color);
        log::debug!("Picked {:?} at ({}, {})", hit, point.x, point.y);
        hit
    }

    pub fn handle_toolbar_event(&mut self, event: ToolbarEvent) {
        match event {
            ToolbarEvent::Toggle3d => self.camera.toggle_mode(),
            ToolbarEvent::Reset => self.camera.reset(),
            _ => {
                if let Some(flag) = event.option() {
                    self.options.toggle(flag);
                }
            }
        }
        self.refresh();
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(point) => {
                let picked = self.pick(point);
                self.drag = Some(DragState {
                    down: point,
                    last: point,
                    picked,
                });
            }
            PointerEvent::Move(point) => {
                let Some(drag) = self.drag.as_mut() else {
                    return;
                };
                let (dx, dy) = (point.x - drag.last.x, point.y - drag.last.y);
                drag.last = point;
                let rotate = drag.picked.is_none();

                let Some(root) = self.root_bounds() else {
                    return;
                };
                self.camera.drag(dx, dy, rotate, root);
                self.refresh();
            }
            PointerEvent::Up(point) => {
                let Some(drag) = self.drag.take() else {
                    return;
                };
                let slop = self.config.touch_slop;
                let is_click =
                    (point.x - drag.down.x).abs() < slop && (point.y - drag.down.y).abs() < slop;
                if let (true, Some(id)) = (is_click, drag.picked) {
                    self.emit(InspectorEvent::NodeSelected(id));
                    self.select(Some(id));
                }
            }
            PointerEvent::Wheel { count, .. } => {
                let Some(tree) = self.tree.as_ref() else {
                    return;
                };
                let Some(root) = tree.root() else {
                    return;
                };
                let max_bounds = tree.node(root).max_bounds();
                let viewport = self.backend.size();
                self.camera.zoom(count, &self.config, viewport, max_bounds);
                self.refresh();
            }
            PointerEvent::Exit => self.drag = None,
        }
    }

    fn root_bounds(&self) -> Option<crate::geometry::Rect> {
        let tree = self.tree.as_ref()?;
        Some(tree.node(tree.root()?).bounds)
    }
}

impl<B: RenderBackend> Drop for Inspector<B> {
    fn drop(&mut self) {
        self.drawables.clear();
        self.backend.release_textures();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::Drawable;
    use crate::geometry::Rect;
    use crate::renderer::SoftwareBackend;
    use crate::tree::Node;

    /// Root 100x100 with a 40x40 child at (10, 10), both with solid
    /// backgrounds, shown in a 200x100 orthographic canvas. The root lands
    /// at x 50..150.
    fn ortho_inspector() -> (Inspector<SoftwareBackend>, NodeId, NodeId) {
        let config = InspectorConfig::default().initial_mode(ProjectionMode::Orthographic);
        let mut tree = NodeTree::new(config.clear_color);
        let root = tree
            .add_root(
                Node::new("root", Rect::new(0, 0, 100, 100))
                    .with_background(Drawable::Color(Color::rgb(1.0, 1.0, 1.0))),
            )
            .unwrap();
        let child = tree
            .add_child(
                root,
                Node::new("child", Rect::new(10, 10, 40, 40))
                    .with_background(Drawable::Color(Color::rgb(0.0, 0.0, 1.0))),
            )
            .unwrap();

        let mut inspector = Inspector::with_config(SoftwareBackend::new(200, 100), config);
        inspector.initialize(tree);
        (inspector, root, child)
    }

    #[test]
    fn test_toolbar_gating() {
        assert!(ToolbarEvent::ToggleBounds.is_enabled_in(ProjectionMode::Orthographic));
        assert!(!ToolbarEvent::ToggleBounds.is_enabled_in(ProjectionMode::Perspective));
        assert!(ToolbarEvent::ToggleDepth.is_enabled_in(ProjectionMode::Perspective));
        assert!(!ToolbarEvent::ToggleSplitContent.is_enabled_in(ProjectionMode::Orthographic));
        assert!(ToolbarEvent::Reset.is_enabled_in(ProjectionMode::Orthographic));
        assert_eq!(ToolbarEvent::toggle_label(ProjectionMode::Perspective), "2D");
        assert_eq!(ToolbarEvent::toggle_label(ProjectionMode::Orthographic), "3D");
    }

    #[test]
    fn test_toggle_options() {
        let (mut inspector, _, _) = ortho_inspector();
        assert!(inspector.options().contains(DisplayOptions::SHOW_BOUNDS));
        inspector.handle_toolbar_event(ToolbarEvent::ToggleBounds);
        assert!(!inspector.options().contains(DisplayOptions::SHOW_BOUNDS));
        inspector.handle_toolbar_event(ToolbarEvent::ToggleBounds);
        assert!(inspector.options().contains(DisplayOptions::SHOW_BOUNDS));
    }

    #[test]
    fn test_pick_nodes_and_background() {
        let (mut inspector, root, child) = ortho_inspector();
        assert_eq!(inspector.pick(Point::new(80.0, 30.0)), Some(child));
        assert_eq!(inspector.pick(Point::new(140.0, 90.0)), Some(root));
        assert_eq!(inspector.pick(Point::new(10.0, 50.0)), None);
        assert_eq!(inspector.pick(Point::new(-1.0, 50.0)), None);
        assert_eq!(inspector.pick(Point::new(500.0, 50.0)), None);
    }

    #[test]
    fn test_pick_without_tree() {
        let mut inspector = Inspector::new(SoftwareBackend::new(10, 10));
        assert_eq!(inspector.pick(Point::new(1.0, 1.0)), None);
        inspector.refresh();
        assert_eq!(inspector.backend().presented_frames(), 0);
    }

    #[test]
    fn test_click_selects_and_notifies() {
        let (mut inspector, _, child) = ortho_inspector();
        let events = inspector.subscribe();

        inspector.handle_pointer(PointerEvent::Down(Point::new(80.0, 30.0)));
        inspector.handle_pointer(PointerEvent::Up(Point::new(81.0, 31.0)));

        assert_eq!(events.try_recv(), Ok(InspectorEvent::NodeSelected(child)));
        assert_eq!(inspector.tree().unwrap().selected(), Some(child));
    }

    #[test]
    fn test_drag_does_not_select() {
        let (mut inspector, _, _) = ortho_inspector();
        let events = inspector.subscribe();

        inspector.handle_pointer(PointerEvent::Down(Point::new(80.0, 30.0)));
        inspector.handle_pointer(PointerEvent::Move(Point::new(90.0, 35.0)));
        inspector.handle_pointer(PointerEvent::Up(Point::new(90.0, 35.0)));

        assert!(events.try_recv().is_err());
        assert_eq!(inspector.camera().ortho_translate(), (10.0, 5.0));
    }

    #[test]
    fn test_move_without_press_is_ignored() {
        let (mut inspector, _, _) = ortho_inspector();
        inspector.handle_pointer(PointerEvent::Move(Point::new(90.0, 35.0)));
        assert_eq!(inspector.camera().ortho_translate(), (0.0, 0.0));

        inspector.handle_pointer(PointerEvent::Down(Point::new(80.0, 30.0)));
        inspector.handle_pointer(PointerEvent::Exit);
        inspector.handle_pointer(PointerEvent::Move(Point::new(90.0, 35.0)));
        assert_eq!(inspector.camera().ortho_translate(), (0.0, 0.0));
    }

    #[test]
    fn test_set_checked_hides_and_notifies() {
        let (mut inspector, _, child) = ortho_inspector();
        let events = inspector.subscribe();

        inspector.set_checked(child, false);
        assert_eq!(
            events.try_recv(),
            Ok(InspectorEvent::NodeChecked {
                id: child,
                checked: false
            })
        );
        assert_eq!(inspector.pick(Point::new(80.0, 30.0)), inspector.tree().unwrap().root());
    }

    #[test]
    fn test_reset_keeps_mode_and_options() {
        let (mut inspector, _, _) = ortho_inspector();
        inspector.handle_toolbar_event(ToolbarEvent::ToggleOverdraw);
        inspector.handle_pointer(PointerEvent::Wheel {
            count: 10.0,
            position: Point::new(0.0, 0.0),
        });
        assert!((inspector.camera().ortho_scale() - 1.1).abs() < 1e-4);

        inspector.handle_toolbar_event(ToolbarEvent::Reset);
        assert_eq!(inspector.camera().ortho_scale(), 1.0);
        assert!(inspector.camera().is_ortho());
        assert!(!inspector.options().contains(DisplayOptions::SHOW_OVERDRAW));
    }
}
