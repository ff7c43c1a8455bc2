//! Depth model and render-and-pick engine for inspecting captured view
//! hierarchies in 2D and 3D.
//!
//! A capture is parsed into a [`NodeTree`], resolved into stacking depths by
//! the [`resolver`], and drawn by an [`Inspector`] through a
//! [`RenderBackend`](renderer::RenderBackend). The perspective view spreads
//! overlapping views apart along Z, and the orthographic view can tint areas
//! that are drawn several times. Clicking a pixel finds the view on top.
//!
//! ```no_run
//! use hierarchy_inspector::prelude::*;
//!
//! let xml = std::fs::read_to_string("capture.xml").unwrap();
//! let config = InspectorConfig::default();
//! let tree = parse_capture(&xml, config.clear_color).unwrap();
//!
//! let mut inspector = Inspector::with_config(SoftwareBackend::new(800, 600), config);
//! let events = inspector.subscribe();
//! inspector.initialize(tree);
//! inspector.handle_pointer(PointerEvent::Down(Point::new(400.0, 300.0)));
//! inspector.handle_pointer(PointerEvent::Up(Point::new(400.0, 300.0)));
//! if let Ok(InspectorEvent::NodeSelected(id)) = events.try_recv() {
//!     println!("selected {}", inspector.tree().unwrap().node(id).name);
//! }
//! ```

pub mod camera;
pub mod capture;
pub mod config;
pub mod drawable;
pub mod error;
pub mod geometry;
pub mod inspector;
pub mod pick_color;
pub mod renderer;
pub mod resolver;
pub mod transform;
pub mod tree;

pub use camera::{Camera, ProjectionMode};
pub use capture::parse_capture;
pub use config::{DisplayOptions, InspectorConfig};
pub use error::{CaptureError, GpuError, TreeError};
pub use inspector::{Inspector, InspectorEvent, PointerEvent, ToolbarEvent};
pub use tree::{Node, NodeId, NodeTree, Visibility};

pub mod prelude {
    pub use crate::camera::{Camera, ProjectionMode};
    pub use crate::capture::parse_capture;
    pub use crate::config::{DisplayOptions, InspectorConfig};
    pub use crate::drawable::Drawable;
    pub use crate::error::{CaptureError, GpuError, TreeError};
    pub use crate::geometry::{Color, Insets, Point, Rect};
    pub use crate::inspector::{Inspector, InspectorEvent, PointerEvent, ToolbarEvent};
    pub use crate::renderer::{GpuBackend, GpuContext, RenderBackend, SoftwareBackend};
    pub use crate::tree::{Node, NodeId, NodeTree, Visibility};
}
