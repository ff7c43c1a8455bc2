//! Error types for tree construction, capture ingestion and GPU setup.
//!
//! Rendering and picking never fail: they degrade to a no-op or `None`
//! and log instead. Only the steps that happen before an inspector is
//! initialised return these errors.

use thiserror::Error;

use crate::tree::NodeId;

/// Errors raised while building a [`NodeTree`](crate::tree::NodeTree).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Every palette entry that differs from the clear color is in use.
    #[error("pick color palette exhausted after {capacity} nodes")]
    PaletteExhausted { capacity: usize },

    #[error("parent node {0:?} does not exist")]
    MissingParent(NodeId),

    #[error("tree already has a root node")]
    RootAlreadySet,
}

/// Errors raised while reading a captured hierarchy.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("malformed capture xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("invalid value {value:?} for attribute `{attribute}`")]
    InvalidValue { attribute: &'static str, value: String },

    #[error("node `{0}` has no visibility attribute")]
    MissingVisibility(String),

    #[error("capture contains no nodes")]
    Empty,

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Errors raised while creating the GPU device or a window surface.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("window handle unavailable: {0}")]
    Handle(#[from] raw_window_handle::HandleError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}
