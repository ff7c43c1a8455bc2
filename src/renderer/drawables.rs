//! Backend resources realized for each node's background and content.
//!
//! The tree only stores payloads. When a tree is bound, every image is
//! decoded and uploaded once, and the resulting handles are kept here,
//! keyed by node, until the cache is cleared together with the backend's
//! textures. A drawable without an entry is simply not drawn.

use std::collections::HashMap;

use super::{RenderBackend, TextureHandle};
use crate::drawable::Drawable;
use crate::geometry::Color;
use crate::tree::{NodeId, NodeTree};

/// A drawable ready to be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Realized {
    Color(Color),
    Texture(TextureHandle),
}

#[derive(Debug, Default, Clone, Copy)]
struct Entry {
    background: Option<Realized>,
    content: Option<Realized>,
}

#[derive(Debug, Default)]
pub struct DrawableCache {
    entries: HashMap<NodeId, Entry>,
    textures: usize,
}

impl DrawableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Realize the drawables of every node reachable from the root.
    ///
    /// Nodes with zero area, and everything below them, are skipped because
    /// they are never drawn.
    pub fn realize<B: RenderBackend + ?Sized>(tree: &NodeTree, backend: &mut B) -> Self {
        let mut cache = Self::new();
        if let Some(root) = tree.root() {
            cache.realize_node(tree, root, backend);
        }
        log::info!(
            "Realized drawables for {} nodes ({} textures)",
            cache.entries.len(),
            cache.textures
        );
        cache
    }

    fn realize_node<B: RenderBackend + ?Sized>(&mut self, tree: &NodeTree, id: NodeId, backend: &mut B) {
        let node = tree.node(id);
        if !node.has_area() {
            return;
        }

        let entry = Entry {
            background: self.realize_one(&node.background, backend, &node.name),
            content: self.realize_one(&node.content, backend, &node.name),
        };
        if entry.background.is_some() || entry.content.is_some() {
            self.entries.insert(id, entry);
        }

        for &child in node.children() {
            self.realize_node(tree, child, backend);
        }
    }

    fn realize_one<B: RenderBackend + ?Sized>(
        &mut self,
        drawable: &Drawable,
        backend: &mut B,
        name: &str,
    ) -> Option<Realized> {
        match drawable {
            Drawable::None => None,
            Drawable::Color(color) => Some(Realized::Color(*color)),
            Drawable::Image(bytes) => {
                let image = match image::load_from_memory(bytes) {
                    Ok(image) => image.to_rgba8(),
                    Err(err) => {
                        log::warn!("Failed to decode image for {}: {}", name, err);
                        return None;
                    }
                };
                let handle = backend.upload_texture(&image);
                if handle.is_none() {
                    log::warn!("Backend rejected {}x{} texture for {}", image.width(), image.height(), name);
                }
                self.textures += handle.is_some() as usize;
                handle.map(Realized::Texture)
            }
        }
    }

    pub fn background(&self, id: NodeId) -> Option<Realized> {
        self.entries.get(&id).and_then(|e| e.background)
    }

    pub fn content(&self, id: NodeId) -> Option<Realized> {
        self.entries.get(&id).and_then(|e| e.content)
    }

    pub fn texture_count(&self) -> usize {
        self.textures
    }

    /// Forget every entry. Call alongside [`RenderBackend::release_textures`].
    pub fn clear(&mut self) {
        self.entries.clear();
        self.textures = 0;
    }
}
