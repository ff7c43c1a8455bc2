//! Reading captured view hierarchies.
//!
//! A capture is an XML document where every element with a `name`
//! attribute is a view. Nesting gives the hierarchy; elements without a
//! name are transparent and their named descendants attach to the nearest
//! named ancestor.
//!
//! ```xml
//! <node name="FrameLayout" bounds="[0,0][480,800]" padding="[0,0][0,0]"
//!       visibility="1" background="#ff202020" scroll-x="0" scroll-y="0">
//!   <node name="TextView" bounds="[10,10][200,40]" visibility="1"
//!         content="data:image/png;base64,..."/>
//! </node>
//! ```
//!
//! `bounds` is `[x,y][width,height]` relative to the parent; `padding`,
//! `margin` and `drawable-padding` use the same form for left, top, right
//! and bottom.

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::drawable::Drawable;
use crate::error::CaptureError;
use crate::geometry::{Color, Insets, Rect};
use crate::resolver;
use crate::tree::{Node, NodeId, NodeTree, Visibility};

static BOX_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]$").expect("box pattern is valid")
});

/// Parse `xml` into a resolved tree whose pick colors avoid `clear_color`.
pub fn parse_capture(xml: &str, clear_color: Color) -> Result<NodeTree, CaptureError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut tree = NodeTree::new(clear_color);
    // One entry per open element; `None` for elements that are not views.
    let mut open: Vec<Option<NodeId>> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let id = add_element(&mut tree, &open, e)?;
                open.push(id);
            }
            Event::Empty(ref e) => {
                add_element(&mut tree, &open, e)?;
            }
            Event::End(_) => {
                open.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if tree.root().is_none() {
        return Err(CaptureError::Empty);
    }

    resolver::resolve(&mut tree);
    log::info!("Parsed capture with {} nodes", tree.len());
    Ok(tree)
}

fn add_element(
    tree: &mut NodeTree,
    open: &[Option<NodeId>],
    e: &BytesStart,
) -> Result<Option<NodeId>, CaptureError> {
    let Some(node) = parse_node(e)? else {
        return Ok(None);
    };

    let parent = open.iter().rev().find_map(|id| *id);
    let id = match (parent, tree.root()) {
        (Some(parent), _) => tree.add_child(parent, node)?,
        (None, None) => tree.add_root(node)?,
        (None, Some(_)) => {
            log::warn!("Ignoring second top-level view `{}`", node.name);
            return Ok(None);
        }
    };
    Ok(Some(id))
}

/// Raw attribute values of one view element.
#[derive(Default)]
struct Attributes {
    name: Option<String>,
    id: Option<String>,
    bounds: Option<String>,
    padding: Option<String>,
    margin: Option<String>,
    drawable_padding: Option<String>,
    visibility: Option<String>,
    background: Option<String>,
    content: Option<String>,
    scroll_x: Option<String>,
    scroll_y: Option<String>,
    scale_x: Option<String>,
    scale_y: Option<String>,
    rotation_x: Option<String>,
    rotation_y: Option<String>,
    translation_x: Option<String>,
    translation_y: Option<String>,
}

fn parse_node(e: &BytesStart) -> Result<Option<Node>, CaptureError> {
    let mut attrs = Attributes::default();
    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        let slot = match attr.key.as_ref() {
            b"name" => &mut attrs.name,
            b"id" => &mut attrs.id,
            b"bounds" => &mut attrs.bounds,
            b"padding" => &mut attrs.padding,
            b"margin" => &mut attrs.margin,
            b"drawable-padding" => &mut attrs.drawable_padding,
            b"visibility" => &mut attrs.visibility,
            b"background" => &mut attrs.background,
            b"content" => &mut attrs.content,
            b"scroll-x" => &mut attrs.scroll_x,
            b"scroll-y" => &mut attrs.scroll_y,
            b"scale-x" => &mut attrs.scale_x,
            b"scale-y" => &mut attrs.scale_y,
            b"rotation-x" => &mut attrs.rotation_x,
            b"rotation-y" => &mut attrs.rotation_y,
            b"translation-x" => &mut attrs.translation_x,
            b"translation-y" => &mut attrs.translation_y,
            _ => continue,
        };
        *slot = Some(value);
    }

    let Some(name) = attrs.name else {
        return Ok(None);
    };

    let bounds = match attrs.bounds.as_deref() {
        Some(value) => {
            let [x, y, width, height] = parse_box("bounds", value)?;
            Rect::new(x, y, width, height)
        }
        None => Rect::default(),
    };

    let visibility = match attrs.visibility.as_deref().map(str::trim) {
        Some("1") => Visibility::Visible,
        Some("-1") => Visibility::Invisible,
        Some(value) => {
            value
                .parse::<i32>()
                .map_err(|_| CaptureError::InvalidValue {
                    attribute: "visibility",
                    value: value.to_string(),
                })?;
            Visibility::Gone
        }
        None => return Err(CaptureError::MissingVisibility(name)),
    };

    let mut node = Node::new(name, bounds)
        .with_visibility(visibility)
        .with_padding(parse_insets("padding", attrs.padding.as_deref())?)
        .with_margin(parse_insets("margin", attrs.margin.as_deref())?)
        .with_background(Drawable::parse_background(attrs.background.as_deref()))
        .with_content(Drawable::parse_content(attrs.content.as_deref()));

    if let Some(id) = attrs.id {
        node = node.with_id(id);
    }
    node.drawable_padding = parse_insets("drawable-padding", attrs.drawable_padding.as_deref())?;
    node.scroll_x = parse_float("scroll-x", attrs.scroll_x.as_deref(), 0.0)?;
    node.scroll_y = parse_float("scroll-y", attrs.scroll_y.as_deref(), 0.0)?;
    node.scale_x = parse_float("scale-x", attrs.scale_x.as_deref(), 1.0)?;
    node.scale_y = parse_float("scale-y", attrs.scale_y.as_deref(), 1.0)?;
    node.rotation_x = parse_float("rotation-x", attrs.rotation_x.as_deref(), 0.0)?;
    node.rotation_y = parse_float("rotation-y", attrs.rotation_y.as_deref(), 0.0)?;
    node.translation_x = parse_float("translation-x", attrs.translation_x.as_deref(), 0.0)?;
    node.translation_y = parse_float("translation-y", attrs.translation_y.as_deref(), 0.0)?;

    Ok(Some(node))
}

fn parse_box(attribute: &'static str, value: &str) -> Result<[i32; 4], CaptureError> {
    let invalid = || CaptureError::InvalidValue {
        attribute,
        value: value.to_string(),
    };
    let caps = BOX_PATTERN.captures(value.trim()).ok_or_else(invalid)?;
    let mut out = [0; 4];
    for (slot, group) in out.iter_mut().zip(1..=4) {
        *slot = caps[group].parse().map_err(|_| invalid())?;
    }
    Ok(out)
}

fn parse_insets(attribute: &'static str, value: Option<&str>) -> Result<Insets, CaptureError> {
    match value {
        Some(value) => {
            let [left, top, right, bottom] = parse_box(attribute, value)?;
            Ok(Insets::new(left, top, right, bottom))
        }
        None => Ok(Insets::default()),
    }
}

fn parse_float(attribute: &'static str, value: Option<&str>, default: f32) -> Result<f32, CaptureError> {
    match value {
        Some(value) => value.trim().parse().map_err(|_| CaptureError::InvalidValue {
            attribute,
            value: value.to_string(),
        }),
        None => Ok(default),
    }
}
