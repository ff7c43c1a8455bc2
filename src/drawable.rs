//! Background and content payloads attached to nodes.
//!
//! Captures carry drawables as strings: a `#AARRGGBB` color, a base64
//! PNG with a `data:image/png;base64,` prefix, or nothing at all.

use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::geometry::Color;

/// Prefix stripped from embedded image payloads before decoding.
pub const IMAGE_DATA_PREFIX: &str = "data:image/png;base64,";

static COLOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{8})$").expect("color pattern is valid")
});

/// What a node draws for its background or content.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Drawable {
    #[default]
    None,
    /// A flat fill.
    Color(Color),
    /// Encoded image bytes, decoded when the renderer realizes textures.
    Image(Vec<u8>),
}

impl Drawable {
    /// Parse a background attribute: colors are recognised, anything else
    /// is treated as an image.
    pub fn parse_background(value: Option<&str>) -> Self {
        let Some(value) = non_null(value) else {
            return Drawable::None;
        };
        if let Some(caps) = COLOR_PATTERN.captures(value) {
            if let Ok(argb) = u32::from_str_radix(&caps[1], 16) {
                return Drawable::Color(Color::from_argb(argb));
            }
        }
        Self::decode_image(value)
    }

    /// Parse a content attribute, which is always an image.
    pub fn parse_content(value: Option<&str>) -> Self {
        match non_null(value) {
            Some(value) => Self::decode_image(value),
            None => Drawable::None,
        }
    }

    fn decode_image(value: &str) -> Self {
        let payload = value.strip_prefix(IMAGE_DATA_PREFIX).unwrap_or(value);
        match base64::engine::general_purpose::STANDARD.decode(payload.trim()) {
            Ok(bytes) if !bytes.is_empty() => Drawable::Image(bytes),
            Ok(_) => Drawable::None,
            Err(err) => {
                log::debug!("Dropping undecodable image payload: {}", err);
                Drawable::None
            }
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Drawable::None)
    }
}

fn non_null(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != "null")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_null_are_none() {
        assert_eq!(Drawable::parse_background(None), Drawable::None);
        assert_eq!(Drawable::parse_background(Some("")), Drawable::None);
        assert_eq!(Drawable::parse_background(Some("null")), Drawable::None);
        assert_eq!(Drawable::parse_content(Some("null")), Drawable::None);
    }

    #[test]
    fn test_background_color() {
        let d = Drawable::parse_background(Some("#FF00FF00"));
        assert_eq!(d, Drawable::Color(Color::rgba(0.0, 1.0, 0.0, 1.0)));
    }

    #[test]
    fn test_background_image_strips_prefix() {
        let d = Drawable::parse_background(Some("data:image/png;base64,AQID"));
        assert_eq!(d, Drawable::Image(vec![1, 2, 3]));
    }

    #[test]
    fn test_content_color_string_is_not_a_color() {
        // "#FF00FF00" is not valid base64, so it resolves to nothing
        assert_eq!(Drawable::parse_content(Some("#FF00FF00")), Drawable::None);
    }

    #[test]
    fn test_malformed_payload_is_none() {
        assert_eq!(
            Drawable::parse_background(Some("data:image/png;base64,@@not-base64@@")),
            Drawable::None
        );
    }
}
