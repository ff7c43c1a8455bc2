//! Unique per-node colors for the off-screen picking pass.
//!
//! Colors are drawn from a fixed 10x10x10 palette with channel values
//! `0.1, 0.2, ..., 1.0`, enumerated blue fastest, then green, then red.
//! Any entry that a read-back clear pixel could match is skipped, so the
//! background can never be mistaken for a node.

use crate::error::TreeError;
use crate::geometry::Color;

/// Channel values of the palette.
pub const PALETTE_LEVELS: [f32; 10] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Total number of palette entries before the clear color is excluded.
pub const PALETTE_SIZE: usize = PALETTE_LEVELS.len() * PALETTE_LEVELS.len() * PALETTE_LEVELS.len();

/// Per-channel tolerance when matching a read-back pixel against a pick color.
///
/// Palette entries are 0.1 apart, so this absorbs 8-bit framebuffer
/// quantization without ever matching a neighbour.
pub const PICK_TOLERANCE: f32 = 0.01;

/// Distance from the clear color inside which a palette entry is skipped:
/// the pick tolerance plus one 8-bit quantization step.
const CLEAR_MARGIN: f32 = PICK_TOLERANCE + 1.0 / 255.0;

/// Hands out pick colors in palette order.
#[derive(Debug, Clone)]
pub struct PickColorAllocator {
    clear_color: Color,
    next: usize,
    issued: usize,
}

impl PickColorAllocator {
    pub fn new(clear_color: Color) -> Self {
        Self {
            clear_color,
            next: 0,
            issued: 0,
        }
    }

    /// Number of distinct colors this allocator can issue in total.
    pub fn capacity(&self) -> usize {
        (0..PALETTE_SIZE)
            .filter(|&i| !self.collides_with_clear(palette_entry(i)))
            .count()
    }

    /// Number of colors issued so far.
    pub fn issued(&self) -> usize {
        self.issued
    }

    /// Return the next unused color, or an error once the palette is spent.
    pub fn next_color(&mut self) -> Result<Color, TreeError> {
        while self.next < PALETTE_SIZE {
            let color = palette_entry(self.next);
            self.next += 1;
            if self.collides_with_clear(color) {
                continue;
            }
            self.issued += 1;
            return Ok(color);
        }
        Err(TreeError::PaletteExhausted {
            capacity: self.capacity(),
        })
    }

    fn collides_with_clear(&self, color: Color) -> bool {
        color.approx_rgb_eq(&self.clear_color, CLEAR_MARGIN)
    }
}

/// Palette entry `index`, where blue varies fastest.
pub fn palette_entry(index: usize) -> Color {
    let levels = PALETTE_LEVELS.len();
    let red = (index / (levels * levels)) % levels;
    let green = (index / levels) % levels;
    let blue = index % levels;
    Color::rgb(
        PALETTE_LEVELS[red],
        PALETTE_LEVELS[green],
        PALETTE_LEVELS[blue],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_order() {
        assert_eq!(palette_entry(0), Color::rgb(0.1, 0.1, 0.1));
        assert_eq!(palette_entry(1), Color::rgb(0.1, 0.1, 0.2));
        assert_eq!(palette_entry(10), Color::rgb(0.1, 0.2, 0.1));
        assert_eq!(palette_entry(100), Color::rgb(0.2, 0.1, 0.1));
        assert_eq!(palette_entry(999), Color::rgb(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_skips_clear_color() {
        let clear = Color::rgb(0.1, 0.1, 0.2);
        let mut alloc = PickColorAllocator::new(clear);
        assert_eq!(alloc.next_color().unwrap(), Color::rgb(0.1, 0.1, 0.1));
        assert_eq!(alloc.next_color().unwrap(), Color::rgb(0.1, 0.1, 0.3));
    }

    #[test]
    fn test_skips_entry_near_clear_color() {
        let clear = Color::rgb(0.205, 0.205, 0.205);
        let alloc = PickColorAllocator::new(clear);
        assert_eq!(alloc.capacity(), 999);

        let mut alloc = alloc;
        let quantized = Color::from_argb(0xff34_3434);
        for _ in 0..999 {
            let c = alloc.next_color().unwrap();
            assert_ne!(c, Color::rgb(0.2, 0.2, 0.2));
            assert!(!c.approx_rgb_eq(&quantized, PICK_TOLERANCE));
        }
    }

    #[test]
    fn test_capacity_depends_on_clear_color() {
        assert_eq!(PickColorAllocator::new(Color::rgb(0.2, 0.2, 0.2)).capacity(), 999);
        assert_eq!(PickColorAllocator::new(Color::rgb(0.0, 0.0, 0.0)).capacity(), 1000);
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let mut alloc = PickColorAllocator::new(Color::rgb(0.0, 0.0, 0.0));
        let mut seen = Vec::new();
        for _ in 0..1000 {
            let c = alloc.next_color().unwrap();
            assert!(!seen.iter().any(|s: &Color| s.approx_rgb_eq(&c, PICK_TOLERANCE)));
            seen.push(c);
        }
        assert_eq!(
            alloc.next_color(),
            Err(TreeError::PaletteExhausted { capacity: 1000 })
        );
        assert_eq!(alloc.issued(), 1000);
    }
}
