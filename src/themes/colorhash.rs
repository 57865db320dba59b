use egui::Color32;

use crate::themes;

/// A small, deterministic hash for turning a category name into a stable
/// palette index. Not cryptographic.
#[derive(Clone, Copy, Debug)]
pub struct Fnv1a64(u64);

impl Fnv1a64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    pub fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub fn update(&mut self, bytes: &[u8]) {
        let mut hash = self.0;
        for b in bytes {
            hash ^= *b as u64;
            hash = hash.wrapping_mul(Self::PRIME);
        }
        self.0 = hash;
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for Fnv1a64 {
    fn default() -> Self {
        Self::new()
    }
}

pub fn hash64(bytes: &[u8]) -> u64 {
    let mut h = Fnv1a64::new();
    h.update(bytes);
    h.finish()
}

pub fn palette_index(hash: u64, palette_len: usize) -> usize {
    if palette_len == 0 {
        0
    } else {
        (hash % palette_len as u64) as usize
    }
}

/// Visually distinct RAL colors for command categories.
///
/// Avoids `RAL 2009`, the UI accent, so the active row stays legible.
pub const RAL_CATEGORICAL: &[u16] = &[
    1003, // signal yellow
    2010, // signal orange
    3014, // antique pink
    3020, // traffic red
    4008, // signal violet
    5005, // signal blue
    5015, // sky blue
    5021, // water blue
    6018, // yellow green
    6027, // light green
    6032, // signal green
    6033, // mint turquoise
];

pub fn ral_categorical_from_hash(hash: u64) -> Color32 {
    let idx = palette_index(hash, RAL_CATEGORICAL.len());
    themes::ral(RAL_CATEGORICAL[idx])
}

/// The categorical color for a command category.
pub fn category_color(category: &str) -> Color32 {
    ral_categorical_from_hash(hash64(category.as_bytes()))
}

pub fn luma(color: Color32) -> f32 {
    let r = color.r() as f32 / 255.0;
    let g = color.g() as f32 / 255.0;
    let b = color.b() as f32 / 255.0;
    0.299 * r + 0.587 * g + 0.114 * b
}

pub fn text_color_on(background: Color32) -> Color32 {
    if luma(background) > 0.55 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_matches_reference_vector() {
        // FNV-1a 64 of "a".
        assert_eq!(hash64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(hash64(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(hash64(b"foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn category_colors_are_stable() {
        assert_eq!(category_color("Panel"), category_color("Panel"));
        assert!(RAL_CATEGORICAL.contains(&2010));
        assert!(!RAL_CATEGORICAL.contains(&2009));
    }

    #[test]
    fn text_contrast_flips_on_luma() {
        assert_eq!(text_color_on(Color32::WHITE), Color32::BLACK);
        assert_eq!(text_color_on(Color32::BLACK), Color32::WHITE);
    }
}
