// Copyright (c) 2026 rezky_nightky

//! Ordered glyph ramps and the brightness → glyph mapping.

use crate::error::{FxError, FxResult};

pub const EMPTY_GLYPH: char = ' ';

const PRESETS: &[(&str, &str, &str)] = &[
    ("standard", " .:-=+*#%@", "Classic ten-step ramp"),
    (
        "detailed",
        " .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B$@",
        "Long ramp for large grids",
    ),
    ("blocks", " ░▒▓█", "Shade blocks"),
    ("dots", " ·•●", "Dots of increasing weight"),
    ("binary", " 01", "Zero and one"),
    ("shapes", " .:+x*X#", "Sparse punctuation up to hashes"),
];

/// Glyphs ordered from sparsest to densest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ramp {
    glyphs: Vec<char>,
}

impl Ramp {
    pub fn new(glyphs: &str) -> FxResult<Self> {
        let glyphs: Vec<char> = glyphs.chars().filter(|c| !c.is_control()).collect();
        if glyphs.is_empty() {
            return Err(FxError::ramp("needs at least one glyph"));
        }
        Ok(Self { glyphs })
    }

    pub fn preset(name: &str) -> FxResult<Self> {
        let name = name.trim().to_ascii_lowercase();
        PRESETS
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, glyphs, _)| Self {
                glyphs: glyphs.chars().collect(),
            })
            .ok_or_else(|| FxError::ramp(format!("unknown preset {} (see --list-ramps)", name)))
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// `floor(b * (len - 1))`, with `b` clamped to [0, 1] and NaN read as 0.
    pub fn index(&self, brightness: f32) -> usize {
        glyph_index(brightness, self.len())
    }

    pub fn glyph(&self, brightness: f32) -> char {
        self.glyphs[self.index(brightness)]
    }

    /// Glyphs usable for noise; the empty glyph is never picked.
    pub fn visible(&self) -> &[char] {
        if self.glyphs.len() > 1 && is_empty_glyph(self.glyphs[0]) {
            &self.glyphs[1..]
        } else {
            &self.glyphs
        }
    }
}

pub fn glyph_index(brightness: f32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let b = if brightness.is_nan() {
        0.0
    } else {
        brightness.clamp(0.0, 1.0)
    };
    let idx = (b * (len - 1) as f32).floor() as usize;
    idx.min(len - 1)
}

pub fn is_empty_glyph(ch: char) -> bool {
    ch == EMPTY_GLYPH
}

pub fn print_list_ramps() {
    println!("AVAILABLE RAMPS:");
    println!();
    println!("VALUE        GLYPHS");
    for (name, glyphs, desc) in PRESETS {
        println!("{:<12} \"{}\"  {}", name, glyphs, desc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn endpoints_map_to_first_and_last_glyph() {
        let r = Ramp::preset("standard").unwrap();
        assert_eq!(r.glyph(0.0), ' ');
        assert_eq!(r.glyph(1.0), '@');
        assert_eq!(r.index(1.0), r.len() - 1);
    }

    #[test]
    fn out_of_range_brightness_is_clamped() {
        let r = Ramp::new(" .#").unwrap();
        assert_eq!(r.glyph(-4.0), ' ');
        assert_eq!(r.glyph(7.5), '#');
        assert_eq!(r.glyph(f32::NAN), ' ');
    }

    #[test]
    fn index_floors_instead_of_rounding() {
        // 0.99 * 2 = 1.98 floors to 1
        let r = Ramp::new(" .#").unwrap();
        assert_eq!(r.glyph(0.99), '.');
    }

    #[test]
    fn single_glyph_ramp_always_returns_it() {
        let r = Ramp::new("#").unwrap();
        assert_eq!(r.glyph(0.0), '#');
        assert_eq!(r.glyph(1.0), '#');
        assert_eq!(r.visible(), &['#']);
    }

    #[test]
    fn empty_ramp_is_rejected() {
        assert!(Ramp::new("").is_err());
        assert!(Ramp::preset("nope").is_err());
    }

    #[test]
    fn visible_skips_the_empty_glyph() {
        let r = Ramp::preset("blocks").unwrap();
        assert!(!r.visible().contains(&' '));
        assert_eq!(r.visible().len(), r.len() - 1);
    }

    #[test]
    fn every_preset_is_ordered_from_empty() {
        for (name, _, _) in PRESETS {
            let r = Ramp::preset(name).unwrap();
            assert!(is_empty_glyph(r.glyph(0.0)), "{name}");
        }
    }

    proptest! {
        #[test]
        fn glyph_index_never_leaves_the_ramp(b in any::<f32>(), len in 1usize..256) {
            let i = glyph_index(b, len);
            prop_assert!(i < len);
        }

        #[test]
        fn glyph_index_is_monotonic(a in 0.0f32..=1.0, b in 0.0f32..=1.0, len in 1usize..64) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(glyph_index(lo, len) <= glyph_index(hi, len));
        }
    }
}
