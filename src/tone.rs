// Copyright (c) 2026 rezky_nightky

//! Brightness → colour mapping and terminal colour quantization.

use crossterm::style::Color;

use crate::error::{FxError, FxResult};
use crate::runtime::ColorMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb::new(
            lerp_u8(self.r, other.r, t),
            lerp_u8(self.g, other.g, t),
            lerp_u8(self.b, other.b, t),
        )
    }

    pub fn scale(self, k: f32) -> Rgb {
        Rgb::BLACK.lerp(self, k)
    }

    /// Hue in degrees; 0 for grays.
    pub fn hue(self) -> f32 {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let d = max - min;
        if d <= f32::EPSILON {
            return 0.0;
        }
        let h = if max == r {
            ((g - b) / d).rem_euclid(6.0)
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        h * 60.0
    }

    /// Accepts `#rrggbb`, `rrggbb`, a colour name, or a hue in degrees.
    pub fn parse(s: &str) -> FxResult<Rgb> {
        let s = s.trim().to_ascii_lowercase();
        let named = match s.as_str() {
            "green" => Some(Rgb::new(62, 224, 122)),
            "cyan" => Some(Rgb::new(64, 208, 240)),
            "amber" | "gold" => Some(Rgb::new(255, 176, 46)),
            "magenta" | "pink" => Some(Rgb::new(240, 80, 200)),
            "red" => Some(Rgb::new(240, 70, 70)),
            "blue" => Some(Rgb::new(80, 130, 255)),
            "violet" | "purple" => Some(Rgb::new(150, 110, 255)),
            "white" => Some(Rgb::WHITE),
            _ => None,
        };
        if let Some(c) = named {
            return Ok(c);
        }

        let hex = s.strip_prefix('#').unwrap_or(&s);
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let v = u32::from_str_radix(hex, 16)
                .map_err(|_| FxError::config(format!("--accent {}", s)))?;
            return Ok(Rgb::new((v >> 16) as u8, (v >> 8) as u8, v as u8));
        }

        if let Ok(hue) = s.parse::<f32>() {
            if hue.is_finite() {
                return Ok(hsl_to_rgb(hue, 0.75, 0.6));
            }
        }

        Err(FxError::config(format!(
            "--accent {} (expected #rrggbb, a colour name or a hue)",
            s
        )))
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Rgb {
    let h = h.rem_euclid(360.0) / 60.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(to(r), to(g), to(b))
}

fn dist2(a: Rgb, b: Rgb) -> i32 {
    let dr = (a.r as i32) - (b.r as i32);
    let dg = (a.g as i32) - (b.g as i32);
    let db = (a.b as i32) - (b.b as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(c: Rgb) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let level = |v: u8| ((v as u16 * 5) + 127) / 255;
    let (r6, g6, b6) = (level(c.r), level(c.g), level(c.b));
    let cube = Rgb::new(
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );
    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);

    let avg = ((c.r as u16 + c.g as u16 + c.b as u16) / 3) as u8;
    let (gray_idx, gray) = if avg < 8 {
        (16, Rgb::BLACK)
    } else if avg > 238 {
        (231, Rgb::WHITE)
    } else {
        let i = 232 + ((avg - 8) / 10);
        let v = 8 + 10 * (i - 232);
        (i, Rgb::new(v, v, v))
    };

    if dist2(c, gray) < dist2(c, cube) {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(c: Rgb) -> Color {
    const TABLE: [(Color, Rgb); 16] = [
        (Color::Black, Rgb::new(0, 0, 0)),
        (Color::DarkGrey, Rgb::new(128, 128, 128)),
        (Color::Grey, Rgb::new(192, 192, 192)),
        (Color::White, Rgb::new(255, 255, 255)),
        (Color::DarkRed, Rgb::new(128, 0, 0)),
        (Color::Red, Rgb::new(255, 0, 0)),
        (Color::DarkGreen, Rgb::new(0, 128, 0)),
        (Color::Green, Rgb::new(0, 255, 0)),
        (Color::DarkBlue, Rgb::new(0, 0, 128)),
        (Color::Blue, Rgb::new(0, 0, 255)),
        (Color::DarkCyan, Rgb::new(0, 128, 128)),
        (Color::Cyan, Rgb::new(0, 255, 255)),
        (Color::DarkMagenta, Rgb::new(128, 0, 128)),
        (Color::Magenta, Rgb::new(255, 0, 255)),
        (Color::DarkYellow, Rgb::new(128, 128, 0)),
        (Color::Yellow, Rgb::new(255, 255, 0)),
    ];

    TABLE
        .iter()
        .min_by_key(|(_, rgb)| dist2(c, *rgb))
        .map(|(color, _)| *color)
        .unwrap_or(Color::White)
}

/// Quantizes to what the terminal can show. `None` leaves the default colour.
pub fn quantize(c: Rgb, mode: ColorMode) -> Option<Color> {
    match mode {
        ColorMode::Mono => None,
        ColorMode::TrueColor => Some(Color::Rgb {
            r: c.r,
            g: c.g,
            b: c.b,
        }),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(c))),
        ColorMode::Color16 => Some(rgb_to_color16(c)),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    pub rgb: Rgb,
    pub alpha: f32,
}

/// Two-tier gray/accent policy shared by every glyph effect.
#[derive(Clone, Copy, Debug)]
pub struct ToneMap {
    pub threshold: f32,
    /// Gray level reached right below the threshold.
    pub gray: Rgb,
    pub accent: Rgb,
    pub opacity: f32,
    pub bg: Rgb,
    pub mode: ColorMode,
}

impl ToneMap {
    pub fn new(accent: Rgb, threshold: f32, opacity: f32, mode: ColorMode) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 0.99),
            gray: Rgb::new(170, 170, 170),
            accent,
            opacity: opacity.clamp(0.0, 1.0),
            bg: Rgb::BLACK,
            mode,
        }
    }

    pub fn tone(&self, brightness: f32, mask: f32) -> Tone {
        let b = if brightness.is_nan() {
            0.0
        } else {
            brightness.clamp(0.0, 1.0)
        };
        let rgb = if b < self.threshold {
            self.gray.scale(b / self.threshold.max(f32::EPSILON))
        } else {
            let t = (b - self.threshold) / (1.0 - self.threshold);
            self.gray.lerp(self.accent, t)
        };
        Tone {
            rgb,
            alpha: (b * self.opacity * mask.clamp(0.0, 1.0)).clamp(0.0, 1.0),
        }
    }

    pub fn is_accent(&self, brightness: f32) -> bool {
        brightness >= self.threshold
    }

    /// Composites the tone over the background, then quantizes.
    pub fn color(&self, tone: Tone) -> Option<Color> {
        quantize(self.bg.lerp(tone.rgb, tone.alpha), self.mode)
    }

    pub fn bg_color(&self) -> Option<Color> {
        quantize(self.bg, self.mode)
    }
}

/// Fades toward the edges of the unit square; 1 in the centre.
pub fn vignette(nx: f32, ny: f32, strength: f32) -> f32 {
    let dx = (nx - 0.5) * 2.0;
    let dy = (ny - 0.5) * 2.0;
    let d = (dx * dx + dy * dy).sqrt() / std::f32::consts::SQRT_2;
    (1.0 - strength.clamp(0.0, 1.0) * d * d).clamp(0.0, 1.0)
}

/// Fades glyphs inside a vertical band of `width` around the centre line.
pub fn seam(nx: f32, width: f32) -> f32 {
    if width <= 0.0 {
        return 1.0;
    }
    ((nx - 0.5).abs() / width).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> ToneMap {
        ToneMap::new(Rgb::new(0, 255, 0), 0.7, 1.0, ColorMode::TrueColor)
    }

    #[test]
    fn below_threshold_is_gray() {
        let t = map().tone(0.35, 1.0);
        assert_eq!(t.rgb.r, t.rgb.g);
        assert_eq!(t.rgb.g, t.rgb.b);
        assert!((t.alpha - 0.35).abs() < 1e-6);
    }

    #[test]
    fn above_threshold_blends_toward_accent() {
        let m = map();
        assert_eq!(m.tone(0.7, 1.0).rgb, m.gray);
        assert_eq!(m.tone(1.0, 1.0).rgb, m.accent);
        let mid = m.tone(0.85, 1.0).rgb;
        assert!(mid.g > m.gray.g && mid.r < m.gray.r);
    }

    #[test]
    fn alpha_scales_with_opacity_and_mask() {
        let mut m = map();
        m.opacity = 0.5;
        let t = m.tone(1.0, 0.5);
        assert!((t.alpha - 0.25).abs() < 1e-6);
    }

    #[test]
    fn mono_leaves_default_colour() {
        let mut m = map();
        m.mode = ColorMode::Mono;
        assert_eq!(m.color(m.tone(1.0, 1.0)), None);
    }

    #[test]
    fn quantize_picks_nearest_entries() {
        assert_eq!(quantize(Rgb::BLACK, ColorMode::Color256), Some(Color::AnsiValue(16)));
        assert_eq!(quantize(Rgb::WHITE, ColorMode::Color256), Some(Color::AnsiValue(231)));
        assert_eq!(quantize(Rgb::new(250, 5, 5), ColorMode::Color16), Some(Color::Red));
    }

    #[test]
    fn accent_parsing() {
        assert_eq!(Rgb::parse("#ff8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(Rgb::parse("00ff00").unwrap(), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::parse("white").unwrap(), Rgb::WHITE);
        assert_eq!(Rgb::parse("0").unwrap(), hsl_to_rgb(0.0, 0.75, 0.6));
        assert!(Rgb::parse("#zzzzzz").is_err());
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), Rgb::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), Rgb::new(0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), Rgb::new(0, 0, 255));
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), Rgb::new(255, 0, 0));
    }

    #[test]
    fn hue_of_primaries() {
        assert_eq!(Rgb::new(255, 0, 0).hue(), 0.0);
        assert_eq!(Rgb::new(0, 255, 0).hue(), 120.0);
        assert_eq!(Rgb::new(0, 0, 255).hue(), 240.0);
        assert_eq!(Rgb::new(90, 90, 90).hue(), 0.0);
    }

    #[test]
    fn masks_fade_where_expected() {
        assert!((vignette(0.5, 0.5, 1.0) - 1.0).abs() < 1e-6);
        assert!(vignette(0.0, 0.0, 1.0) < 0.01);
        assert_eq!(seam(0.5, 0.1), 0.0);
        assert_eq!(seam(0.9, 0.1), 1.0);
        assert_eq!(seam(0.5, 0.0), 1.0);
    }
}
