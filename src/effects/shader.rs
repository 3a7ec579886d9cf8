// Copyright (c) 2026 rezky_nightky

use tracing::warn;

use crate::boundary::Fallback;
use crate::canvas::Canvas;
use crate::cell::Cell;
use crate::error::{FxError, FxResult};
use crate::runtime::ColorMode;
use crate::tone::{hsl_to_rgb, quantize, Rgb};

use super::{Effect, FrameCtx};

/// Flowing colour gradient painted into cell backgrounds. Needs truecolor;
/// anything less gets the flat fallback.
pub struct Shader {
    gpu: bool,
    hue: f32,
    mode: ColorMode,
    fallback: Fallback,
    warned: bool,
}

impl Shader {
    pub fn new(accent: Rgb, mode: ColorMode) -> Self {
        Self {
            gpu: mode == ColorMode::TrueColor,
            hue: accent.hue(),
            mode,
            fallback: Fallback::from_accent(accent, mode),
            warned: false,
        }
    }

    /// Colour at a normalised position.
    pub fn sample(&self, nx: f32, ny: f32, t: f32) -> Rgb {
        let h = self.hue + 40.0 * (nx * 3.0 + t * 0.5).sin() + 30.0 * (ny * 2.0 - t * 0.3).cos();
        let l = 0.14 + 0.08 * ((nx + ny) * 4.0 + t * 0.8).sin();
        hsl_to_rgb(h.rem_euclid(360.0), 0.65, l)
    }
}

impl Effect for Shader {
    fn name(&self) -> &'static str {
        "shader"
    }

    fn mount(&mut self) {
        if !self.gpu && !self.warned {
            warn!(mode = self.mode.label(), "no truecolor output, shader uses flat fallback");
            self.warned = true;
        }
    }

    fn render(&mut self, ctx: &FrameCtx<'_>, canvas: &mut Canvas) -> FxResult<()> {
        if !self.gpu {
            self.fallback.paint(canvas);
            return Ok(());
        }
        if !ctx.time.is_finite() {
            return Err(FxError::render("shader", format!("time {} is not finite", ctx.time)));
        }

        let grid = ctx.grid;
        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let (nx, ny) = grid.normalized(col, row);
                let rgb = self.sample(nx, ny, ctx.time);
                canvas.plot(grid, col, row, Cell::blank(quantize(rgb, self.mode)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::{ctx, grid};

    #[test]
    fn truecolor_paints_backgrounds() {
        let mut s = Shader::new(Rgb::new(0, 160, 255), ColorMode::TrueColor);
        assert!(s.gpu);
        let g = grid(6, 3);
        let mut canvas = Canvas::new(6, 3, None);
        s.render(&ctx(&g, 1.0, 0.0), &mut canvas).unwrap();
        assert!((0..3).all(|y| (0..6).all(|x| canvas.get(x, y).unwrap().bg.is_some())));
    }

    #[test]
    fn gradient_flows_with_time() {
        let s = Shader::new(Rgb::new(0, 160, 255), ColorMode::TrueColor);
        assert_ne!(s.sample(0.3, 0.3, 0.0), s.sample(0.3, 0.3, 2.0));
    }

    #[test]
    fn lower_colour_modes_use_the_fallback() {
        let accent = Rgb::new(0, 160, 255);
        let mut s = Shader::new(accent, ColorMode::Color256);
        assert!(!s.gpu);
        s.mount();
        let g = grid(4, 4);
        let mut canvas = Canvas::new(4, 4, None);
        s.render(&ctx(&g, 1.0, 0.0), &mut canvas).unwrap();

        let mut expected = Canvas::new(4, 4, None);
        Fallback::from_accent(accent, ColorMode::Color256).paint(&mut expected);
        for y in 0..4 {
            assert_eq!(canvas.get(0, y), expected.get(0, y));
        }
    }

    #[test]
    fn non_finite_time_is_an_error() {
        let mut s = Shader::new(Rgb::WHITE, ColorMode::TrueColor);
        let g = grid(2, 2);
        let mut canvas = Canvas::new(2, 2, None);
        assert!(s.render(&ctx(&g, f32::NAN, 0.0), &mut canvas).is_err());
    }
}
