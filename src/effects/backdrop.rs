// Copyright (c) 2026 rezky_nightky

use crate::canvas::Canvas;
use crate::error::FxResult;
use crate::field::{Falloff, NoiseField};
use crate::grid::Grid;
use crate::ramp::Ramp;
use crate::tone::{vignette, ToneMap};

use super::{put_glyph, Effect, FrameCtx};

/// Procedural sine-octave field centred on the viewport or the pointer.
pub struct Backdrop {
    field: NoiseField,
    ramp: Ramp,
    tones: ToneMap,
    vignette: f32,
    radial: bool,
}

impl Backdrop {
    pub fn new(ramp: Ramp, tones: ToneMap) -> Self {
        Self {
            field: NoiseField::default(),
            ramp,
            tones,
            vignette: 0.6,
            radial: true,
        }
    }

    /// Without radial falloff the field is uniform across the viewport.
    pub fn with_radial(mut self, on: bool) -> Self {
        self.radial = on;
        if !on {
            self.field.falloff = None;
        }
        self
    }
}

impl Effect for Backdrop {
    fn name(&self) -> &'static str {
        "backdrop"
    }

    fn resize(&mut self, grid: &Grid) {
        if self.radial {
            let reach = grid.viewport.px_w.max(grid.viewport.px_h) as f32;
            self.field.falloff = Some(Falloff {
                radius: reach * 0.75,
                floor: 0.15,
            });
        }
    }

    fn render(&mut self, ctx: &FrameCtx<'_>, canvas: &mut Canvas) -> FxResult<()> {
        let grid = ctx.grid;
        let centre = ctx.pointer.unwrap_or((
            grid.viewport.px_w as f32 * 0.5,
            grid.viewport.px_h as f32 * 0.5,
        ));

        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let (x, y) = grid.origin(col, row);
                let (x, y) = (x + grid.cell_w * 0.5, y + grid.cell_h * 0.5);
                let b = self.field.brightness(x, y + ctx.scroll, ctx.time, centre);
                let ch = self.ramp.glyph(b);
                let (nx, ny) = grid.normalized(col, row);
                let tone = self.tones.tone(b, vignette(nx, ny, self.vignette));
                put_glyph(
                    canvas,
                    grid,
                    (col, row),
                    ch,
                    &self.tones,
                    tone,
                    self.tones.is_accent(b),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::{ctx, glyph_count, grid};
    use crate::runtime::ColorMode;
    use crate::tone::Rgb;

    fn backdrop() -> Backdrop {
        let tones = ToneMap::new(Rgb::new(0, 200, 120), 0.7, 1.0, ColorMode::TrueColor);
        Backdrop::new(Ramp::preset("standard").unwrap(), tones)
    }

    fn snapshot(b: &mut Backdrop, t: f32) -> Vec<String> {
        let g = grid(20, 8);
        b.resize(&g);
        let mut canvas = Canvas::new(20, 8, None);
        b.render(&ctx(&g, t, 0.016), &mut canvas).unwrap();
        (0..8).map(|y| canvas.row_text(y)).collect()
    }

    #[test]
    fn identical_time_gives_identical_frames() {
        let mut a = backdrop();
        let mut b = backdrop();
        assert_eq!(snapshot(&mut a, 3.25), snapshot(&mut b, 3.25));
    }

    #[test]
    fn frames_change_over_time() {
        let mut a = backdrop();
        assert_ne!(snapshot(&mut a, 0.0), snapshot(&mut a, 4.0));
    }

    #[test]
    fn draws_something_on_a_normal_grid() {
        let mut a = backdrop();
        let g = grid(20, 8);
        a.resize(&g);
        let mut canvas = Canvas::new(20, 8, None);
        a.render(&ctx(&g, 1.0, 0.016), &mut canvas).unwrap();
        assert!(glyph_count(&canvas) > 0);
    }

    #[test]
    fn flat_field_ignores_the_pointer() {
        let mut a = backdrop().with_radial(false);
        let g = grid(20, 8);
        a.resize(&g);
        let mut centred = Canvas::new(20, 8, None);
        a.render(&ctx(&g, 2.0, 0.0), &mut centred).unwrap();
        let mut pointed = Canvas::new(20, 8, None);
        let mut c = ctx(&g, 2.0, 0.0);
        c.pointer = Some((0.0, 0.0));
        a.render(&c, &mut pointed).unwrap();
        for y in 0..8 {
            assert_eq!(centred.row_text(y), pointed.row_text(y));
        }
    }

    #[test]
    fn scroll_shifts_the_field() {
        let mut a = backdrop();
        let g = grid(20, 8);
        a.resize(&g);
        let mut still = Canvas::new(20, 8, None);
        a.render(&ctx(&g, 1.0, 0.0), &mut still).unwrap();
        let mut scrolled = Canvas::new(20, 8, None);
        let mut c = ctx(&g, 1.0, 0.0);
        c.scroll = 160.0;
        a.render(&c, &mut scrolled).unwrap();
        let rows = |cv: &Canvas| (0..8).map(|y| cv.row_text(y)).collect::<Vec<_>>();
        assert_ne!(rows(&still), rows(&scrolled));
    }
}
