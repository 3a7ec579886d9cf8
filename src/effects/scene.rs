// Copyright (c) 2026 rezky_nightky

use crate::canvas::Canvas;
use crate::error::FxResult;
use crate::ramp::Ramp;
use crate::tone::ToneMap;

use super::{put_glyph, Effect, FrameCtx};

/// A sphere lit by a light orbiting around it.
pub struct Scene {
    ramp: Ramp,
    tones: ToneMap,
    /// Sphere radius as a fraction of the shorter viewport side.
    pub radius: f32,
    pub ambient: f32,
    /// Radians per second.
    pub orbit: f32,
    pub bands: f32,
}

impl Scene {
    pub fn new(ramp: Ramp, tones: ToneMap) -> Self {
        Self {
            ramp,
            tones,
            radius: 0.42,
            ambient: 0.06,
            orbit: 0.6,
            bands: 9.0,
        }
    }

    fn light(&self, t: f32) -> [f32; 3] {
        let a = t * self.orbit;
        normalize([a.cos(), -0.45, a.sin()])
    }

    /// Brightness of the sphere at a unit-disc point, `None` off the sphere.
    pub fn shade(&self, u: f32, v: f32, t: f32) -> Option<f32> {
        let d2 = u * u + v * v;
        if d2 > 1.0 {
            return None;
        }
        let n = [u, v, (1.0 - d2).sqrt()];
        let l = self.light(t);
        let lambert = (n[0] * l[0] + n[1] * l[1] + n[2] * l[2]).max(0.0);
        let band = 0.85 + 0.15 * (v.asin() * self.bands).cos();
        Some((self.ambient + lambert * band).clamp(0.0, 1.0))
    }
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len == 0.0 {
        return v;
    }
    [v[0] / len, v[1] / len, v[2] / len]
}

impl Effect for Scene {
    fn name(&self) -> &'static str {
        "scene"
    }

    fn render(&mut self, ctx: &FrameCtx<'_>, canvas: &mut Canvas) -> FxResult<()> {
        let grid = ctx.grid;
        let (w, h) = (grid.viewport.px_w as f32, grid.viewport.px_h as f32);
        let r = (w.min(h) * self.radius).max(1.0);
        let (cx, cy) = (w * 0.5, h * 0.5 - ctx.scroll * 0.25);

        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let (x, y) = grid.origin(col, row);
                let u = (x + grid.cell_w * 0.5 - cx) / r;
                let v = (y + grid.cell_h * 0.5 - cy) / r;
                let Some(b) = self.shade(u, v, ctx.time) else {
                    continue;
                };
                let tone = self.tones.tone(b, 1.0);
                put_glyph(
                    canvas,
                    grid,
                    (col, row),
                    self.ramp.glyph(b),
                    &self.tones,
                    tone,
                    self.tones.is_accent(b),
                );
            }
        }
        Ok(())
    }
}
