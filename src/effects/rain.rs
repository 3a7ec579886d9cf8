// Copyright (c) 2026 rezky_nightky

use rand::Rng;
use tracing::debug;

use crate::canvas::Canvas;
use crate::error::FxResult;
use crate::gate::Variant;
use crate::grid::Grid;
use crate::tone::ToneMap;

use super::{put_glyph, Effect, FrameCtx};

/// One falling trail. `y` is the head row, fractional, in grid rows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Droplet {
    pub y: f32,
    /// Rows per second.
    pub speed: f32,
    pub len: u16,
    pub active: bool,
}

/// Matrix-style rain, one droplet per grid column.
pub struct Rain<R> {
    pool: Vec<char>,
    activity: f32,
    tones: ToneMap,
    rng: R,
    cols: u16,
    rows: u16,
    drops: Vec<Droplet>,
    glyphs: Vec<char>,
    /// Chance per frame and visible cell that its glyph is redrawn.
    flicker: f32,
    speed: (f32, f32),
}

impl<R: Rng> Rain<R> {
    pub fn new(pool: Vec<char>, activity: f32, mut tones: ToneMap, rng: R) -> Self {
        let pool = if pool.is_empty() { vec!['0', '1'] } else { pool };
        tones.gray = tones.accent.scale(0.4);
        Self {
            pool,
            activity: activity.clamp(0.0, 1.0),
            tones,
            rng,
            cols: 0,
            rows: 0,
            drops: Vec::new(),
            glyphs: Vec::new(),
            flicker: 0.02,
            speed: (8.0, 24.0),
        }
    }

    fn random_glyph(&mut self) -> char {
        self.pool[self.rng.random_range(0..self.pool.len())]
    }

    fn fresh(&mut self, y: f32) -> Droplet {
        let max_len = (self.rows / 2).max(4);
        Droplet {
            y,
            speed: self.rng.random_range(self.speed.0..=self.speed.1),
            len: self.rng.random_range(3..=max_len),
            active: self.rng.random::<f32>() < self.activity,
        }
    }

    fn recycle(&mut self, col: usize) {
        let above = self.rng.random_range(1..=self.rows.max(1)) as f32;
        self.drops[col] = self.fresh(-above);
    }

    fn advance(&mut self, dt: f32) {
        for col in 0..self.drops.len() {
            let d = &mut self.drops[col];
            d.y += d.speed * dt;
            if d.y - d.len as f32 > self.rows as f32 {
                self.recycle(col);
            }
        }
    }

    fn flicker_glyphs(&mut self) {
        if self.flicker <= 0.0 {
            return;
        }
        for i in 0..self.glyphs.len() {
            if self.rng.random::<f32>() < self.flicker {
                self.glyphs[i] = self.random_glyph();
            }
        }
    }
}

impl<R: Rng> Effect for Rain<R> {
    fn name(&self) -> &'static str {
        "rain"
    }

    fn resize(&mut self, grid: &Grid) {
        self.cols = grid.cols;
        self.rows = grid.rows;

        self.glyphs.clear();
        for _ in 0..grid.len() {
            let ch = self.random_glyph();
            self.glyphs.push(ch);
        }

        // Stagger the first wave across the screen and above it.
        self.drops.clear();
        for _ in 0..grid.cols {
            let span = grid.rows.max(1) as f32;
            let y = self.rng.random_range(-span..span);
            let d = self.fresh(y);
            self.drops.push(d);
        }
        debug!(cols = grid.cols, rows = grid.rows, "rain reset");
    }

    fn render(&mut self, ctx: &FrameCtx<'_>, canvas: &mut Canvas) -> FxResult<()> {
        let grid = ctx.grid;
        if grid.cols != self.cols || grid.rows != self.rows {
            self.resize(grid);
        }
        self.advance(ctx.delta.max(0.0));
        // Only the full variant spends random draws on every cell.
        if ctx.variant == Variant::Full {
            self.flicker_glyphs();
        }

        for (col, d) in self.drops.iter().enumerate() {
            if !d.active {
                continue;
            }
            let head = d.y.floor() as i32;
            for k in 0..=d.len as i32 {
                let row = head - k;
                if row < 0 || row >= self.rows as i32 {
                    continue;
                }
                let b = 1.0 - k as f32 / (d.len as f32 + 1.0);
                let i = row as usize * self.cols as usize + col;
                let tone = self.tones.tone(b, 1.0);
                put_glyph(
                    canvas,
                    grid,
                    (col as u16, row as u16),
                    self.glyphs[i],
                    &self.tones,
                    tone,
                    k == 0,
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
    use rand::{rngs::StdRng, SeedableRng};

    fn rain(seed: u64, activity: f32) -> Rain<StdRng> {
        let tones = ToneMap::new(Rgb::new(0, 255, 70), 0.7, 1.0, ColorMode::TrueColor);
        Rain::new(vec!['a', 'b', 'c'], activity, tones, StdRng::seed_from_u64(seed))
    }

    fn frames(r: &mut Rain<StdRng>, n: usize) -> Vec<String> {
        let g = grid(16, 12);
        r.resize(&g);
        let mut canvas = Canvas::new(16, 12, None);
        for _ in 0..n {
            canvas.begin();
            r.render(&ctx(&g, 0.0, 0.05), &mut canvas).unwrap();
        }
        (0..12).map(|y| canvas.row_text(y)).collect()
    }

    #[test]
    fn same_seed_same_rain() {
        assert_eq!(frames(&mut rain(42, 0.8), 30), frames(&mut rain(42, 0.8), 30));
    }

    #[test]
    fn no_activity_draws_nothing() {
        let mut r = rain(3, 0.0);
        let rows = frames(&mut r, 40);
        assert!(rows.iter().all(|l| l.trim().is_empty()));
    }

    #[test]
    fn full_activity_draws_trails() {
        let mut r = rain(5, 1.0);
        let g = grid(16, 12);
        r.resize(&g);
        for d in &mut r.drops {
            d.y = 6.0;
            d.len = 3;
        }
        let mut canvas = Canvas::new(16, 12, None);
        r.render(&ctx(&g, 0.0, 0.0), &mut canvas).unwrap();
        // Head plus three trail cells in every column.
        assert_eq!(glyph_count(&canvas), 16 * 4);
    }

    #[test]
    fn drops_past_the_bottom_recycle_above_the_top() {
        let mut r = rain(9, 1.0);
        let g = grid(8, 10);
        r.resize(&g);
        r.drops[2] = Droplet {
            y: 30.0,
            speed: 10.0,
            len: 4,
            active: true,
        };
        let mut canvas = Canvas::new(8, 10, None);
        r.render(&ctx(&g, 0.0, 0.016), &mut canvas).unwrap();
        let d = r.drops[2];
        assert!(d.y < 0.0);
        assert!(d.speed >= 8.0 && d.speed <= 24.0);
        assert!(d.len >= 3);
    }

    #[test]
    fn recycling_is_reproducible() {
        let run = || {
            let mut r = rain(11, 0.5);
            let g = grid(8, 10);
            r.resize(&g);
            let mut canvas = Canvas::new(8, 10, None);
            for _ in 0..200 {
                r.render(&ctx(&g, 0.0, 0.1), &mut canvas).unwrap();
            }
            r.drops.clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn lite_and_static_never_flicker() {
        for variant in [Variant::Lite, Variant::Static] {
            let mut r = rain(4, 1.0);
            r.flicker = 1.0;
            let g = grid(8, 10);
            r.resize(&g);
            let before = r.glyphs.clone();
            let mut canvas = Canvas::new(8, 10, None);
            let frame = FrameCtx {
                variant,
                ..ctx(&g, 0.0, 0.0)
            };
            r.render(&frame, &mut canvas).unwrap();
            assert_eq!(before, r.glyphs, "{variant:?}");
        }
    }

    #[test]
    fn zero_delta_does_not_move_drops() {
        let mut r = rain(1, 1.0);
        r.flicker = 0.0;
        let g = grid(8, 10);
        r.resize(&g);
        let before = r.drops.clone();
        let mut canvas = Canvas::new(8, 10, None);
        r.render(&ctx(&g, 0.0, 0.0), &mut canvas).unwrap();
        assert_eq!(before, r.drops);
    }
}
