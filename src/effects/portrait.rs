// Copyright (c) 2026 rezky_nightky

use std::path::Path;

use image::RgbaImage;
use rand::Rng;
use tracing::{debug, error};

use crate::canvas::Canvas;
use crate::error::{FxError, FxResult};
use crate::gate::Variant;
use crate::grid::Grid;
use crate::ramp::Ramp;
use crate::raster::{Affine, LoadState, Loader, Rig, Sampled};
use crate::runtime::Fit;
use crate::tone::{seam, ToneMap};

use super::{put_glyph, Effect, FrameCtx, Readiness};

/// Motion applied to the sampling coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    pub rig: Rig,
    /// Peak head rotation in radians.
    pub max_tilt: f32,
    /// Peak limb offset as a fraction of the image width.
    pub sway: f32,
    pub tilt_rate: f32,
    pub sway_rate: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            rig: Rig::default(),
            max_tilt: 6f32.to_radians(),
            sway: 0.02,
            tilt_rate: 0.7,
            sway_rate: 1.9,
        }
    }
}

enum Source {
    Unloaded(std::path::PathBuf),
    Loading(Loader),
    Ready(RgbaImage),
    Failed,
    Detached,
}

/// Image sampled into the grid, one luminance value per cell.
pub struct Portrait<R> {
    source: Source,
    fit: Fit,
    ramp: Ramp,
    tones: ToneMap,
    pose: Pose,
    /// Chance per drawn cell to swap in a random glyph.
    shimmer: f32,
    seam: f32,
    rng: R,
    grid: Option<Grid>,
    sampled: Option<Sampled>,
}

impl<R: Rng> Portrait<R> {
    pub fn open(path: &Path, ramp: Ramp, tones: ToneMap, rng: R) -> Self {
        Self::with_source(Source::Unloaded(path.to_path_buf()), ramp, tones, rng)
    }

    pub fn from_image(img: RgbaImage, ramp: Ramp, tones: ToneMap, rng: R) -> Self {
        Self::with_source(Source::Ready(img), ramp, tones, rng)
    }

    fn with_source(source: Source, ramp: Ramp, tones: ToneMap, rng: R) -> Self {
        Self {
            source,
            fit: Fit::Contain,
            ramp,
            tones,
            pose: Pose::default(),
            shimmer: 0.0,
            seam: 0.0,
            rng,
            grid: None,
            sampled: None,
        }
    }

    pub fn with_fit(mut self, fit: Fit) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn with_shimmer(mut self, chance: f32) -> Self {
        self.shimmer = chance.clamp(0.0, 1.0);
        self
    }

    pub fn with_seam(mut self, width: f32) -> Self {
        self.seam = width.max(0.0);
        self
    }

    fn resample(&mut self) {
        if let (Source::Ready(img), Some(grid)) = (&self.source, &self.grid) {
            let s = Sampled::from_image(img, grid, self.fit);
            debug!(cols = s.cols, rows = s.rows, "portrait resampled");
            self.sampled = Some(s);
        }
    }

    fn pick(&mut self, ch: char) -> char {
        if self.shimmer > 0.0 && self.rng.random::<f32>() < self.shimmer {
            let pool = self.ramp.visible();
            return pool[self.rng.random_range(0..pool.len())];
        }
        ch
    }
}

impl<R: Rng> Effect for Portrait<R> {
    fn name(&self) -> &'static str {
        "portrait"
    }

    fn mount(&mut self) {
        if let Source::Unloaded(path) = &self.source {
            debug!(path = %path.display(), "portrait decode started");
            self.source = Source::Loading(Loader::spawn(path));
        }
    }

    fn readiness(&mut self) -> Readiness {
        let polled = match &self.source {
            Source::Ready(_) => return Readiness::Ready,
            Source::Loading(loader) => loader.poll(),
            Source::Unloaded(_) => return Readiness::Pending,
            Source::Failed | Source::Detached => return Readiness::Failed,
        };
        match polled {
            LoadState::Pending => Readiness::Pending,
            LoadState::Ready(img) => {
                debug!(w = img.width(), h = img.height(), "portrait decoded");
                self.source = Source::Ready(img);
                self.resample();
                Readiness::Ready
            }
            LoadState::Failed(e) => {
                error!(error = %e, "portrait image unavailable, effect stays blank");
                self.source = Source::Failed;
                Readiness::Failed
            }
        }
    }

    fn resize(&mut self, grid: &Grid) {
        self.grid = Some(*grid);
        self.resample();
    }

    fn render(&mut self, ctx: &FrameCtx<'_>, canvas: &mut Canvas) -> FxResult<()> {
        let grid = ctx.grid;
        let Some(sampled) = self.sampled.take() else {
            return Err(FxError::render("portrait", "no sampled buffer"));
        };
        if sampled.cols != grid.cols || sampled.rows != grid.rows {
            self.sampled = Some(sampled);
            return Err(FxError::render("portrait", "sampled buffer does not match grid"));
        }

        let tilt = self.pose.max_tilt * (ctx.time * self.pose.tilt_rate).sin();
        let sway_px = self.pose.sway
            * sampled.rect.2 as f32
            * grid.cell_w
            * (ctx.time * self.pose.sway_rate).sin();
        let (px, py) = sampled.image_px(grid, self.pose.rig.pivot.0, self.pose.rig.pivot.1);
        let head = Affine::rotation_about(-tilt, px, py);
        let limb = Affine::translation(-sway_px, 0.0);

        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let (u, v) = sampled.image_uv(col, row);
                let (x, y) = grid.origin(col, row);
                let centre = (x + grid.cell_w * 0.5, y + grid.cell_h * 0.5);
                let (sx, sy) = if self.pose.rig.head.contains(u, v) {
                    head.apply(centre.0, centre.1)
                } else if self.pose.rig.limbs.iter().any(|r| r.contains(u, v)) {
                    limb.apply(centre.0, centre.1)
                } else {
                    centre
                };

                let Some(b) = sampled.at_px(grid, sx, sy) else {
                    continue;
                };
                let ch = self.ramp.glyph(b);
                if crate::ramp::is_empty_glyph(ch) {
                    continue;
                }
                let ch = if ctx.variant == Variant::Full {
                    self.pick(ch)
                } else {
                    ch
                };
                let (nx, _) = grid.normalized(col, row);
                let tone = self.tones.tone(b, seam(nx, self.seam));
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

        self.sampled = Some(sampled);
        Ok(())
    }

    fn unmount(&mut self) {
        if matches!(self.source, Source::Loading(_) | Source::Unloaded(_)) {
            self.source = Source::Detached;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::{ctx, glyph_count, grid};
    use crate::runtime::ColorMode;
    use crate::tone::Rgb;
    use image::Rgba;
    use rand::{rngs::StdRng, SeedableRng};

    fn still() -> Pose {
        Pose {
            max_tilt: 0.0,
            sway: 0.0,
            ..Pose::default()
        }
    }

    fn portrait(fill: [u8; 4]) -> Portrait<StdRng> {
        let img = RgbaImage::from_pixel(48, 48, Rgba(fill));
        let tones = ToneMap::new(Rgb::new(0, 255, 0), 0.7, 1.0, ColorMode::TrueColor);
        Portrait::from_image(
            img,
            Ramp::preset("standard").unwrap(),
            tones,
            StdRng::seed_from_u64(7),
        )
        .with_fit(Fit::Stretch)
        .with_pose(still())
    }

    #[test]
    fn white_source_fills_the_grid_with_the_densest_glyph() {
        let mut p = portrait([255, 255, 255, 255]);
        let g = grid(16, 6);
        p.resize(&g);
        assert_eq!(p.readiness(), Readiness::Ready);
        let mut canvas = Canvas::new(16, 6, None);
        p.render(&ctx(&g, 0.0, 0.0), &mut canvas).unwrap();
        for y in 1..5 {
            let row: Vec<char> = canvas.row_text(y).chars().collect();
            for ch in &row[1..15] {
                assert_eq!(*ch, '@');
            }
        }
    }

    #[test]
    fn black_source_draws_nothing() {
        let mut p = portrait([0, 0, 0, 255]);
        let g = grid(16, 6);
        p.resize(&g);
        let mut canvas = Canvas::new(16, 6, None);
        p.render(&ctx(&g, 0.0, 0.0), &mut canvas).unwrap();
        assert_eq!(canvas.plots(), 0);
        assert_eq!(glyph_count(&canvas), 0);
    }

    #[test]
    fn resize_resamples_at_the_new_resolution() {
        let mut p = portrait([255, 255, 255, 255]);
        p.resize(&grid(8, 4));
        p.resize(&grid(20, 10));
        let mut canvas = Canvas::new(20, 10, None);
        let g = grid(20, 10);
        p.render(&ctx(&g, 0.0, 0.0), &mut canvas).unwrap();
        assert_eq!(canvas.row_text(9).chars().nth(19), Some('@'));
    }

    #[test]
    fn stale_buffer_is_a_render_error() {
        let mut p = portrait([255, 255, 255, 255]);
        p.resize(&grid(8, 4));
        let other = grid(10, 4);
        let mut canvas = Canvas::new(10, 4, None);
        assert!(p.render(&ctx(&other, 0.0, 0.0), &mut canvas).is_err());
    }

    #[test]
    fn shimmer_with_seeded_rng_is_reproducible() {
        let run = || {
            let mut p = portrait([255, 255, 255, 255]).with_shimmer(0.5);
            let g = grid(12, 4);
            p.resize(&g);
            let mut canvas = Canvas::new(12, 4, None);
            p.render(&ctx(&g, 0.0, 0.0), &mut canvas).unwrap();
            (0..4).map(|y| canvas.row_text(y)).collect::<Vec<_>>()
        };
        let a = run();
        assert_eq!(a, run());
        assert!(a.iter().any(|r| r.chars().any(|c| c != '@')));
    }

    #[test]
    fn shimmer_only_runs_in_the_full_variant() {
        let g = grid(12, 4);
        let draw = |shimmer: f32, variant: Variant| {
            let mut p = portrait([255, 255, 255, 255]).with_shimmer(shimmer);
            p.resize(&g);
            let mut canvas = Canvas::new(12, 4, None);
            let frame = FrameCtx {
                variant,
                ..ctx(&g, 0.0, 0.0)
            };
            p.render(&frame, &mut canvas).unwrap();
            (0..4).map(|y| canvas.row_text(y)).collect::<Vec<_>>()
        };
        let plain = draw(0.0, Variant::Full);
        assert_eq!(draw(1.0, Variant::Static), plain);
        assert_eq!(draw(1.0, Variant::Lite), plain);
        assert_ne!(draw(1.0, Variant::Full), plain);
    }

    #[test]
    fn tilt_moves_head_samples() {
        // Left half bright, right half dark: rotating the head region moves
        // the boundary, so some head cells change.
        let mut img = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255]));
        for y in 0..40 {
            for x in 0..20 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let tones = ToneMap::new(Rgb::WHITE, 0.7, 1.0, ColorMode::TrueColor);
        let pose = Pose {
            max_tilt: 30f32.to_radians(),
            tilt_rate: 1.0,
            ..still()
        };
        let mut p = Portrait::from_image(
            img,
            Ramp::new(" #").unwrap(),
            tones,
            StdRng::seed_from_u64(1),
        )
        .with_fit(Fit::Stretch)
        .with_pose(pose);
        let g = grid(40, 20);
        p.resize(&g);

        let mut still = Canvas::new(40, 20, None);
        p.render(&ctx(&g, 0.0, 0.0), &mut still).unwrap();
        let mut tilted = Canvas::new(40, 20, None);
        p.render(&ctx(&g, std::f32::consts::FRAC_PI_2, 0.0), &mut tilted).unwrap();

        let head_rows = |c: &Canvas| (0..8).map(|y| c.row_text(y)).collect::<Vec<_>>();
        assert_ne!(head_rows(&still), head_rows(&tilted));
        // Below the head and outside the limbs nothing moves.
        assert_eq!(still.row_text(19), tilted.row_text(19));
    }

    #[test]
    fn missing_image_reports_failure_and_stays_blank() {
        let tones = ToneMap::new(Rgb::WHITE, 0.7, 1.0, ColorMode::TrueColor);
        let mut p = Portrait::open(
            Path::new("/nonexistent/asciifield-portrait.png"),
            Ramp::preset("standard").unwrap(),
            tones,
            StdRng::seed_from_u64(1),
        );
        assert_eq!(p.readiness(), Readiness::Pending);
        p.mount();
        let state = loop {
            match p.readiness() {
                Readiness::Pending => std::thread::sleep(std::time::Duration::from_millis(5)),
                other => break other,
            }
        };
        assert_eq!(state, Readiness::Failed);
        assert_eq!(p.readiness(), Readiness::Failed);
    }
}
