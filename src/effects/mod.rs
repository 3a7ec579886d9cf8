// Copyright (c) 2026 rezky_nightky

//! The visual effects and the contract the frame driver drives them through.

mod backdrop;
mod portrait;
mod rain;
mod scene;
mod shader;

pub use backdrop::Backdrop;
pub use portrait::{Portrait, Pose};
pub use rain::Rain;
pub use scene::Scene;
pub use shader::Shader;

use rand::{rngs::StdRng, SeedableRng};

use crate::canvas::Canvas;
use crate::cell::Cell;
use crate::config::Settings;
use crate::error::{FxError, FxResult};
use crate::gate::Variant;
use crate::grid::Grid;
use crate::ramp::is_empty_glyph;
use crate::runtime::EffectKind;
use crate::tone::{Tone, ToneMap};

/// Tones fainter than this are not drawn at all.
pub const MIN_ALPHA: f32 = 0.02;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed,
}

/// Per-frame inputs. Times are seconds already scaled by the speed setting.
#[derive(Clone, Copy, Debug)]
pub struct FrameCtx<'a> {
    pub grid: &'a Grid,
    pub time: f32,
    pub delta: f32,
    /// Vertical scroll offset in canvas pixels.
    pub scroll: f32,
    /// Last pointer position in canvas pixels.
    pub pointer: Option<(f32, f32)>,
    pub variant: Variant,
}

pub trait Effect {
    fn name(&self) -> &'static str;

    /// Starts resource loading. Called once per mount.
    fn mount(&mut self) {}

    fn readiness(&mut self) -> Readiness {
        Readiness::Ready
    }

    /// The grid changed; regenerate anything sized to it.
    fn resize(&mut self, _grid: &Grid) {}

    /// Paints one frame into a canvas that was blanked by the caller.
    fn render(&mut self, ctx: &FrameCtx<'_>, canvas: &mut Canvas) -> FxResult<()>;

    fn unmount(&mut self) {}
}

impl<E: Effect + ?Sized> Effect for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn mount(&mut self) {
        (**self).mount()
    }

    fn readiness(&mut self) -> Readiness {
        (**self).readiness()
    }

    fn resize(&mut self, grid: &Grid) {
        (**self).resize(grid)
    }

    fn render(&mut self, ctx: &FrameCtx<'_>, canvas: &mut Canvas) -> FxResult<()> {
        (**self).render(ctx, canvas)
    }

    fn unmount(&mut self) {
        (**self).unmount()
    }
}

/// Draws one glyph through the tone map. Returns whether anything was drawn.
pub(crate) fn put_glyph(
    canvas: &mut Canvas,
    grid: &Grid,
    (col, row): (u16, u16),
    ch: char,
    tones: &ToneMap,
    tone: Tone,
    bold: bool,
) -> bool {
    if is_empty_glyph(ch) || tone.alpha < MIN_ALPHA {
        return false;
    }
    let cell = Cell::glyph(ch, tones.color(tone), tones.bg_color()).bold(bold);
    canvas.plot(grid, col, row, cell);
    true
}

pub fn build(settings: &Settings) -> FxResult<Box<dyn Effect>> {
    let tones = settings.tones();
    let rng = StdRng::seed_from_u64(settings.seed);
    let effect: Box<dyn Effect> = match settings.effect {
        EffectKind::Backdrop => Box::new(
            Backdrop::new(settings.ramp.clone(), tones).with_radial(settings.radial),
        ),
        EffectKind::Portrait => {
            let path = settings.image.as_deref().ok_or_else(|| {
                FxError::config("--effect portrait (requires --image <PATH>)")
            })?;
            Box::new(
                Portrait::open(path, settings.ramp.clone(), tones, rng)
                    .with_fit(settings.fit)
                    .with_pose(Pose {
                        max_tilt: settings.tilt_deg.to_radians(),
                        ..Pose::default()
                    })
                    .with_shimmer(settings.shimmer)
                    .with_seam(settings.seam),
            )
        }
        EffectKind::Rain => Box::new(Rain::new(
            settings.pool.clone(),
            settings.activity,
            tones,
            rng,
        )),
        EffectKind::Scene => Box::new(Scene::new(settings.ramp.clone(), tones)),
        EffectKind::Shader => Box::new(Shader::new(settings.accent, settings.color_mode)),
    };
    Ok(effect)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::grid::{CellSize, Viewport};

    pub fn grid(cols: u16, rows: u16) -> Grid {
        Grid::fit(
            Viewport::new(cols, rows, (0, 0)),
            CellSize { w: 8.0, h: 16.0 },
            1.0,
        )
    }

    pub fn ctx(grid: &Grid, time: f32, delta: f32) -> FrameCtx<'_> {
        FrameCtx {
            grid,
            time,
            delta,
            scroll: 0.0,
            pointer: None,
            variant: Variant::Full,
        }
    }

    pub fn glyph_count(canvas: &Canvas) -> usize {
        (0..canvas.height)
            .map(|y| canvas.row_text(y).chars().filter(|c| *c != ' ').count())
            .sum()
    }
}
