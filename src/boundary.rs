// Copyright (c) 2026 rezky_nightky

//! Error containment for effects.
//!
//! A [`Guarded`] effect that fails to render is replaced, for the rest of its
//! mount, by a static [`Fallback`]: a vertical gradient with darker scanlines.

use tracing::error;

use crate::canvas::Canvas;
use crate::cell::Cell;
use crate::effects::{Effect, FrameCtx, Readiness};
use crate::error::{FxError, FxResult};
use crate::grid::Grid;
use crate::runtime::ColorMode;
use crate::tone::{quantize, Rgb};

const SCANLINE_GLYPH: char = '─';

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fallback {
    pub top: Rgb,
    pub bottom: Rgb,
    pub mode: ColorMode,
    /// Brightness factor applied to odd rows.
    pub scanline: f32,
}

impl Fallback {
    pub fn from_accent(accent: Rgb, mode: ColorMode) -> Self {
        Self {
            top: accent.scale(0.3),
            bottom: Rgb::BLACK,
            mode,
            scanline: 0.6,
        }
    }

    pub fn row_color(&self, y: u16, height: u16) -> Rgb {
        let t = if height > 1 {
            y as f32 / (height - 1) as f32
        } else {
            0.0
        };
        let c = self.top.lerp(self.bottom, t);
        if y % 2 == 1 {
            c.scale(self.scanline)
        } else {
            c
        }
    }

    /// Paints every terminal cell of the canvas.
    pub fn paint(&self, canvas: &mut Canvas) {
        let (w, h) = (canvas.width, canvas.height);
        for y in 0..h {
            let cell = match quantize(self.row_color(y, h), self.mode) {
                Some(bg) => Cell::blank(Some(bg)),
                // Without colour the scanlines are the whole texture.
                None if y % 2 == 1 => Cell::glyph(SCANLINE_GLYPH, None, None),
                None => Cell::blank(None),
            };
            for x in 0..w {
                canvas.set(x, y, cell);
            }
        }
    }
}

/// Wraps an effect; the first render error trips it to the fallback.
pub struct Guarded<E> {
    inner: E,
    fallback: Fallback,
    tripped: Option<FxError>,
}

impl<E: Effect> Guarded<E> {
    pub fn new(inner: E, fallback: Fallback) -> Self {
        Self {
            inner,
            fallback,
            tripped: None,
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.is_some()
    }

    /// The error that tripped the boundary.
    pub fn cause(&self) -> Option<&FxError> {
        self.tripped.as_ref()
    }

    #[cfg(test)]
    pub fn inner(&self) -> &E {
        &self.inner
    }

    fn on_error(&mut self, err: FxError, canvas: &mut Canvas) {
        error!(effect = self.inner.name(), error = %err, "effect failed, showing fallback");
        self.tripped = Some(err);
        canvas.begin();
        self.fallback.paint(canvas);
    }
}

impl<E: Effect> Effect for Guarded<E> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn mount(&mut self) {
        self.inner.mount();
    }

    fn readiness(&mut self) -> Readiness {
        if self.is_tripped() {
            return Readiness::Ready;
        }
        self.inner.readiness()
    }

    fn resize(&mut self, grid: &Grid) {
        if !self.is_tripped() {
            self.inner.resize(grid);
        }
    }

    fn render(&mut self, ctx: &FrameCtx<'_>, canvas: &mut Canvas) -> FxResult<()> {
        if self.is_tripped() {
            self.fallback.paint(canvas);
            return Ok(());
        }
        if let Err(e) = self.inner.render(ctx, canvas) {
            self.on_error(e, canvas);
        }
        Ok(())
    }

    fn unmount(&mut self) {
        self.inner.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::{ctx, grid};

    struct Flaky {
        fail_at: u32,
        calls: u32,
    }

    impl Effect for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn render(&mut self, ctx: &FrameCtx<'_>, canvas: &mut Canvas) -> FxResult<()> {
            self.calls += 1;
            if self.calls >= self.fail_at {
                return Err(FxError::render("flaky", "boom"));
            }
            canvas.plot(ctx.grid, 0, 0, Cell::glyph('x', None, None));
            Ok(())
        }
    }

    fn fallback() -> Fallback {
        Fallback::from_accent(Rgb::new(0, 200, 255), ColorMode::TrueColor)
    }

    #[test]
    fn healthy_effect_passes_through() {
        let mut g = Guarded::new(Flaky { fail_at: 99, calls: 0 }, fallback());
        let gr = grid(4, 2);
        let mut canvas = Canvas::new(4, 2, None);
        g.render(&ctx(&gr, 0.0, 0.0), &mut canvas).unwrap();
        assert!(!g.is_tripped());
        assert_eq!(canvas.get(0, 0).map(|c| c.ch), Some('x'));
    }

    #[test]
    fn error_substitutes_fallback_and_keeps_it() {
        let mut g = Guarded::new(Flaky { fail_at: 2, calls: 0 }, fallback());
        let gr = grid(4, 4);
        let mut canvas = Canvas::new(4, 4, None);
        g.render(&ctx(&gr, 0.0, 0.0), &mut canvas).unwrap();
        canvas.begin();
        g.render(&ctx(&gr, 0.1, 0.1), &mut canvas).unwrap();
        assert!(g.is_tripped());
        assert!(matches!(g.cause(), Some(FxError::Render { .. })));
        let painted = *canvas.get(1, 1).unwrap();
        assert!(painted.bg.is_some());
        assert_eq!(painted.ch, ' ');

        // The inner effect is never asked to render again.
        canvas.begin();
        g.render(&ctx(&gr, 0.2, 0.1), &mut canvas).unwrap();
        assert_eq!(g.inner().calls, 2);
        assert_eq!(*canvas.get(1, 1).unwrap(), painted);
    }

    #[test]
    fn gradient_darkens_downward_with_scanlines() {
        let f = fallback();
        let top = f.row_color(0, 10);
        let bottom = f.row_color(9, 10);
        assert!(top.b > bottom.b);
        let even = f.row_color(4, 10);
        let odd = f.row_color(5, 10);
        assert!(odd.b < even.b);
    }

    #[test]
    fn mono_fallback_draws_scanline_glyphs() {
        let f = Fallback::from_accent(Rgb::WHITE, ColorMode::Mono);
        let mut canvas = Canvas::new(3, 4, None);
        f.paint(&mut canvas);
        assert_eq!(canvas.row_text(0), "   ");
        assert_eq!(canvas.row_text(1), "───");
    }
}
