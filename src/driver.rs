// Copyright (c) 2026 rezky_nightky

//! The frame driver: owns one canvas and one guarded effect, and walks them
//! through `Unmounted -> Initializing -> Running <-> Paused -> Unmounted`.
//!
//! Every listener registered on mount and the one pending frame handle are
//! fields of the driver and are released on the single [`Driver::unmount`]
//! path, whatever state the driver is in.

use std::time::Duration;

use crossterm::style::Color;
use tracing::{debug, info};

use crate::boundary::{Fallback, Guarded};
use crate::canvas::Canvas;
use crate::effects::{Effect, FrameCtx, Readiness};
use crate::error::FxResult;
use crate::gate::{Gate, Variant};
use crate::grid::{CellSize, Grid, Viewport};
use crate::host::{FrameHandle, Host, HostEvent, ListenerId, Signal};

/// Longest simulated step; a stalled loop never jumps the animation further.
pub const MAX_STEP: Duration = Duration::from_millis(250);

pub const DENSITY_RANGE: (f32, f32) = (0.1, 4.0);
pub const SPEED_RANGE: (f32, f32) = (0.0, 10.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Unmounted,
    Initializing,
    Running,
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriverConfig {
    pub base_cell: CellSize,
    pub density: f32,
    pub speed: f32,
    /// Target rate for the lite variant.
    pub lite_fps: f32,
    /// Explicit canvas size in px, overriding the measured one.
    pub canvas_px: (Option<u32>, Option<u32>),
    pub bg: Option<Color>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_cell: CellSize { w: 8.0, h: 16.0 },
            density: 1.0,
            speed: 1.0,
            lite_fps: 30.0,
            canvas_px: (None, None),
            bg: None,
        }
    }
}

pub struct Driver<E> {
    effect: Guarded<E>,
    canvas: Canvas,
    cfg: DriverConfig,
    gate: Gate,
    variant: Variant,
    state: DriverState,
    viewport: Option<Viewport>,
    grid: Option<Grid>,

    listeners: Vec<ListenerId>,
    pending: Option<FrameHandle>,

    time: f64,
    last_tick: Option<Duration>,
    last_drawn: Option<Duration>,
    scroll: f32,
    pointer: Option<(f32, f32)>,
    visible: bool,

    frames: u64,
    skipped: u64,
    dirty: bool,
}

impl<E: Effect> Driver<E> {
    pub fn new(effect: E, fallback: Fallback, cfg: DriverConfig, gate: Gate) -> Self {
        let variant = gate.variant();
        Self {
            effect: Guarded::new(effect, fallback),
            canvas: Canvas::new(0, 0, cfg.bg),
            cfg,
            gate,
            variant,
            state: DriverState::Unmounted,
            viewport: None,
            grid: None,
            listeners: Vec::new(),
            pending: None,
            time: 0.0,
            last_tick: None,
            last_drawn: None,
            scroll: 0.0,
            pointer: None,
            visible: true,
            frames: 0,
            skipped: 0,
            dirty: false,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Viewport the grid was last fitted to, canvas overrides applied.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn effect(&self) -> &Guarded<E> {
        &self.effect
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Accumulated animation time in scaled seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Frames drawn since creation.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frame callbacks the lite throttle turned away.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn density(&self) -> f32 {
        self.cfg.density
    }

    pub fn speed(&self) -> f32 {
        self.cfg.speed
    }

    /// Whether the canvas changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn mount<H: Host>(&mut self, host: &mut H, now: Duration) -> FxResult<()> {
        if self.state != DriverState::Unmounted {
            debug!(state = ?self.state, "mount ignored, already mounted");
            return Ok(());
        }
        for signal in Signal::ALL {
            self.listeners.push(host.listen(signal));
        }

        let vp = self.measure(host);
        self.gate.on_resize(&vp);
        self.variant = self.gate.variant();
        self.effect.mount();
        self.regrid(vp);
        self.state = DriverState::Initializing;
        info!(
            effect = self.effect.name(),
            variant = self.variant.label(),
            cols = vp.cols,
            rows = vp.rows,
            "effect mounted"
        );
        self.poll(host, now)
    }

    /// Moves an initializing driver to running once the effect is ready.
    pub fn poll<H: Host>(&mut self, host: &mut H, now: Duration) -> FxResult<()> {
        if self.state != DriverState::Initializing {
            return Ok(());
        }
        match self.effect.readiness() {
            Readiness::Ready => self.start(host, now),
            // Failed stays here for good; the effect has already logged it.
            Readiness::Pending | Readiness::Failed => Ok(()),
        }
    }

    fn start<H: Host>(&mut self, host: &mut H, now: Duration) -> FxResult<()> {
        debug!(variant = self.variant.label(), "effect ready");
        if self.variant == Variant::Static {
            self.state = DriverState::Paused;
            return self.draw(now, 0.0);
        }
        if self.visible {
            self.state = DriverState::Running;
            self.pending = Some(host.request_frame());
        } else {
            self.state = DriverState::Paused;
        }
        Ok(())
    }

    /// Returns whether a frame was drawn.
    pub fn on_frame<H: Host>(
        &mut self,
        host: &mut H,
        handle: FrameHandle,
        now: Duration,
    ) -> FxResult<bool> {
        if self.state != DriverState::Running || self.pending != Some(handle) {
            debug!(?handle, state = ?self.state, "stale frame callback ignored");
            return Ok(false);
        }
        self.pending = None;

        if self.variant == Variant::Lite {
            let interval = Duration::from_secs_f32(1.0 / self.cfg.lite_fps.max(1.0));
            if self
                .last_drawn
                .is_some_and(|t| now.saturating_sub(t) < interval)
            {
                self.skipped += 1;
                self.pending = Some(host.request_frame());
                return Ok(false);
            }
        }

        let step = self
            .last_tick
            .map(|t| now.saturating_sub(t).min(MAX_STEP))
            .unwrap_or(Duration::ZERO);
        let delta = step.as_secs_f64() * self.cfg.speed as f64;
        self.time += delta;
        self.last_tick = Some(now);

        self.draw(now, delta as f32)?;
        self.pending = Some(host.request_frame());
        Ok(true)
    }

    fn draw(&mut self, now: Duration, delta: f32) -> FxResult<()> {
        let Some(grid) = self.grid.filter(|g| !g.is_empty()) else {
            return Ok(());
        };
        let ctx = FrameCtx {
            grid: &grid,
            time: self.time as f32,
            delta,
            scroll: self.scroll,
            pointer: self.pointer,
            variant: self.variant,
        };
        self.canvas.begin();
        self.effect.render(&ctx, &mut self.canvas)?;
        self.frames += 1;
        self.last_drawn = Some(now);
        self.dirty = true;
        Ok(())
    }

    pub fn on_event<H: Host>(&mut self, host: &mut H, ev: HostEvent, now: Duration) -> FxResult<()> {
        if self.state == DriverState::Unmounted {
            return Ok(());
        }
        match ev {
            HostEvent::Resize(vp) => {
                let vp = vp.with_canvas_px(self.cfg.canvas_px.0, self.cfg.canvas_px.1);
                self.gate.on_resize(&vp);
                let before = self.variant;
                self.variant = self.gate.variant();
                if before != self.variant {
                    debug!(from = before.label(), to = self.variant.label(), "variant changed");
                }
                self.regrid(vp);
                self.redraw_still(now)?;
            }
            HostEvent::Scroll(dy) => {
                self.scroll = (self.scroll + dy).max(0.0);
            }
            HostEvent::Pointer(x, y) => {
                self.pointer = Some((x, y));
            }
            HostEvent::Visibility(visible) => {
                debug!(visible, "visibility changed");
                self.visible = visible;
                self.sync_running(host, now)?;
            }
            HostEvent::MotionPreference(reduced) => {
                info!(reduced, "motion preference changed");
                self.gate.on_motion_change(reduced);
                let before = self.variant;
                self.variant = self.gate.variant();
                if before.density_scale() != self.variant.density_scale() {
                    if let Some(vp) = self.viewport {
                        self.regrid(vp);
                    }
                }
                self.sync_running(host, now)?;
            }
        }
        Ok(())
    }

    fn sync_running<H: Host>(&mut self, host: &mut H, now: Duration) -> FxResult<()> {
        let animate = self.visible && self.variant != Variant::Static;
        match self.state {
            DriverState::Running if !animate => {
                if let Some(h) = self.pending.take() {
                    host.cancel_frame(h);
                }
                self.last_tick = None;
                self.state = DriverState::Paused;
                debug!("paused");
                if self.variant == Variant::Static {
                    self.draw(now, 0.0)?;
                }
            }
            DriverState::Paused if animate => {
                self.state = DriverState::Running;
                self.last_tick = None;
                self.last_drawn = None;
                self.pending = Some(host.request_frame());
                debug!("resumed");
            }
            _ => {}
        }
        Ok(())
    }

    /// A paused static frame is repainted after changes that alter it.
    fn redraw_still(&mut self, now: Duration) -> FxResult<()> {
        if self.state == DriverState::Paused && self.variant == Variant::Static {
            self.draw(now, 0.0)?;
        }
        Ok(())
    }

    pub fn set_density(&mut self, density: f32, now: Duration) -> FxResult<()> {
        self.cfg.density = density.clamp(DENSITY_RANGE.0, DENSITY_RANGE.1);
        debug!(density = self.cfg.density, "density changed");
        if let Some(vp) = self.viewport {
            self.regrid(vp);
            self.redraw_still(now)?;
        }
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.cfg.speed = speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1);
        debug!(speed = self.cfg.speed, "speed changed");
    }

    fn measure<H: Host>(&self, host: &mut H) -> Viewport {
        host.viewport()
            .with_canvas_px(self.cfg.canvas_px.0, self.cfg.canvas_px.1)
    }

    fn regrid(&mut self, vp: Viewport) {
        let density = self.cfg.density * self.variant.density_scale();
        let grid = Grid::fit(vp, self.cfg.base_cell, density);
        self.canvas.resize(vp.cols, vp.rows);
        self.effect.resize(&grid);
        debug!(cols = grid.cols, rows = grid.rows, density, "grid fitted");
        self.viewport = Some(vp);
        self.grid = Some(grid);
    }

    /// Releases the pending frame and every listener, then the effect.
    pub fn unmount<H: Host>(&mut self, host: &mut H) {
        if let Some(h) = self.pending.take() {
            host.cancel_frame(h);
        }
        for id in self.listeners.drain(..) {
            host.unlisten(id);
        }
        if self.state != DriverState::Unmounted {
            self.effect.unmount();
            info!(effect = self.effect.name(), frames = self.frames, "effect unmounted");
        }
        self.state = DriverState::Unmounted;
    }
}
