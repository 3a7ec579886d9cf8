// Copyright (c) 2026 rezky_nightky

//! Platform services the frame driver calls into: frame scheduling, listener
//! registration and viewport measurement.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use tracing::{debug, info, warn};

use crate::driver::Driver;
use crate::effects::Effect;
use crate::error::FxResult;
use crate::grid::Viewport;
use crate::terminal::Terminal;

/// Vertical scroll per wheel notch, in canvas px.
pub const SCROLL_STEP_PX: f32 = 48.0;
/// Longest wait for input while nothing is scheduled.
const IDLE_WAIT: Duration = Duration::from_millis(100);
/// Re-check cadence while an effect is still loading.
const LOAD_POLL: Duration = Duration::from_millis(20);

const DENSITY_STEP: f32 = 0.25;
const SPEED_STEP: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    Resize,
    Scroll,
    Pointer,
    Visibility,
    MotionPreference,
}

impl Signal {
    pub const ALL: [Signal; 5] = [
        Signal::Resize,
        Signal::Scroll,
        Signal::Pointer,
        Signal::Visibility,
        Signal::MotionPreference,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostEvent {
    Resize(Viewport),
    /// Scroll delta in canvas px, positive downward.
    Scroll(f32),
    /// Pointer position in canvas px.
    Pointer(f32, f32),
    Visibility(bool),
    /// `true` when reduced motion is preferred.
    MotionPreference(bool),
}

impl HostEvent {
    pub fn signal(&self) -> Signal {
        match self {
            HostEvent::Resize(_) => Signal::Resize,
            HostEvent::Scroll(_) => Signal::Scroll,
            HostEvent::Pointer(..) => Signal::Pointer,
            HostEvent::Visibility(_) => Signal::Visibility,
            HostEvent::MotionPreference(_) => Signal::MotionPreference,
        }
    }
}

pub trait Host {
    /// Schedules one callback before the next repaint.
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
    fn listen(&mut self, signal: Signal) -> ListenerId;
    fn unlisten(&mut self, id: ListenerId);
    fn viewport(&mut self) -> Viewport;
}

#[derive(Clone, Copy, Debug)]
pub struct RunOptions {
    pub duration: Option<Duration>,
    /// Any key quits.
    pub screensaver: bool,
}

/// Centre of a terminal cell in the canvas px of `vp`.
fn pointer_px(vp: &Viewport, col: u16, row: u16) -> (f32, f32) {
    let cw = vp.px_w as f32 / vp.cols.max(1) as f32;
    let ch = vp.px_h as f32 / vp.rows.max(1) as f32;
    ((col as f32 + 0.5) * cw, (row as f32 + 0.5) * ch)
}

enum Action {
    Quit,
    Deliver(HostEvent),
    Density(f32),
    Speed(f32),
}

/// Terminal-backed host. Frame callbacks fire on a fixed repaint tick.
pub struct TermHost {
    term: Terminal,
    tick: Duration,
    next_id: u64,
    pending: Option<(FrameHandle, Instant)>,
    listeners: HashMap<ListenerId, Signal>,
    last_tick: Instant,
    viewport: Viewport,
    user_paused: bool,
    focused: bool,
    reduced: bool,
}

impl TermHost {
    pub fn new(term: Terminal, fps: f64) -> FxResult<Self> {
        let viewport = term.viewport()?;
        Ok(Self {
            term,
            tick: Duration::from_secs_f64(1.0 / fps.max(1.0)),
            next_id: 0,
            pending: None,
            listeners: HashMap::new(),
            last_tick: Instant::now(),
            viewport,
            user_paused: false,
            focused: true,
            reduced: false,
        })
    }

    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn is_listening(&self, signal: Signal) -> bool {
        self.listeners.values().any(|s| *s == signal)
    }

    /// Mouse and focus reporting are only on while someone listens.
    fn sync_reporting(&mut self) {
        let mouse = self.is_listening(Signal::Scroll) || self.is_listening(Signal::Pointer);
        let focus = self.is_listening(Signal::Visibility);
        if let Err(e) = self.term.set_mouse_capture(mouse) {
            warn!(error = %e, "mouse capture unavailable");
        }
        if let Err(e) = self.term.set_focus_reports(focus) {
            warn!(error = %e, "focus reports unavailable");
        }
    }

    fn translate<E: Effect>(
        &mut self,
        ev: Event,
        driver: &Driver<E>,
        opts: &RunOptions,
    ) -> Option<Action> {
        match ev {
            Event::Resize(_, _) => {
                let vp = self.viewport();
                Some(Action::Deliver(HostEvent::Resize(vp)))
            }
            Event::FocusGained | Event::FocusLost => {
                self.focused = matches!(ev, Event::FocusGained);
                Some(Action::Deliver(HostEvent::Visibility(
                    self.focused && !self.user_paused,
                )))
            }
            Event::Mouse(m) => match m.kind {
                MouseEventKind::ScrollDown => Some(Action::Deliver(HostEvent::Scroll(SCROLL_STEP_PX))),
                MouseEventKind::ScrollUp => Some(Action::Deliver(HostEvent::Scroll(-SCROLL_STEP_PX))),
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    let vp = driver.viewport().unwrap_or(self.viewport);
                    let (x, y) = pointer_px(&vp, m.column, m.row);
                    Some(Action::Deliver(HostEvent::Pointer(x, y)))
                }
                _ => None,
            },
            Event::Key(k) if k.kind == KeyEventKind::Press => {
                if opts.screensaver {
                    return Some(Action::Quit);
                }
                match (k.code, k.modifiers) {
                    (KeyCode::Esc, _) | (KeyCode::Char('q'), _) => Some(Action::Quit),
                    (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),
                    (KeyCode::Char('m'), _) => {
                        self.reduced = !self.reduced;
                        Some(Action::Deliver(HostEvent::MotionPreference(self.reduced)))
                    }
                    (KeyCode::Char('p'), _) | (KeyCode::Char(' '), _) => {
                        self.user_paused = !self.user_paused;
                        Some(Action::Deliver(HostEvent::Visibility(
                            self.focused && !self.user_paused,
                        )))
                    }
                    (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => {
                        Some(Action::Density(driver.density() + DENSITY_STEP))
                    }
                    (KeyCode::Char('-'), _) => Some(Action::Density(driver.density() - DENSITY_STEP)),
                    (KeyCode::Up, _) => Some(Action::Speed(driver.speed() + SPEED_STEP)),
                    (KeyCode::Down, _) => Some(Action::Speed(driver.speed() - SPEED_STEP)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn present<E: Effect>(&mut self, driver: &mut Driver<E>) -> FxResult<()> {
        if driver.take_dirty() {
            self.term.present(driver.canvas_mut())?;
        }
        Ok(())
    }

    /// Mounts the driver, runs the frame loop until quit or timeout, and
    /// unmounts on every exit path.
    pub fn run<E: Effect>(&mut self, driver: &mut Driver<E>, opts: &RunOptions) -> FxResult<()> {
        let start = Instant::now();
        self.reduced = driver.gate().snapshot().prefers_reduced_motion;
        let res = driver
            .mount(self, Duration::ZERO)
            .and_then(|_| self.event_loop(driver, opts, start));
        driver.unmount(self);
        self.sync_reporting();
        info!(
            frames = driver.frames(),
            skipped = driver.skipped(),
            elapsed_s = start.elapsed().as_secs_f64(),
            "frame loop ended"
        );
        res
    }

    fn event_loop<E: Effect>(
        &mut self,
        driver: &mut Driver<E>,
        opts: &RunOptions,
        start: Instant,
    ) -> FxResult<()> {
        let end = opts.duration.map(|d| start + d);
        loop {
            self.present(driver)?;

            let now = Instant::now();
            if end.is_some_and(|e| now >= e) {
                return Ok(());
            }
            driver.poll(self, now - start)?;

            let mut timeout = match self.pending {
                Some((_, due)) => due.saturating_duration_since(now),
                None => IDLE_WAIT,
            };
            if driver.state() == crate::driver::DriverState::Initializing {
                timeout = timeout.min(LOAD_POLL);
            }
            if let Some(e) = end {
                timeout = timeout.min(e.saturating_duration_since(now));
            }

            if Terminal::poll_event(timeout)? {
                loop {
                    let ev = Terminal::read_event()?;
                    match self.translate(ev, driver, opts) {
                        Some(Action::Quit) => return Ok(()),
                        Some(Action::Deliver(hev)) => {
                            if self.is_listening(hev.signal()) {
                                driver.on_event(self, hev, start.elapsed())?;
                            }
                        }
                        Some(Action::Density(d)) => driver.set_density(d, start.elapsed())?,
                        Some(Action::Speed(s)) => driver.set_speed(s),
                        None => {}
                    }
                    if !Terminal::poll_event(Duration::ZERO)? {
                        break;
                    }
                }
            }

            if let Some((handle, due)) = self.pending {
                let now = Instant::now();
                if now >= due {
                    self.pending = None;
                    self.last_tick = now;
                    driver.on_frame(self, handle, now - start)?;
                }
            }
        }
    }
}

impl Host for TermHost {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.id());
        let due = (self.last_tick + self.tick).max(Instant::now());
        if let Some((old, _)) = self.pending.replace((handle, due)) {
            debug!(?old, "frame request replaced an outstanding one");
        }
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending.is_some_and(|(h, _)| h == handle) {
            self.pending = None;
        }
    }

    fn listen(&mut self, signal: Signal) -> ListenerId {
        let id = ListenerId(self.id());
        self.listeners.insert(id, signal);
        debug!(?id, ?signal, "listener added");
        self.sync_reporting();
        id
    }

    fn unlisten(&mut self, id: ListenerId) {
        if let Some(signal) = self.listeners.remove(&id) {
            debug!(?id, ?signal, "listener removed");
        }
        self.sync_reporting();
    }

    fn viewport(&mut self) -> Viewport {
        match self.term.viewport() {
            Ok(vp) => self.viewport = vp,
            Err(e) => warn!(error = %e, "terminal size unavailable, keeping last known"),
        }
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_event_maps_to_its_signal() {
        let evs = [
            HostEvent::Resize(Viewport::new(10, 10, (0, 0))),
            HostEvent::Scroll(1.0),
            HostEvent::Pointer(0.0, 0.0),
            HostEvent::Visibility(true),
            HostEvent::MotionPreference(false),
        ];
        let signals: Vec<Signal> = evs.iter().map(|e| e.signal()).collect();
        assert_eq!(signals, Signal::ALL);
    }

    #[test]
    fn pointer_follows_the_canvas_override() {
        let measured = Viewport::new(80, 24, (1600, 960));
        assert_eq!(pointer_px(&measured, 0, 0), (10.0, 20.0));

        let canvas = measured.with_canvas_px(Some(160), Some(48));
        assert_eq!(pointer_px(&canvas, 0, 0), (1.0, 1.0));
        let (x, y) = pointer_px(&canvas, 79, 23);
        assert!(x < 160.0 && y < 48.0);
    }
}
