// Copyright (c) 2026 rezky_nightky

use std::thread;

use tracing::debug;

use crate::grid::Viewport;

/// Terminals smaller than this count as a small screen.
pub const MOBILE_COLS: u16 = 80;
pub const MOBILE_ROWS: u16 = 24;
/// At or below this many hardware threads the machine is low power.
pub const LOW_POWER_THREADS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub is_mobile: bool,
    pub is_low_power: bool,
    pub prefers_reduced_motion: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Full,
    /// Half density, throttled frame rate.
    Lite,
    /// One frame, no animation.
    Static,
}

impl Variant {
    pub fn density_scale(self) -> f32 {
        match self {
            Variant::Lite => 0.5,
            Variant::Full | Variant::Static => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variant::Full => "full",
            Variant::Lite => "lite",
            Variant::Static => "static",
        }
    }
}

fn is_small(vp: &Viewport) -> bool {
    vp.cols < MOBILE_COLS || vp.rows < MOBILE_ROWS
}

/// Capability snapshot with the update rules for each flag: `is_mobile`
/// follows resizes, `prefers_reduced_motion` follows preference changes, and
/// `is_low_power` is fixed once probed.
#[derive(Clone, Debug)]
pub struct Gate {
    caps: Capabilities,
}

impl Gate {
    pub fn probe(viewport: &Viewport, reduced_motion: bool) -> Self {
        let threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let caps = Capabilities {
            is_mobile: is_small(viewport),
            is_low_power: threads <= LOW_POWER_THREADS,
            prefers_reduced_motion: reduced_motion,
        };
        debug!(?caps, threads, "capabilities probed");
        Self::with_snapshot(caps)
    }

    pub fn with_snapshot(caps: Capabilities) -> Self {
        Self { caps }
    }

    pub fn snapshot(&self) -> Capabilities {
        self.caps
    }

    pub fn on_resize(&mut self, viewport: &Viewport) {
        self.caps.is_mobile = is_small(viewport);
    }

    pub fn on_motion_change(&mut self, reduced: bool) {
        self.caps.prefers_reduced_motion = reduced;
    }

    pub fn variant(&self) -> Variant {
        let c = &self.caps;
        if c.prefers_reduced_motion {
            Variant::Static
        } else if c.is_mobile || c.is_low_power {
            Variant::Lite
        } else {
            Variant::Full
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(m: bool, l: bool, r: bool) -> Capabilities {
        Capabilities {
            is_mobile: m,
            is_low_power: l,
            prefers_reduced_motion: r,
        }
    }

    #[test]
    fn variant_table() {
        assert_eq!(Gate::with_snapshot(caps(false, false, false)).variant(), Variant::Full);
        assert_eq!(Gate::with_snapshot(caps(true, false, false)).variant(), Variant::Lite);
        assert_eq!(Gate::with_snapshot(caps(false, true, false)).variant(), Variant::Lite);
        assert_eq!(Gate::with_snapshot(caps(true, true, true)).variant(), Variant::Static);
    }

    #[test]
    fn resize_recomputes_mobile_only() {
        let mut g = Gate::with_snapshot(caps(false, true, false));
        g.on_resize(&Viewport::new(60, 20, (0, 0)));
        assert!(g.snapshot().is_mobile);
        assert!(g.snapshot().is_low_power);
        g.on_resize(&Viewport::new(120, 40, (0, 0)));
        assert!(!g.snapshot().is_mobile);
        assert!(g.snapshot().is_low_power);
    }

    #[test]
    fn motion_change_flips_static() {
        let mut g = Gate::with_snapshot(caps(false, false, false));
        g.on_motion_change(true);
        assert_eq!(g.variant(), Variant::Static);
        g.on_motion_change(false);
        assert_eq!(g.variant(), Variant::Full);
    }

    #[test]
    fn probe_classifies_small_terminals() {
        let g = Gate::probe(&Viewport::new(79, 30, (0, 0)), false);
        assert!(g.snapshot().is_mobile);
        let g = Gate::probe(&Viewport::new(200, 60, (0, 0)), true);
        assert!(!g.snapshot().is_mobile);
        assert_eq!(g.variant(), Variant::Static);
    }

    #[test]
    fn lite_halves_density() {
        assert_eq!(Variant::Lite.density_scale(), 0.5);
        assert_eq!(Variant::Full.density_scale(), 1.0);
    }
}
