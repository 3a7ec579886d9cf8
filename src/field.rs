// Copyright (c) 2026 rezky_nightky

//! Procedural brightness fields built from sine octaves.

/// One sine term: `amp * sin(x*fx + y*fy + t*ft + phase)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Octave {
    pub fx: f32,
    pub fy: f32,
    pub ft: f32,
    pub amp: f32,
    pub phase: f32,
}

/// Multiplies the raw sum by `1 - (d / radius)^2` (floored at `floor`),
/// where `d` is the pixel distance to the centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Falloff {
    pub radius: f32,
    pub floor: f32,
}

impl Falloff {
    pub fn weight(&self, x: f32, y: f32, cx: f32, cy: f32) -> f32 {
        let r = self.radius.max(1.0);
        let d = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt() / r;
        (1.0 - d * d).max(self.floor)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoiseField {
    pub octaves: Vec<Octave>,
    pub falloff: Option<Falloff>,
    /// Nominal bound of the raw sum; normalization is `(v + span) / (2 * span)`.
    pub span: f32,
}

impl Default for NoiseField {
    fn default() -> Self {
        Self {
            octaves: vec![
                Octave {
                    fx: 0.010,
                    fy: 0.006,
                    ft: 0.45,
                    amp: 0.6,
                    phase: 0.0,
                },
                Octave {
                    fx: -0.023,
                    fy: 0.031,
                    ft: -0.8,
                    amp: 0.4,
                    phase: 1.7,
                },
                Octave {
                    fx: 0.071,
                    fy: -0.058,
                    ft: 1.9,
                    amp: 0.2,
                    phase: 4.1,
                },
            ],
            falloff: None,
            span: 1.2,
        }
    }
}

impl NoiseField {
    /// Raw octave sum at pixel `(x, y)` and time `t`, before falloff.
    pub fn raw(&self, x: f32, y: f32, t: f32) -> f32 {
        self.octaves
            .iter()
            .map(|o| o.amp * (x * o.fx + y * o.fy + t * o.ft + o.phase).sin())
            .sum()
    }

    /// Brightness in [0, 1]. `centre` is the falloff centre in pixels.
    pub fn brightness(&self, x: f32, y: f32, t: f32, centre: (f32, f32)) -> f32 {
        let mut v = self.raw(x, y, t);
        if let Some(f) = &self.falloff {
            v *= f.weight(x, y, centre.0, centre.1);
        }
        let span = self.span.max(f32::EPSILON);
        ((v + span) / (2.0 * span)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_is_deterministic() {
        let f = NoiseField {
            falloff: Some(Falloff {
                radius: 300.0,
                floor: 0.2,
            }),
            ..NoiseField::default()
        };
        for &(x, y, t) in &[(0.0, 0.0, 0.0), (13.0, 97.0, 2.5), (640.0, 12.0, 1000.25)] {
            assert_eq!(
                f.brightness(x, y, t, (320.0, 200.0)).to_bits(),
                f.brightness(x, y, t, (320.0, 200.0)).to_bits()
            );
        }
    }

    #[test]
    fn brightness_stays_in_unit_range() {
        let mut f = NoiseField::default();
        // Amplitudes deliberately exceed the nominal span.
        f.octaves[0].amp = 3.0;
        for i in 0..200 {
            let b = f.brightness(i as f32 * 7.0, i as f32 * 3.0, i as f32 * 0.1, (0.0, 0.0));
            assert!((0.0..=1.0).contains(&b));
        }
    }

    #[test]
    fn zero_sum_maps_to_midpoint() {
        let f = NoiseField {
            octaves: Vec::new(),
            falloff: None,
            span: 1.2,
        };
        assert!((f.brightness(5.0, 5.0, 5.0, (0.0, 0.0)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn falloff_is_one_at_centre_and_floored_far_away() {
        let fo = Falloff {
            radius: 100.0,
            floor: 0.25,
        };
        assert_eq!(fo.weight(50.0, 50.0, 50.0, 50.0), 1.0);
        assert_eq!(fo.weight(1000.0, 50.0, 50.0, 50.0), 0.25);
    }

    #[test]
    fn time_moves_the_field() {
        let f = NoiseField::default();
        assert_ne!(f.raw(10.0, 10.0, 0.0), f.raw(10.0, 10.0, 1.0));
    }
}
