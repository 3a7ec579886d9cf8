// Copyright (c) 2025 rezk_nightky

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

impl ColorMode {
    pub fn label(self) -> &'static str {
        match self {
            ColorMode::TrueColor => "24-bit truecolor",
            ColorMode::Color256 => "8-bit (256-color)",
            ColorMode::Color16 => "16-color",
            ColorMode::Mono => "mono",
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectKind {
    /// Procedural sine-octave field
    #[value(name = "backdrop")]
    Backdrop,
    /// Image sampled into the grid
    #[value(name = "portrait")]
    Portrait,
    /// Falling glyph columns
    #[value(name = "rain")]
    Rain,
    /// Lit rotating sphere
    #[value(name = "scene")]
    Scene,
    /// Flowing colour gradient
    #[value(name = "shader")]
    Shader,
}

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::Backdrop,
        EffectKind::Portrait,
        EffectKind::Rain,
        EffectKind::Scene,
        EffectKind::Shader,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Backdrop => "backdrop",
            EffectKind::Portrait => "portrait",
            EffectKind::Rain => "rain",
            EffectKind::Scene => "scene",
            EffectKind::Shader => "shader",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            EffectKind::Backdrop => "Sine-octave noise with radial falloff and vignette",
            EffectKind::Portrait => "Image sampled per cell with head tilt and limb sway (needs --image)",
            EffectKind::Rain => "Falling glyph columns over a charset pool",
            EffectKind::Scene => "Sphere lit by an orbiting light",
            EffectKind::Shader => "Flowing background gradient (truecolor) or flat scanline fallback",
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fit {
    #[value(name = "contain")]
    Contain,
    #[value(name = "stretch")]
    Stretch,
}
