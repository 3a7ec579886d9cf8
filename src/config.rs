// Copyright (c) 2026 rezky_nightky

use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::boundary::Fallback;
use crate::charset::pool_from_str;
use crate::driver::{DriverConfig, DENSITY_RANGE, SPEED_RANGE};
use crate::error::{FxError, FxResult};
use crate::grid::CellSize;
use crate::host::RunOptions;
use crate::ramp::Ramp;
use crate::runtime::{ColorMode, EffectKind, Fit};
use crate::tone::{Rgb, ToneMap};

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  asciifield --effect backdrop --density 1 --speed 1 --opacity 1 --accent green --threshold 0.7 --ramp standard --cell 8x16 --fps 60 --lite-fps 30";

pub fn color_enabled_stdout() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help_detail(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        if is_heading {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
        } else if let Some(rest) = line.strip_prefix("      Example:") {
            out.push_str("      \x1b[32mExample:\x1b[0m");
            out.push_str(rest);
        } else if let Some(rest) = line.strip_prefix("  asciifield") {
            out.push_str("  \x1b[1;34masciifield\x1b[0m");
            out.push_str(rest);
        } else if let Some(rest) = line.strip_prefix("  -") {
            out.push_str("  \x1b[33m-");
            out.push_str(rest);
            out.push_str("\x1b[0m");
        } else {
            out.push_str(line);
        }
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help_detail(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "asciifield", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 'e',
        long = "effect",
        default_value_t = EffectKind::Backdrop,
        value_enum,
        help_heading = "GENERAL",
        help = "Effect to run (see --list-effects)"
    )]
    pub effect: EffectKind,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "reduced-motion",
        help_heading = "GENERAL",
        help = "Render one still frame (also set by REDUCE_MOTION=1)"
    )]
    pub reduced_motion: bool,

    #[arg(long = "seed", help_heading = "GENERAL", help = "Seed for the random source")]
    pub seed: Option<u64>,

    #[arg(
        long = "log",
        value_name = "PATH",
        help_heading = "GENERAL",
        help = "Write logs to PATH (filter with ASCIIFIELD_LOG)"
    )]
    pub log: Option<PathBuf>,

    #[arg(
        short = 'c',
        long = "accent",
        default_value = "green",
        help_heading = "APPEARANCE",
        help = "Accent colour: name, #rrggbb or hue in degrees"
    )]
    pub accent: String,

    #[arg(
        short = 'o',
        long = "opacity",
        default_value_t = 1.0,
        help_heading = "APPEARANCE",
        help = "Global glyph opacity (min 0 max 1)"
    )]
    pub opacity: f32,

    #[arg(
        short = 't',
        long = "threshold",
        default_value_t = 0.7,
        help_heading = "APPEARANCE",
        help = "Brightness where the accent blend starts (min 0 max 0.99)"
    )]
    pub threshold: f32,

    #[arg(
        short = 'r',
        long = "ramp",
        default_value = "standard",
        help_heading = "APPEARANCE",
        help = "Glyph ramp preset (see --list-ramps)"
    )]
    pub ramp: String,

    #[arg(
        long = "ramp-chars",
        help_heading = "APPEARANCE",
        help = "Custom ramp, sparsest glyph first"
    )]
    pub ramp_chars: Option<String>,

    #[arg(
        long = "flat",
        help_heading = "APPEARANCE",
        help = "Disable the radial falloff of the backdrop"
    )]
    pub flat: bool,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit"
    )]
    pub colormode: Option<u16>,

    #[arg(
        short = 'd',
        long = "density",
        default_value_t = 1.0,
        help_heading = "PERFORMANCE",
        help = "Cells per base cell (min 0.1 max 4)"
    )]
    pub density: f32,

    #[arg(
        short = 'S',
        long = "speed",
        default_value_t = 1.0,
        help_heading = "PERFORMANCE",
        help = "Animation time scale (min 0 max 10)"
    )]
    pub speed: f32,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "PERFORMANCE",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "lite-fps",
        default_value_t = 30.0,
        help_heading = "PERFORMANCE",
        help = "Target FPS on small or low-power setups (min 1 max 120)"
    )]
    pub lite_fps: f32,

    #[arg(
        long = "cell",
        default_value = "8x16",
        help_heading = "PERFORMANCE",
        help = "Base cell size in px: WxH"
    )]
    pub cell: CellSize,

    #[arg(long = "width", help_heading = "PERFORMANCE", help = "Canvas width in px")]
    pub width: Option<u32>,

    #[arg(long = "height", help_heading = "PERFORMANCE", help = "Canvas height in px")]
    pub height: Option<u32>,

    #[arg(
        long = "perf-stats",
        help_heading = "PERFORMANCE",
        help = "Print frame statistics on exit"
    )]
    pub perf_stats: bool,

    #[arg(
        short = 'i',
        long = "image",
        value_name = "PATH",
        help_heading = "PORTRAIT",
        help = "Source image for the portrait effect"
    )]
    pub image: Option<PathBuf>,

    #[arg(
        long = "fit",
        default_value_t = Fit::Contain,
        value_enum,
        help_heading = "PORTRAIT",
        help = "How the image fills the grid"
    )]
    pub fit: Fit,

    #[arg(
        long = "tilt",
        default_value_t = 6.0,
        help_heading = "PORTRAIT",
        help = "Peak head tilt in degrees (min 0 max 45)"
    )]
    pub tilt: f32,

    #[arg(
        long = "shimmer",
        default_value_t = 0.0,
        help_heading = "PORTRAIT",
        help = "Chance in percent that a glyph shimmers (min 0 max 100)"
    )]
    pub shimmer: f32,

    #[arg(
        long = "seam",
        default_value_t = 0.0,
        help_heading = "PORTRAIT",
        help = "Half-width of the faded centre seam, as a fraction of the width (min 0 max 0.5)"
    )]
    pub seam: f32,

    #[arg(
        long = "charset",
        default_value = "auto",
        help_heading = "RAIN",
        help = "Rain glyph pool (see --list-charsets)"
    )]
    pub charset: String,

    #[arg(
        long = "activity",
        default_value_t = 0.7,
        help_heading = "RAIN",
        help = "Fraction of columns with a falling trail (min 0 max 1)"
    )]
    pub activity: f32,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "help-detail",
        help_heading = "HELP",
        help = "Show detailed help for all parameters and exit"
    )]
    pub help_detail: bool,

    #[arg(long = "list-effects", help_heading = "HELP", help = "List effects and exit")]
    pub list_effects: bool,

    #[arg(long = "list-ramps", help_heading = "HELP", help = "List ramp presets and exit")]
    pub list_ramps: bool,

    #[arg(
        long = "list-charsets",
        help_heading = "HELP",
        help = "List rain charset presets and exit"
    )]
    pub list_charsets: bool,

    #[arg(long = "info", help_heading = "HELP", help = "Print version info and exit")]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

/// Validated run configuration.
#[derive(Clone, Debug)]
pub struct Settings {
    pub effect: EffectKind,
    pub density: f32,
    pub speed: f32,
    pub opacity: f32,
    pub accent: Rgb,
    pub threshold: f32,
    pub ramp: Ramp,
    pub radial: bool,
    pub color_mode: ColorMode,
    pub base_cell: CellSize,
    pub canvas_px: (Option<u32>, Option<u32>),
    pub fps: f64,
    pub lite_fps: f32,
    pub reduced_motion: bool,
    pub duration: Option<Duration>,
    pub screensaver: bool,
    pub seed: u64,
    pub image: Option<PathBuf>,
    pub fit: Fit,
    pub tilt_deg: f32,
    /// Per-glyph shimmer chance as a fraction.
    pub shimmer: f32,
    pub seam: f32,
    pub pool: Vec<char>,
    pub activity: f32,
}

fn require_f32_range(name: &str, v: f32, min: f32, max: f32) -> FxResult<f32> {
    if !v.is_finite() {
        return Err(FxError::config(format!("{} {} (must be a finite number)", name, v)));
    }
    if v < min || v > max {
        return Err(FxError::config(format!("{} {} (min {} max {})", name, v, min, max)));
    }
    Ok(v)
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> FxResult<f64> {
    if !v.is_finite() {
        return Err(FxError::config(format!("{} {} (must be a finite number)", name, v)));
    }
    if v < min || v > max {
        return Err(FxError::config(format!("{} {} (min {} max {})", name, v, min, max)));
    }
    Ok(v)
}

fn require_px(name: &str, v: Option<u32>) -> FxResult<Option<u32>> {
    match v {
        Some(0) => Err(FxError::config(format!("{} 0 (must be positive)", name))),
        Some(px) if px > 65_535 => {
            Err(FxError::config(format!("{} {} (max 65535)", name, px)))
        }
        other => Ok(other),
    }
}

pub fn default_to_ascii() -> bool {
    let lang = env::var("LANG").unwrap_or_default();
    !lang.to_ascii_uppercase().contains("UTF")
}

/// `REDUCE_MOTION` counts when set to anything but an explicit off value.
pub fn reduce_motion_from_env(v: Option<&str>) -> bool {
    match v.map(|s| s.trim().to_ascii_lowercase()) {
        None => false,
        Some(s) => !matches!(s.as_str(), "" | "0" | "false" | "no" | "off"),
    }
}

pub fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term.contains("256color") {
        return ColorMode::Color256;
    }

    ColorMode::Color256
}

pub fn color_mode_from_arg(forced: Option<u16>) -> FxResult<ColorMode> {
    match forced {
        None => Ok(detect_color_mode_auto()),
        Some(0) => Ok(ColorMode::Mono),
        Some(16) => Ok(ColorMode::Color16),
        Some(8) | Some(256) => Ok(ColorMode::Color256),
        Some(24) | Some(32) => Ok(ColorMode::TrueColor),
        Some(m) => Err(FxError::config(format!(
            "--colormode {} (allowed: 0,16,8/256,24/32)",
            m
        ))),
    }
}

impl Settings {
    pub fn from_args(args: &Args) -> FxResult<Self> {
        let density = require_f32_range("--density", args.density, DENSITY_RANGE.0, DENSITY_RANGE.1)?;
        let speed = require_f32_range("--speed", args.speed, SPEED_RANGE.0, SPEED_RANGE.1)?;
        let opacity = require_f32_range("--opacity", args.opacity, 0.0, 1.0)?;
        let threshold = require_f32_range("--threshold", args.threshold, 0.0, 0.99)?;
        let fps = require_f64_range("--fps", args.fps, 1.0, 240.0)?;
        let lite_fps = require_f32_range("--lite-fps", args.lite_fps, 1.0, 120.0)?;
        let tilt_deg = require_f32_range("--tilt", args.tilt, 0.0, 45.0)?;
        let shimmer = require_f32_range("--shimmer", args.shimmer, 0.0, 100.0)? / 100.0;
        let seam = require_f32_range("--seam", args.seam, 0.0, 0.5)?;
        let activity = require_f32_range("--activity", args.activity, 0.0, 1.0)?;

        let duration = match args.duration {
            Some(s) if !s.is_finite() => {
                return Err(FxError::config(format!(
                    "--duration {} (must be a finite number)",
                    s
                )))
            }
            Some(s) if s > 0.0 => Some(Duration::from_secs_f64(require_f64_range(
                "--duration",
                s,
                0.1,
                86400.0,
            )?)),
            _ => None,
        };

        let ramp = match &args.ramp_chars {
            Some(chars) => Ramp::new(chars)?,
            None => Ramp::preset(&args.ramp)?,
        };

        let base_cell = args.cell;
        if !(base_cell.w >= 1.0 && base_cell.h >= 1.0 && base_cell.w <= 256.0 && base_cell.h <= 256.0) {
            return Err(FxError::config(format!(
                "--cell {}x{} (each side min 1 max 256)",
                base_cell.w, base_cell.h
            )));
        }

        Ok(Self {
            effect: args.effect,
            density,
            speed,
            opacity,
            accent: Rgb::parse(&args.accent)?,
            threshold,
            ramp,
            radial: !args.flat,
            color_mode: color_mode_from_arg(args.colormode)?,
            base_cell,
            canvas_px: (require_px("--width", args.width)?, require_px("--height", args.height)?),
            fps,
            lite_fps,
            reduced_motion: args.reduced_motion
                || reduce_motion_from_env(env::var("REDUCE_MOTION").ok().as_deref()),
            duration,
            screensaver: args.screensaver,
            seed: args.seed.unwrap_or_else(rand::random),
            image: args.image.clone(),
            fit: args.fit,
            tilt_deg,
            shimmer,
            seam,
            pool: pool_from_str(&args.charset, default_to_ascii())?,
            activity,
        })
    }

    pub fn tones(&self) -> ToneMap {
        ToneMap::new(self.accent, self.threshold, self.opacity, self.color_mode)
    }

    pub fn fallback(&self) -> Fallback {
        Fallback::from_accent(self.accent, self.color_mode)
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            base_cell: self.base_cell,
            density: self.density,
            speed: self.speed,
            lite_fps: self.lite_fps,
            canvas_px: self.canvas_px,
            bg: self.tones().bg_color(),
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            duration: self.duration,
            screensaver: self.screensaver,
        }
    }
}

pub fn print_list_effects() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mAVAILABLE EFFECTS:\x1b[0m");
    } else {
        println!("AVAILABLE EFFECTS:");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    for kind in EffectKind::ALL {
        println!("{:<12} {}", kind.name(), kind.describe());
    }
}

pub fn print_help_detail() {
    let block = format!(
        "{}\n\nUSAGE:\n  asciifield [OPTIONS]\n\nGENERAL:\n  -e, --effect <name>\n      Effect to run (backdrop, portrait, rain, scene, shader).\n      Example: asciifield -e rain\n\n  --duration <seconds>\n      Stop after N seconds (min 0.1 max 86400).\n      Example: asciifield --duration 10\n\n  -s, --screensaver\n      Screensaver mode (exit on keypress).\n\n  --reduced-motion\n      Draw one still frame and never animate. REDUCE_MOTION=1 does the same.\n\n  --seed <number>\n      Seed for rain and shimmer randomness.\n      Example: asciifield -e rain --seed 7\n\n  --log <path>\n      Write logs to a file; filter with ASCIIFIELD_LOG (default info).\n      Example: ASCIIFIELD_LOG=debug asciifield --log /tmp/af.log\n\nAPPEARANCE:\n  -c, --accent <colour>\n      Accent as a name, #rrggbb or hue in degrees.\n      Example: asciifield --accent '#ff8800'\n\n  -o, --opacity <number>\n      Global glyph opacity (min 0 max 1).\n\n  -t, --threshold <number>\n      Brightness where the accent blend starts (min 0 max 0.99).\n\n  -r, --ramp <name>\n      Ramp preset (see --list-ramps).\n\n  --ramp-chars <string>\n      Custom ramp, sparsest first.\n      Example: asciifield --ramp-chars ' .oO@'\n\n  --flat\n      No radial falloff on the backdrop.\n\n  --colormode <0|16|8|24>\n      Force color mode; otherwise auto-detected from COLORTERM/TERM.\n\nPERFORMANCE:\n  -d, --density <number>\n      Cells per base cell (min 0.1 max 4).\n\n  -S, --speed <number>\n      Animation time scale (min 0 max 10).\n\n  -f, --fps <number>\n      Target FPS (min 1 max 240).\n\n  --lite-fps <number>\n      Target FPS on small terminals or low-power machines (min 1 max 120).\n\n  --cell <WxH>\n      Base cell size in px.\n      Example: asciifield --cell 8x14\n\n  --width <px>, --height <px>\n      Canvas size override in px.\n\n  --perf-stats\n      Print frame statistics on exit.\n\nPORTRAIT:\n  -i, --image <path>\n      Source image (png, jpeg, gif).\n      Example: asciifield -e portrait -i face.png --shimmer 2\n\n  --fit <contain|stretch>\n  --tilt <degrees>        min 0 max 45\n  --shimmer <percent>     min 0 max 100\n  --seam <fraction>       min 0 max 0.5\n\nRAIN:\n  --charset <name>\n      Glyph pool (see --list-charsets).\n\n  --activity <number>\n      Fraction of active columns (min 0 max 1).\n\nKEYS:\n  q, Esc        quit\n  m             toggle reduced motion\n  p, Space      pause / resume\n  +, -          density\n  Up, Down      speed\n  mouse wheel   scroll\n",
        DEFAULT_PARAMS_USAGE
    );

    if color_enabled_stdout() {
        print!("{}", colorize_help_detail(&block));
    } else {
        print!("{}", block);
    }
    println!();
    print_list_effects();
}
