// Copyright (c) 2026 rezky_nightky

mod boundary;
mod canvas;
mod cell;
mod charset;
mod config;
mod driver;
mod effects;
mod error;
mod field;
mod gate;
mod grid;
mod host;
mod logging;
mod ramp;
mod raster;
mod runtime;
mod terminal;
mod tone;

use std::env;
use std::time::Instant;

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::charset::print_list_charsets;
use crate::config::{
    color_enabled_stdout, color_mode_from_arg, default_params_usage_for_help,
    detect_color_mode_auto, print_help_detail, print_list_effects, Args, Settings,
};
use crate::driver::Driver;
use crate::error::FxResult;
use crate::gate::Gate;
use crate::host::{Host, TermHost};
use crate::ramp::print_list_ramps;
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn build_info() -> String {
    let sha = env!("ASCIIFIELD_GIT_SHA");
    if sha.is_empty() {
        env!("ASCIIFIELD_BUILD").to_string()
    } else {
        format!("{} ({})", env!("ASCIIFIELD_BUILD"), sha)
    }
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn install_signal_handlers() {
    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }
}

fn print_bitcolor(args: &Args) {
    let colorterm = env::var("COLORTERM").unwrap_or_default();
    let term = env::var("TERM").unwrap_or_default();
    let auto = detect_color_mode_auto();

    println!("BITCOLOR CHECK:");
    println!(
        "  COLORTERM: {}",
        if colorterm.is_empty() {
            "(unset)"
        } else {
            &colorterm
        }
    );
    println!(
        "  TERM: {}",
        if term.is_empty() { "(unset)" } else { &term }
    );
    println!("  auto_detected: {}", auto.label());
    match color_mode_from_arg(args.colormode) {
        Ok(effective) => {
            if args.colormode.is_some() {
                println!("  forced: {}", effective.label());
            }
            println!("  effective: {}", effective.label());
        }
        Err(e) => println!("  forced: {}", e),
    }
}

fn run(settings: &Settings, perf_stats: bool) -> FxResult<()> {
    let effect = effects::build(settings)?;

    let term = Terminal::new()?;
    let mut host = TermHost::new(term, settings.fps)?;
    let gate = Gate::probe(&host.viewport(), settings.reduced_motion);
    let mut driver = Driver::new(effect, settings.fallback(), settings.driver_config(), gate);

    let started = Instant::now();
    let res = host.run(&mut driver, &settings.run_options());
    drop(host);

    if perf_stats {
        let elapsed_s = started.elapsed().as_secs_f64().max(0.000_001);
        println!("PERF STATS:");
        println!("  effect: {}", settings.effect.name());
        println!("  variant: {}", driver.variant().label());
        println!("  elapsed_s: {:.3}", elapsed_s);
        println!("  target_fps: {:.3}", settings.fps);
        println!("  avg_fps: {:.3}", driver.frames() as f64 / elapsed_s);
        println!("  frames: {}", driver.frames());
        println!("  anim_time_s: {:.3}", driver.time());
        if let Some(grid) = driver.grid() {
            println!("  grid: {}x{}", grid.cols, grid.rows);
        }
        println!("  glyph_plots: {}", driver.canvas().plots());
        println!("  throttled: {}", driver.skipped());
        match driver.effect().cause() {
            Some(e) => println!("  fallback: {}", e),
            None => println!("  fallback: none"),
        }
    }
    res
}

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    install_signal_handlers();

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }
    cmd.build();

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_effects {
        print_list_effects();
        return Ok(());
    }

    if args.list_ramps {
        print_list_ramps();
        return Ok(());
    }

    if args.list_charsets {
        print_list_charsets();
        return Ok(());
    }

    if args.help_detail {
        print_help_detail();
        return Ok(());
    }

    if args.check_bitcolor {
        print_bitcolor(&args);
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let settings = match Settings::from_args(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(args.log.as_deref()) {
        eprintln!("failed to open log file: {}", e);
        std::process::exit(1);
    }
    tracing::info!(
        effect = settings.effect.name(),
        color_mode = settings.color_mode.label(),
        seed = settings.seed,
        "starting"
    );

    if let Err(e) = run(&settings, args.perf_stats) {
        tracing::error!(error = %e, "run failed");
        eprintln!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}
