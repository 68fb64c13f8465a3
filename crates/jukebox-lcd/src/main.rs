use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use jukebox_lcd::backend::{HttpBackend, MediaBackend, MockBackend};
use jukebox_lcd::display::{DisplaySink, FramebufferDisplay, TerminalDisplay};
use jukebox_lcd::failure_log::FailureLog;
use jukebox_lcd::keys::{KeySource, ScriptedKeys, TerminalKeys};
use jukebox_lcd::{Controller, Settings};
use jukebox_proto::config::{BackendKind, Config, DisplayKind};

#[derive(Parser)]
#[command(name = "jukebox", version, about = "Speaker remote control for a small LCD")]
struct Args {
    #[arg(short, long, help = "Config file (default: <config dir>/jukebox/config.toml)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Use the built-in mock library instead of the speaker bridge")]
    mock: bool,

    #[arg(short, long, help = "Log at debug level, including per-region draw timings")]
    debug: bool,

    #[arg(long, help = "Replay whitespace-separated key names instead of reading the keyboard")]
    script: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading config")?;

    if let Some(dir) = config.paths.log_file.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.paths.log_file)?;

    // RUST_LOG wins; keep HTTP client internals quiet otherwise.
    let default_level = if args.debug { "debug" } else { "info" };
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("{},hyper_util=warn,reqwest=warn,hyper=warn", default_level));
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("jukebox log: {}", config.paths.log_file.display());
    tracing::info!("jukebox starting…");

    // ── Devices ──────────────────────────────────────────────────────────────
    let backend: Box<dyn MediaBackend> = if args.mock || config.backend.kind == BackendKind::Mock {
        tracing::info!("using mock backend");
        Box::new(MockBackend::default())
    } else {
        tracing::info!("using speaker bridge at {}", config.backend.base_url);
        Box::new(HttpBackend::new(
            &config.backend.base_url,
            config.backend.request_timeout(),
        )?)
    };

    let display: Box<dyn DisplaySink> = match config.display.kind {
        DisplayKind::Terminal => Box::new(TerminalDisplay::new(
            config.display.width,
            config.display.height,
        )?),
        DisplayKind::Framebuffer => Box::new(FramebufferDisplay::open(
            &config.display.framebuffer,
            config.display.backlight.clone(),
            config.display.width,
            config.display.height,
        )?),
    };

    let keys: Box<dyn KeySource> = match &args.script {
        Some(script) => Box::new(ScriptedKeys::parse(script)),
        None => Box::new(TerminalKeys::new()?),
    };

    // ── Run ──────────────────────────────────────────────────────────────────
    let failures = FailureLog::new(&config.paths.failure_log);
    let mut controller = Controller::new(
        keys,
        display,
        backend,
        Settings::from_config(&config),
        failures,
    )?;
    controller.run()?;

    tracing::info!("jukebox exiting");
    Ok(())
}
