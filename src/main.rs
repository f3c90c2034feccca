//! Entry point for the Lectern reader.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml` (or `--config`).
//! - Build the speech backend and launch the GUI, optionally opening a file.

mod app;
mod bookmark;
mod cancellation;
mod config;
mod document;
mod extract;
mod pagination;
mod playback;
mod speech;

use crate::app::run_app;
use crate::config::{DEFAULT_CONFIG_PATH, load_config, serialize_config};
use crate::speech::backend_from_config;
use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage: lectern [--config <path>] [--print-config] [<file.txt|file.pdf>]";

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliArgs {
    config_path: PathBuf,
    print_config: bool,
    document: Option<PathBuf>,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = load_config(&args.config_path);
    if args.print_config {
        print!("{}", serialize_config(&config)?);
        return Ok(());
    }

    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        config = %args.config_path.display(),
        level = %config.log_level,
        "Starting Lectern"
    );
    info!(
        backend = %config.tts_backend,
        model = %config.tts_model_path,
        voices_dir = %config.tts_voices_dir,
        rate = config.tts_rate,
        words_per_page = config.words_per_page,
        "Active speech configuration"
    );
    if let Some(path) = &args.document {
        if !path.exists() {
            bail!("File not found: {}", path.display());
        }
        info!(path = %path.display(), "Opening document from command line");
    }

    let backend = backend_from_config(&config);
    run_app(config, backend, args.document).context("Failed to start the GUI")?;
    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut parsed = CliArgs {
        config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        print_config: false,
        document: None,
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config needs a path\n{USAGE}"))?;
                parsed.config_path = PathBuf::from(path);
            }
            "--print-config" => parsed.print_config = true,
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("Unknown option {flag}\n{USAGE}"),
            path => {
                if parsed.document.is_some() {
                    bail!("Only one file can be opened at a time\n{USAGE}");
                }
                parsed.document = Some(PathBuf::from(path));
            }
        }
    }
    Ok(parsed)
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        info!("RUST_LOG is set; keeping its filter");
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
