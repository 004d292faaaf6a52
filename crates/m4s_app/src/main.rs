//! M4S Merge - command line entry point
//!
//! Handles:
//! - Argument parsing and application-level logging
//! - Configuration loading and directory creation
//! - The ffmpeg availability gate
//! - Running the job on a worker thread and rendering its messages

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use m4s_core::config::{ConfigManager, Settings};
use m4s_core::ffmpeg::FfmpegTool;
use m4s_core::logging::{init_tracing, LogConfig, LogLevel};
use m4s_core::orchestrator::ErrorKind;

mod cli;
mod worker;

use cli::{Cli, Command};
use worker::WorkerMsg;

/// Exit code when the job failed because of its input.
const EXIT_INPUT: u8 = 2;
/// Exit code when ffmpeg ran out of time.
const EXIT_TIMEOUT: u8 = 3;
/// Exit code when ffmpeg cannot be run at all.
const EXIT_UNAVAILABLE: u8 = 4;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    init_tracing(if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    });

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config_manager = ConfigManager::new(&config_path);
    if let Err(e) = config_manager.load_or_create() {
        tracing::warn!("Failed to load config {}: {}", config_path.display(), e);
        eprintln!("Warning: failed to load config: {}. Using defaults.", e);
    }
    if let Err(e) = config_manager.ensure_dirs_exist() {
        tracing::error!("Failed to create directories: {}", e);
        eprintln!("Warning: failed to create directories: {}", e);
    }

    tracing::info!("m4s-merge {} (core {})", env!("CARGO_PKG_VERSION"), m4s_core::version());
    tracing::info!("Config: {}", config_path.display());

    let mut settings = config_manager.settings().clone();
    if let Some(ffmpeg) = &cli.ffmpeg {
        settings.ffmpeg.path = ffmpeg.to_string_lossy().into_owned();
    }
    let tool = FfmpegTool::from_settings(&settings);

    if let Command::Check = cli.command {
        return Ok(check(&tool, &config_path));
    }
    if !tool.is_available() {
        print_install_guidance(&tool, &config_path);
        return Ok(ExitCode::from(EXIT_UNAVAILABLE));
    }

    let output_dir = match cli.output.clone().or_else(|| settings.paths.output_dir()) {
        Some(dir) => dir,
        None => default_output_dir()?,
    };
    let action = cli
        .command
        .into_action(output_dir, cli.name)
        .ok_or_else(|| anyhow!("command does not run a job"))?;

    let log_config = log_config(&settings, cli.verbose);
    let (handle, rx) =
        worker::spawn(action, settings, log_config).context("starting worker thread")?;

    let mut outcome = None;
    for msg in rx {
        match msg {
            WorkerMsg::Log(line) => eprintln!("{}", line),
            WorkerMsg::Progress {
                stage,
                percent,
                message,
            } => tracing::debug!("[{:>3}%] {}: {}", percent, stage, message),
            WorkerMsg::Finished(result) => outcome = Some(result),
        }
    }
    handle
        .join()
        .map_err(|_| anyhow!("worker thread panicked"))?;

    match outcome {
        Some(Ok(path)) => {
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Some(Err(e)) => {
            eprintln!("{}: {}", e.kind(), e.detail());
            Ok(ExitCode::from(exit_code_for(e.kind())))
        }
        None => bail!("worker finished without a result"),
    }
}

fn log_config(settings: &Settings, verbose: bool) -> LogConfig {
    let configured = LogConfig::from(&settings.logging);
    if verbose {
        LogConfig {
            show_timestamps: configured.show_timestamps,
            ..LogConfig::debug()
        }
    } else {
        configured
    }
}

fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        kind if kind.is_input_error() => EXIT_INPUT,
        ErrorKind::Timeout => EXIT_TIMEOUT,
        _ => 1,
    }
}

/// `<config dir>/m4s-merge/settings.toml`
fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("m4s-merge").join("settings.toml"))
        .context("no config directory on this platform; pass --config")
}

/// The Desktop if there is one, else the current directory.
fn default_output_dir() -> Result<PathBuf> {
    match dirs::desktop_dir().filter(|dir| dir.is_dir()) {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("resolving the current directory"),
    }
}

fn check(tool: &FfmpegTool, config_path: &Path) -> ExitCode {
    match tool.version() {
        Some(version) => {
            println!("{}", version);
            println!("program: {}", tool.program().display());
            ExitCode::SUCCESS
        }
        None => {
            print_install_guidance(tool, config_path);
            ExitCode::from(EXIT_UNAVAILABLE)
        }
    }
}

fn print_install_guidance(tool: &FfmpegTool, config_path: &Path) {
    eprintln!(
        "ffmpeg could not be run (tried `{} -version`).",
        tool.program().display()
    );
    eprintln!("Install it, for example with:");
    if cfg!(target_os = "windows") {
        eprintln!("  winget install Gyan.FFmpeg");
    } else if cfg!(target_os = "macos") {
        eprintln!("  brew install ffmpeg");
    } else {
        eprintln!("  sudo apt install ffmpeg   (or your distribution's package)");
    }
    eprintln!("then make sure it is on PATH, or point to it with --ffmpeg <PATH>");
    eprintln!("or the [ffmpeg] path setting in {}.", config_path.display());
}
