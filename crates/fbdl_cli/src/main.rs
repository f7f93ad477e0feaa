mod cli;
mod config;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use engine_logging::{engine_error, engine_info, engine_warn, LogDestination};
use fbdl_core::{classify_input, ExitStatus, InputKind};
use fbdl_engine::{CookieJar, EngineHandle};
use log::LevelFilter;

use cli::{split_output, Args};
use config::{find_cookie_file, load_config, load_cookies, CONFIG_FILENAME};
use runner::BatchRunner;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(args) {
        Ok(status) => ExitCode::from(status.code()),
        Err(err) => {
            engine_error!("{:#}", err);
            eprintln!("fbdl: {err:#}");
            ExitCode::from(ExitStatus::NothingDone.code())
        }
    }
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let destination = match &args.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    engine_logging::initialize(destination, level);
}

fn run(args: Args) -> Result<ExitStatus> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| cwd.join(CONFIG_FILENAME));
    let config = load_config(&config_path, args.config.is_some())?;

    // Private videos need a logged-in session; public ones work without cookies.
    let cookies = match find_cookie_file(args.cookies.as_deref(), &cwd, dirs::home_dir().as_deref())? {
        Some(path) => {
            println!("using facebook cookies from file {}", path.display());
            load_cookies(&path)?
        }
        None => CookieJar::new(),
    };

    if let Some(resolution) = &args.resolution {
        engine_info!(
            "resolution {:?} requested; the page's published video is downloaded as-is",
            resolution
        );
    }

    let mut output_dir = args
        .output_dir
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| cwd.clone());

    let filename_override = match (args.output, classify_input(&args.url)) {
        (Some(_), InputKind::Listing) => {
            engine_warn!("--output is ignored for listing pages");
            None
        }
        (Some(output), InputKind::Single) => {
            let (dir, name) = split_output(&output_dir, &output)
                .with_context(|| format!("--output {} does not name a file", output.display()))?;
            output_dir = dir;
            Some(name)
        }
        (None, _) => None,
    };

    let jobs = args.jobs.unwrap_or(config.jobs);

    let engine = EngineHandle::new(config.engine_config(output_dir, cookies))
        .context("setting up the http client")?;

    let summary = BatchRunner::new(engine, std::io::stdout())
        .with_filename_override(filename_override)
        .run(args.url, jobs);
    Ok(summary.exit_status())
}
