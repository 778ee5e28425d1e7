// =============================================================================
// parcel-track — WHERE IS MY STUFF
// =============================================================================
//
//   parcel-track YT2400000000000001
//   parcel-track 12345678901 --json
//   RUST_LOG=debug parcel-track YT2400000000000001 --stats
//
// Logs go to stderr so stdout stays clean for the parcel itself.
// Exit code 1 when nobody could tell us anything about the parcel.
// =============================================================================

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use parcel_track_engine::render::{render_json, render_text};
use parcel_track_engine::{builtin_registry, Config, Dispatcher, ResolveError};

/// Track a parcel across every courier that recognises its number.
#[derive(Parser, Debug)]
#[command(name = "parcel-track", version, about)]
struct Args {
    /// Tracking number to look up
    tracking_number: String,

    /// Print the merged record as JSON instead of the text layout
    #[arg(long)]
    json: bool,

    /// Print resolver counters to stderr when done
    #[arg(long)]
    stats: bool,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if config.log_json {
        builder.json().init();
    } else {
        builder
            .with_ansi(std::io::stderr().is_terminal())
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = Config::from_env();
    init_tracing(&config);

    match run(&args, &config).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{:#}", e), "parcel-track failed");
            eprintln!("parcel-track: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, config: &Config) -> anyhow::Result<ExitCode> {
    let registry = Arc::new(builtin_registry(config)?);
    let dispatcher = Dispatcher::new(registry, config);

    info!(tracking_number = %args.tracking_number, "Resolving");
    let result = dispatcher.resolve(&args.tracking_number).await;

    if args.stats {
        let snapshot = dispatcher.metrics().snapshot();
        eprintln!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    let parcel = match result {
        Ok(parcel) if parcel.is_empty() => {
            eprintln!("{}", empty_record_message(&args.tracking_number));
            return Ok(ExitCode::FAILURE);
        }
        Ok(parcel) => parcel,
        Err(e) => {
            eprintln!("{}", resolve_error_message(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    let output = if args.json {
        render_json(&parcel).context("serializing parcel")?
    } else {
        render_text(&parcel, std::io::stdout().is_terminal())
    };
    print!("{}", output);
    if args.json {
        println!();
    }

    Ok(ExitCode::SUCCESS)
}

fn resolve_error_message(error: &ResolveError) -> String {
    format!("could not resolve: {}", error)
}

fn empty_record_message(tracking_number: &str) -> String {
    format!(
        "Failed to get parcel information for tracking number: {}",
        tracking_number
    )
}
