use std::fs::File;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sumstats_harmonizer::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("sumstats_harmonizer=debug,info")
    } else {
        EnvFilter::new("sumstats_harmonizer=info")
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();

    match &cli.log {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            subscriber.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => subscriber.with_writer(std::io::stderr).init(),
    }

    match cli.command {
        cli::Commands::Harmonize(args) => {
            cli::harmonize::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::InferBuild(args) => {
            cli::infer::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Qc(args) => {
            cli::qc::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
