#![doc = include_str!("../README.md")]

mod commands;
mod config;
mod telemetry;

use std::io::{self, BufWriter, Write};

use clap::Parser;
use config::{CliArgs, Command, GenerateConfig, GeneratorConfig};
use telemetry::init_telemetry;
use tracing::debug;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    init_telemetry(args.log_json)?;

    let config = GeneratorConfig::try_from(&args)?;
    debug!(?config, "resolved generator config");

    let mut out = BufWriter::new(io::stdout().lock());

    match args.command {
        Command::Generate(generate) => {
            let generate = GenerateConfig::try_from(generate)?;
            let generator = config.build()?;
            commands::generate(&generator, &generate, &mut out)?;
        }
        Command::Inspect { ids } => {
            commands::inspect(&ids, config.epoch_millis(), &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}
