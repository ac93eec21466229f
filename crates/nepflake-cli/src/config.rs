use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::bail;
use clap::{Args, Parser, Subcommand, ValueEnum};
use nepflake::{NEPTUNE_EPOCH, NeptuneGenerator, SystemClock};

const DEFAULT_EPOCH_MILLIS: u64 = NEPTUNE_EPOCH.as_millis() as u64;

/// Runtime configuration for the `nepflake` binary.
///
/// Identity and epoch are shared by every subcommand and can come from CLI
/// arguments, environment variables, or a `.env` file. Every generator that
/// must interoperate has to be started with the same epoch and a distinct
/// `(NODE_ID, DATA_CENTER_ID)` pair; nothing here checks that across hosts.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nepflake",
    version,
    about = "Issue and decode 64-bit Snowflake IDs"
)]
pub struct CliArgs {
    /// Node (machine) ID encoded into every issued ID.
    ///
    /// Must fit the 5-bit node field (0..=31).
    ///
    /// Environment variable: `NODE_ID`
    #[arg(long, env = "NODE_ID", default_value_t = 0, global = true, allow_negative_numbers = true)]
    pub node_id: i64,

    /// Data center ID encoded into every issued ID.
    ///
    /// Must fit the 5-bit data center field (0..=31).
    ///
    /// Environment variable: `DATA_CENTER_ID`
    #[arg(long, env = "DATA_CENTER_ID", default_value_t = 0, global = true, allow_negative_numbers = true)]
    pub data_center_id: i64,

    /// Epoch (milliseconds since 1970-01-01 UTC) that timestamps are relative
    /// to. Defaults to the Neptune epoch.
    ///
    /// Environment variable: `EPOCH_MILLIS`
    #[arg(long, env = "EPOCH_MILLIS", default_value_t = DEFAULT_EPOCH_MILLIS, global = true)]
    pub epoch_millis: u64,

    /// Emit logs as JSON instead of human-readable text. Logs always go to
    /// stderr.
    ///
    /// Environment variable: `LOG_JSON`
    #[arg(long, env = "LOG_JSON", default_value_t = false, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Issue new IDs, one per line on stdout.
    Generate(GenerateArgs),

    /// Decode IDs into timestamp, data center, node and sequence.
    Inspect {
        /// IDs to decode.
        #[arg(required = true, allow_negative_numbers = true)]
        ids: Vec<i64>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Number of IDs to issue.
    ///
    /// Environment variable: `ID_COUNT`
    #[arg(short = 'n', long, env = "ID_COUNT", default_value_t = 1)]
    pub count: usize,

    /// Number of threads sharing the generator.
    ///
    /// Environment variable: `ID_THREADS`
    #[arg(short, long, env = "ID_THREADS", default_value_t = 1)]
    pub threads: usize,

    /// How each ID is printed.
    ///
    /// Environment variable: `ID_FORMAT`
    #[arg(short, long, env = "ID_FORMAT", value_enum, default_value_t = OutputFormat::Decimal)]
    pub format: OutputFormat,

    /// How many times a single ID is retried after the clock moved backward
    /// before giving up.
    ///
    /// Environment variable: `MAX_CLOCK_RETRIES`
    #[arg(long, env = "MAX_CLOCK_RETRIES", default_value_t = 3)]
    pub max_clock_retries: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain decimal integer.
    Decimal,
    /// Zero-padded to 19 digits, so IDs also sort as strings.
    Padded,
    /// Multi-line listing of every field and its bit range.
    Debug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub node_id: i64,
    pub data_center_id: i64,
    pub epoch: Duration,
}

impl GeneratorConfig {
    /// Builds the wall-clock generator for this identity.
    ///
    /// Identity bounds are checked by the generator itself.
    pub fn build(&self) -> nepflake::Result<NeptuneGenerator> {
        NeptuneGenerator::new(
            self.node_id,
            self.data_center_id,
            SystemClock::with_epoch(self.epoch),
        )
    }

    pub fn epoch_millis(&self) -> i64 {
        SystemClock::with_epoch(self.epoch).epoch_millis()
    }
}

impl TryFrom<&CliArgs> for GeneratorConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CliArgs) -> Result<Self, Self::Error> {
        let epoch = Duration::from_millis(args.epoch_millis);
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?;

        if epoch > now {
            bail!(
                "EPOCH_MILLIS ({}) is in the future (now = {})",
                args.epoch_millis,
                now.as_millis()
            );
        }

        Ok(Self {
            node_id: args.node_id,
            data_center_id: args.data_center_id,
            epoch,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateConfig {
    pub count: usize,
    pub threads: usize,
    pub format: OutputFormat,
    pub max_clock_retries: u32,
}

impl TryFrom<GenerateArgs> for GenerateConfig {
    type Error = anyhow::Error;

    fn try_from(args: GenerateArgs) -> Result<Self, Self::Error> {
        if args.count == 0 {
            bail!("ID_COUNT must be greater than 0");
        }

        if args.threads == 0 {
            bail!("ID_THREADS must be greater than 0");
        }

        if args.threads > args.count {
            bail!(
                "ID_THREADS ({}) exceeds ID_COUNT ({})",
                args.threads,
                args.count
            );
        }

        Ok(Self {
            count: args.count,
            threads: args.threads,
            format: args.format,
            max_clock_retries: args.max_clock_retries,
        })
    }
}
