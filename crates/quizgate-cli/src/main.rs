//! quizgate CLI — scripted assessment sessions against a host record.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quizgate",
    version,
    about = "Assessment session player for SCORM/AICC-style host records"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one scripted attempt and commit the result
    Play {
        /// Path to a .toml question bank
        #[arg(long)]
        bank: PathBuf,

        /// Comma-separated answers in presentation order ("-" skips;
        /// "pass"/"fail" for questions without a correct response)
        #[arg(long, allow_hyphen_values = true)]
        answers: String,

        /// Host record file (default: record_path from config)
        #[arg(long)]
        record: Option<PathBuf>,

        /// Seed for pooling and shuffling
        #[arg(long)]
        seed: Option<u64>,

        /// Save the attempt report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Resolve a persisted incorrect-question set against a bank
    Decode {
        /// Path to a .toml question bank
        #[arg(long)]
        bank: PathBuf,

        /// Encoded set, e.g. "0|2-1|4"
        #[arg(long)]
        incorrect: String,
    },

    /// Show the stored host record
    Record {
        /// Host record file (default: record_path from config)
        #[arg(long)]
        record: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizgate=warn".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            bank,
            answers,
            record,
            seed,
            report,
            config,
        } => commands::play::execute(bank, answers, record, seed, report, config).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Decode { bank, incorrect } => commands::decode::execute(bank, incorrect),
        Commands::Record { record, config } => commands::record::execute(record, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
