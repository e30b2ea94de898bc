use clap::{Parser, Subcommand};
use std::path::PathBuf;

use agentic_eval::batch::BatchPipeline;
use agentic_eval::client::ScoringClient;
use agentic_eval::config::{Config, DEFAULT_ENDPOINT, ServiceConfig};
use agentic_eval::dispatcher::Dispatcher;
use agentic_eval::output::{self, OutputFormat};
use agentic_eval::session::Session;

/// Agentic Evaluation CLI - score agent outputs against a remote scoring service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output format: plain or json
    #[arg(short, long, default_value = "plain", global = true)]
    output: OutputFormat,

    /// Verbose output - log every scoring request
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate every agent of a TOML session file, one request per agent
    Evaluate {
        /// Path to the session file
        session_file: PathBuf,
    },
    /// Evaluate a CSV file of agents as one ranked batch
    Batch {
        /// CSV file with prompt, response and metadata columns
        csv_file: PathBuf,

        /// Scoring service base URL
        #[arg(long, env = "AGENTIC_EVAL_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "agentic_eval=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut stdout = std::io::stdout().lock();

    match args.command {
        Command::Evaluate { session_file } => {
            let config = Config::from_file(&session_file)?;
            let client = ScoringClient::new(&config.service)?;

            let (session, cycle) = Session::new(config.roster()).begin_cycle();
            let results = Dispatcher::new(&client).evaluate(cycle.agents()).await?;
            let session = session.complete_cycle(cycle, results);

            output::write_results(&mut stdout, session.results(), args.output)?;
        }
        Command::Batch {
            csv_file,
            endpoint,
            timeout_secs,
        } => {
            let client = ScoringClient::new(&ServiceConfig {
                endpoint,
                timeout_secs,
            })?;

            let (session, cycle) = Session::default().begin_batch();
            let result = BatchPipeline::new(&client).ingest(&csv_file).await?;
            let session = session.complete_batch(cycle, result);

            if let Some(batch) = session.batch() {
                output::write_batch(&mut stdout, batch, args.output)?;
            }
        }
    }

    Ok(())
}
