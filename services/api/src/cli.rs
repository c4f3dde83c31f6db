use crate::commands::{run_evaluate, run_score, EvaluateArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use quest_verifier::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Quest Verifier",
    about = "Verify quest submissions and score them from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the per-rule score breakdown for a submission text
    Score(ScoreArgs),
    /// Evaluate a JSON submission file against a fresh in-memory ledger
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Evaluate(args) => run_evaluate(args).await,
    }
}
