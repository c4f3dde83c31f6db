mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use quest_verifier::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
