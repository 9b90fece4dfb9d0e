mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use agency_locator::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
