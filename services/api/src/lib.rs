mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use homebuyer_assist::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
