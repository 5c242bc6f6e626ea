mod cli;
mod infra;
mod mcp;
mod report;
mod routes;
mod server;

use unslop::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
