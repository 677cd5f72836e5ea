mod cli;
mod estimate;
mod infra;
mod routes;
mod server;

use relocation_calc::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
