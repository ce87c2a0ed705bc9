mod cli;
mod config;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::initialize_logging()?;

    tracing::debug!("starting docrev");

    cli::run().await?;

    Ok(())
}
