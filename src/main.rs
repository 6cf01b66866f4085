use anyhow::Context;
use custeio_insights::{build_dashboard, serve, AppConfig};
use dotenv::dotenv;
use env_logger::Env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let dashboard = build_dashboard(&config)
        .await
        .with_context(|| format!("failed to load expenditure data for {}", config.year))?;

    serve(Arc::new(dashboard), config.bind).await?;
    Ok(())
}
