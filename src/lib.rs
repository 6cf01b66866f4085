//! # Custeio Insights
//!
//! An interactive dashboard over the monthly "Raio-X" administrative expenditure
//! archives of the Brazilian federal government, with narrative commentary from
//! a chat-completion model.
//!
//! ## Pipeline
//!
//! - **Fetch**: download `<prefix>-<year>-<MM>.zip` for every month and extract
//!   the expenditure CSV ([`fetcher`])
//! - **Assemble**: parse and validate each month, stack them into one typed
//!   [`Dataset`] ([`assembler`])
//! - **Filter**: three cascading dropdowns, each narrowed by the ones before it
//!   ([`filter`])
//! - **Summarize**: min, max, mean and sum as currency, plus a per-period bar
//!   series ([`summary`], [`format`])
//! - **Narrate**: two independent prompts over a text dump of the filtered rows
//!   ([`llm`])
//!
//! Fetching and assembling happen once at startup; everything after that is
//! re-run on each interaction by [`Dashboard::render`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use custeio_insights::*;
//!
//! let config = AppConfig::from_env()?;
//! let dashboard = build_dashboard(&config).await?;
//! let view = dashboard.render(&FilterState::default()).await;
//! println!("{} rows, sum {}", view.rows.len(), view.metrics[3].value);
//! ```

pub mod assembler;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod format;
pub mod html;
pub mod llm;
pub mod schema;
pub mod server;
pub mod summary;

pub use assembler::{load_dataset, parse_month, Dataset, Row};
pub use config::AppConfig;
pub use dashboard::{Dashboard, DashboardView};
pub use error::{CusteioError, Result};
pub use fetcher::*;
pub use filter::{
    cascade, filter_rows, Cascade, FilterColumn, FilterControl, FilterQuery, FilterState,
    Selection, SELECT_ALL,
};
pub use format::CurrencyFormat;
pub use llm::{ChatBackend, InsightGenerator, NarrativePanel, OpenAiClient, PanelBody};
pub use schema::*;
pub use server::{router, serve};
pub use summary::{Metric, PeriodSeries, PeriodTotal, Summary};

use config::API_KEY_VAR;
use log::{info, warn};
use std::sync::Arc;

/// Builds the chat backend from the configured credential. Without one, the
/// generator is created in its unavailable state and never calls out.
pub fn insight_generator(config: &AppConfig) -> Result<InsightGenerator> {
    match &config.openai_api_key {
        Some(api_key) => {
            let http = reqwest::Client::builder()
                .timeout(config.http_timeout)
                .build()?;
            let client = OpenAiClient::new(api_key.clone())
                .with_base_url(&config.openai_base_url)
                .with_http_client(http);
            info!("Narrative insights enabled (model {})", config.openai_model);
            Ok(InsightGenerator::new(Arc::new(client), &config.openai_model))
        }
        None => {
            warn!(
                "{}; narrative insights are disabled",
                CusteioError::MissingCredential(API_KEY_VAR.to_string())
            );
            Ok(InsightGenerator::unavailable(format!(
                "{} não configurada",
                API_KEY_VAR
            )))
        }
    }
}

/// Downloads and assembles the configured year, then wires up the dashboard.
/// Any fetch or schema failure aborts here.
pub async fn build_dashboard(config: &AppConfig) -> Result<Dashboard> {
    let transport = HttpTransport::new(config.http_timeout)?;
    let source = ArchiveSource::new(&config.repo_url, &config.file_prefix, &config.csv_file)?;
    let fetcher =
        ArchiveFetcher::new(transport, source).with_concurrency(config.fetch_concurrency);

    let dataset = load_dataset(&fetcher, config.year).await?;

    Ok(Dashboard::new(
        Arc::new(dataset),
        CurrencyFormat::pt_br()?,
        insight_generator(config)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credential_disables_insights() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let generator = insight_generator(&config).unwrap();
        assert!(!generator.is_available());

        let panels = generator.generate(&[]).await;
        assert!(panels
            .iter()
            .all(|p| p.body == PanelBody::Failed("OPENAI_API_KEY não configurada".to_string())));
    }

    #[test]
    fn test_credential_enables_insights() {
        let config = AppConfig::from_lookup(|key| {
            (key == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        })
        .unwrap();
        assert!(insight_generator(&config).unwrap().is_available());
    }
}
