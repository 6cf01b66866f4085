use crate::error::{CusteioError, Result};
use crate::fetcher::{DEFAULT_CSV_ENTRY, DEFAULT_FILE_PREFIX, DEFAULT_REPO_URL};
use crate::llm::{DEFAULT_MODEL, OPENAI_BASE_URL};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Runtime settings, read from the environment (and `.env` in the binary).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub year: i32,
    pub repo_url: String,
    pub file_prefix: String,
    pub csv_file: String,
    pub bind: SocketAddr,
    pub fetch_concurrency: usize,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let text = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let year: i32 = parse_or(get("CUSTEIO_YEAR"), "CUSTEIO_YEAR", 2021)?;
        if !(2000..=2100).contains(&year) {
            return Err(CusteioError::Config(format!(
                "CUSTEIO_YEAR {} is out of range",
                year
            )));
        }

        let fetch_concurrency: usize =
            parse_or(get("CUSTEIO_FETCH_CONCURRENCY"), "CUSTEIO_FETCH_CONCURRENCY", 1)?;
        let timeout_secs: u64 =
            parse_or(get("CUSTEIO_HTTP_TIMEOUT_SECS"), "CUSTEIO_HTTP_TIMEOUT_SECS", 120)?;

        Ok(Self {
            openai_api_key: get(API_KEY_VAR),
            openai_model: text("OPENAI_MODEL", DEFAULT_MODEL),
            openai_base_url: text("OPENAI_BASE_URL", OPENAI_BASE_URL),
            year,
            repo_url: text("CUSTEIO_REPO_URL", DEFAULT_REPO_URL),
            file_prefix: text("CUSTEIO_FILE_PREFIX", DEFAULT_FILE_PREFIX),
            csv_file: text("CUSTEIO_CSV_FILE", DEFAULT_CSV_ENTRY),
            bind: parse_or(
                get("CUSTEIO_BIND"),
                "CUSTEIO_BIND",
                SocketAddr::from(([127, 0, 0, 1], 8501)),
            )?,
            fetch_concurrency: fetch_concurrency.max(1),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| CusteioError::Config(format!("{}='{}': {}", key, value, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.year, 2021);
        assert_eq!(cfg.repo_url, "https://repositorio.dados.gov.br/seges/raio-x/");
        assert_eq!(cfg.file_prefix, "raiox");
        assert_eq!(cfg.csv_file, "custeio-administrativo.csv");
        assert_eq!(cfg.openai_model, "gpt-3.5-turbo");
        assert_eq!(cfg.bind.port(), 8501);
        assert_eq!(cfg.fetch_concurrency, 1);
        assert_eq!(cfg.http_timeout, Duration::from_secs(120));
        assert!(cfg.openai_api_key.is_none());
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let cfg = config(&[
            ("OPENAI_API_KEY", "sk-abc"),
            ("CUSTEIO_YEAR", "2022"),
            ("CUSTEIO_FETCH_CONCURRENCY", "0"),
            ("CUSTEIO_BIND", "0.0.0.0:9000"),
            ("OPENAI_MODEL", "  "),
        ])
        .unwrap();
        assert_eq!(cfg.openai_api_key.as_deref(), Some("sk-abc"));
        assert_eq!(cfg.year, 2022);
        assert_eq!(cfg.fetch_concurrency, 1);
        assert_eq!(cfg.bind.port(), 9000);
        assert_eq!(cfg.openai_model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        assert!(matches!(
            config(&[("CUSTEIO_YEAR", "vinte")]),
            Err(CusteioError::Config(_))
        ));
        assert!(matches!(
            config(&[("CUSTEIO_YEAR", "1850")]),
            Err(CusteioError::Config(_))
        ));
        assert!(matches!(
            config(&[("CUSTEIO_BIND", "nowhere")]),
            Err(CusteioError::Config(_))
        ));
    }
}
