use crate::error::{CusteioError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};
use reqwest::{Client, Url};
use std::io::{Cursor, Read};
use std::time::Duration;
use zip::result::ZipError;
use zip::ZipArchive;

pub const DEFAULT_REPO_URL: &str = "https://repositorio.dados.gov.br/seges/raio-x/";
pub const DEFAULT_FILE_PREFIX: &str = "raiox";
pub const DEFAULT_CSV_ENTRY: &str = "custeio-administrativo.csv";

/// Raw response from an archive host.
#[derive(Debug, Clone)]
pub struct FetchedArchive {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Anything that can GET a URL. The HTTP implementation is [`HttpTransport`].
#[async_trait]
pub trait ArchiveTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<FetchedArchive>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArchiveTransport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<FetchedArchive> {
        let res = self.client.get(url.clone()).send().await?;
        let status = res.status().as_u16();
        let body = res.bytes().await?.to_vec();
        Ok(FetchedArchive { status, body })
    }
}

/// Where the monthly archives live and what to pull out of them.
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    pub base_url: Url,
    pub file_prefix: String,
    pub csv_entry: String,
}

impl ArchiveSource {
    pub fn new(
        base_url: &str,
        file_prefix: impl Into<String>,
        csv_entry: impl Into<String>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CusteioError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self {
            base_url,
            file_prefix: file_prefix.into(),
            csv_entry: csv_entry.into(),
        })
    }
}

/// The extracted CSV bytes for one month.
#[derive(Debug, Clone)]
pub struct MonthlyExtract {
    pub month: u32,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `raiox-2021-03.zip` for prefix `raiox`, year 2021, month 3.
pub fn archive_file_name(prefix: &str, year: i32, month: u32) -> String {
    format!("{}-{}-{:02}.zip", prefix, year, month)
}

/// Resolves `file_name` as a single percent-encoded path segment under `base`.
pub fn archive_url(base: &Url, file_name: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| CusteioError::InvalidUrl(format!("{} cannot be used as a base", base)))?
        .pop_if_empty()
        .push(file_name);
    Ok(url)
}

pub fn extract_entry(archive: &[u8], entry: &str) -> std::result::Result<Vec<u8>, ZipError> {
    let mut archive = ZipArchive::new(Cursor::new(archive))?;
    let mut file = archive.by_name(entry)?;
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

pub struct ArchiveFetcher<T = HttpTransport> {
    transport: T,
    source: ArchiveSource,
    concurrency: usize,
}

impl<T: ArchiveTransport> ArchiveFetcher<T> {
    pub fn new(transport: T, source: ArchiveSource) -> Self {
        Self {
            transport,
            source,
            concurrency: 1,
        }
    }

    /// Number of months fetched at once. Output stays in month order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn source(&self) -> &ArchiveSource {
        &self.source
    }

    /// Fetches all twelve months of `year`. The first failing month aborts the run.
    pub async fn fetch_year(&self, year: i32) -> Result<Vec<MonthlyExtract>> {
        info!(
            "Fetching 12 monthly archives for {} from {} (concurrency {})",
            year, self.source.base_url, self.concurrency
        );

        stream::iter(1..=12u32)
            .map(|month| self.fetch_month(year, month))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    pub async fn fetch_month(&self, year: i32, month: u32) -> Result<MonthlyExtract> {
        NaiveDate::from_ymd_opt(year, month, 1).ok_or(CusteioError::InvalidMonth(month))?;

        let file_name = archive_file_name(&self.source.file_prefix, year, month);
        let url = archive_url(&self.source.base_url, &file_name)?;
        debug!("GET {}", url);

        let response = self
            .transport
            .get(&url)
            .await
            .map_err(|e| CusteioError::Fetch {
                month,
                url: url.to_string(),
                details: e.to_string(),
            })?;

        if !(200..300).contains(&response.status) {
            return Err(CusteioError::HttpStatus {
                month,
                url: url.to_string(),
                status: response.status,
            });
        }

        let bytes = extract_entry(&response.body, &self.source.csv_entry).map_err(|e| {
            CusteioError::Archive {
                month,
                entry: self.source.csv_entry.clone(),
                details: e.to_string(),
            }
        })?;

        debug!(
            "Month {:02}: extracted {} bytes from {}",
            month,
            bytes.len(),
            file_name
        );

        Ok(MonthlyExtract {
            month,
            file_name,
            bytes,
        })
    }
}
