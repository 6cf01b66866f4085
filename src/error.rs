use thiserror::Error;

#[derive(Error, Debug)]
pub enum CusteioError {
    #[error("Invalid month index {0}: must be between 1 and 12")]
    InvalidMonth(u32),

    #[error("Invalid archive URL: {0}")]
    InvalidUrl(String),

    #[error("Could not download archive for month {month:02} ({url}): {details}")]
    Fetch {
        month: u32,
        url: String,
        details: String,
    },

    #[error("Archive for month {month:02} returned HTTP {status} ({url})")]
    HttpStatus {
        month: u32,
        url: String,
        status: u16,
    },

    #[error("Could not extract '{entry}' from archive for month {month:02}: {details}")]
    Archive {
        month: u32,
        entry: String,
        details: String,
    },

    #[error("Month {month:02} is missing expected column '{column}'")]
    MissingColumn { month: u32, column: String },

    #[error("Month {month:02}, line {line}: invalid value '{value}' in column 'valor'")]
    InvalidValue {
        month: u32,
        line: u64,
        value: String,
    },

    #[error("CSV error in month {month:02}: {source}")]
    Csv {
        month: u32,
        #[source]
        source: csv::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("Chat completion failed: {0}")]
    ChatCompletion(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CusteioError>;
