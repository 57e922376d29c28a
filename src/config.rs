use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const CREDENTIALS_ENV: &str = "GOOGLE_CREDENTIALS";
pub const HTTP_ADDR_ENV: &str = "SHEET_PROGRESS_HTTP_ADDR";
pub const STATIC_DIR_ENV: &str = "SHEET_PROGRESS_STATIC_DIR";
pub const FETCH_ATTEMPTS_ENV: &str = "SHEET_PROGRESS_FETCH_ATTEMPTS";
pub const FETCH_TIMEOUT_ENV: &str = "SHEET_PROGRESS_FETCH_TIMEOUT_SECS";

pub const DEFAULT_SPREADSHEET_ID: &str = "your_google_sheet_id";
pub const DEFAULT_RANGE: &str = "Sheet1!A:C";
pub const DEFAULT_COMPLETION_COLUMN: usize = 2;
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const STATIC_MOUNT: &str = "/static";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid socket address: {value}")]
    InvalidAddr { key: &'static str, value: String },
    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

/// Where the tracked range lives. Compiled in; only the HTTP client
/// settings come from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    pub range: String,
    /// Zero-based column holding the completion marker.
    pub completion_column: usize,
    pub api_base: String,
    pub request_timeout: Option<Duration>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            range: DEFAULT_RANGE.to_string(),
            completion_column: DEFAULT_COMPLETION_COLUMN,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    pub credentials: Option<String>,
    pub fetch_attempts: u32,
    pub sheet: SheetConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_raw = lookup(HTTP_ADDR_ENV).unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let addr = addr_raw.parse().map_err(|_| ConfigError::InvalidAddr {
            key: HTTP_ADDR_ENV,
            value: addr_raw.clone(),
        })?;

        let static_dir = lookup(STATIC_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let fetch_attempts = match parse_number(&lookup, FETCH_ATTEMPTS_ENV)? {
            None => 1,
            Some(n) => u32::try_from(n)
                .map_err(|_| ConfigError::InvalidNumber {
                    key: FETCH_ATTEMPTS_ENV,
                    value: n.to_string(),
                })?
                .max(1),
        };

        let mut sheet = SheetConfig::default();
        sheet.request_timeout = parse_number(&lookup, FETCH_TIMEOUT_ENV)?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            addr,
            static_dir,
            credentials: lookup(CREDENTIALS_ENV),
            fetch_attempts,
            sheet,
        })
    }
}

fn parse_number<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}
