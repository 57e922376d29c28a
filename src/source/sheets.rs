use super::{SourceError, SourceResult, TableSource};
use crate::{SheetConfig, Table};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a Google service-account key file that the token exchange
/// needs. Other fields in the file are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountCredentials {
    pub fn from_json(raw: &str) -> SourceResult<Self> {
        serde_json::from_str(raw).map_err(|err| {
            SourceError::configuration(format!("invalid service account credentials: {err}"))
        })
    }

    fn encoding_key(&self) -> SourceResult<EncodingKey> {
        EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(|err| {
            SourceError::configuration(format!("invalid service account private key: {err}"))
        })
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Reads a range from the Google Sheets v4 API using service-account
/// credentials.
pub struct GoogleSheetsSource {
    client: Client,
    config: SheetConfig,
    credentials: Option<String>,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsSource {
    /// `credentials` is the raw service-account JSON. It is parsed on every
    /// fetch so that a missing or broken value is reported per request.
    pub fn new(config: SheetConfig, credentials: Option<String>) -> SourceResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|err| {
            SourceError::configuration(format!("cannot build http client: {err}"))
        })?;
        Ok(Self {
            client,
            config,
            credentials,
            token: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    fn credentials(&self) -> SourceResult<ServiceAccountCredentials> {
        let raw = self
            .credentials
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .ok_or_else(|| SourceError::configuration("missing service account credentials"))?;
        ServiceAccountCredentials::from_json(raw)
    }

    fn values_url(&self) -> SourceResult<Url> {
        let mut url = Url::parse(&self.config.api_base).map_err(|err| {
            SourceError::configuration(format!("invalid api base '{}': {err}", self.config.api_base))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                SourceError::configuration(format!(
                    "api base '{}' cannot carry a path",
                    self.config.api_base
                ))
            })?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.config.spreadsheet_id.as_str(),
                "values",
                self.config.range.as_str(),
            ]);
        Ok(url)
    }

    fn cached_token(&self, now: DateTime<Utc>) -> Option<String> {
        let guard = self.token.lock();
        guard
            .as_ref()
            .filter(|cached| cached.expires_at > now)
            .map(|cached| cached.access_token.clone())
    }

    async fn access_token(
        &self,
        credentials: &ServiceAccountCredentials,
        key: &EncodingKey,
    ) -> SourceResult<String> {
        let now = Utc::now();
        if let Some(token) = self.cached_token(now) {
            return Ok(token);
        }

        let claims = AssertionClaims {
            iss: &credentials.client_email,
            scope: SHEETS_READONLY_SCOPE,
            aud: &credentials.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, key)
            .map_err(|err| SourceError::configuration(format!("cannot sign assertion: {err}")))?;

        debug!(token_uri = %credentials.token_uri, "requesting access token");
        let response = self
            .client
            .post(&credentials.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::upstream(format!(
                "token exchange failed (status {status}): {body}"
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| SourceError::upstream(format!("malformed token response: {err}")))?;

        // A token lives at most as long as the assertion that bought it.
        let lifetime = token
            .expires_in
            .unwrap_or(ASSERTION_LIFETIME_SECS)
            .clamp(0, ASSERTION_LIFETIME_SECS);
        let expires_at = now + Duration::seconds(lifetime - TOKEN_REFRESH_MARGIN_SECS);
        *self.token.lock() = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl TableSource for GoogleSheetsSource {
    async fn fetch_table(&self) -> SourceResult<Table> {
        let credentials = self.credentials()?;
        let key = credentials.encoding_key()?;
        let url = self.values_url()?;

        let token = self.access_token(&credentials, &key).await?;
        debug!(spreadsheet = %self.config.spreadsheet_id, range = %self.config.range, "fetching values");
        let response = self.client.get(url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::upstream(format!(
                "values request failed (status {status}): {body}"
            )));
        }
        let body = response.text().await?;
        parse_value_range(&body)
    }
}

/// Parses a `ValueRange` body. Non-string cells are kept as their JSON text.
pub fn parse_value_range(body: &str) -> SourceResult<Table> {
    let range: ValueRange = serde_json::from_str(body)
        .map_err(|err| SourceError::upstream(format!("malformed values response: {err}")))?;
    let rows = range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect();
    Ok(Table::new(rows))
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_field_is_an_empty_table() {
        let table = parse_value_range(r#"{"range":"Sheet1!A1:C1","majorDimension":"ROWS"}"#)
            .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn non_string_cells_are_stringified() {
        let table = parse_value_range(r#"{"values":[["Task","Done"],["A",true],["B",3]]}"#)
            .unwrap();
        assert_eq!(table.rows()[1], vec!["A".to_string(), "true".to_string()]);
        assert_eq!(table.rows()[2][1], "3");
    }

    #[test]
    fn unexpected_shape_is_upstream_error() {
        let err = parse_value_range(r#"{"values":"nope"}"#).unwrap_err();
        assert!(matches!(err, SourceError::Upstream(_)));
    }

    #[test]
    fn values_url_keeps_range_in_one_segment() {
        let config = SheetConfig {
            api_base: "http://127.0.0.1:9/".to_string(),
            spreadsheet_id: "sheet-id".to_string(),
            range: "Sheet1!A:C".to_string(),
            ..SheetConfig::default()
        };
        let source = GoogleSheetsSource::new(config, None).unwrap();
        let url = source.values_url().unwrap();
        assert_eq!(
            url.path(),
            "/v4/spreadsheets/sheet-id/values/Sheet1!A:C"
        );
    }
}
