//! Google Sheets reader
//!
//! Reads every value of the first worksheet of a spreadsheet identified by
//! its browser URL. Access tokens come from a [`TokenSource`]; in production
//! that is a service account doing the JWT bearer grant.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::table::Table;
use crate::types::AppError;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("not a spreadsheet URL: {0}")]
    InvalidUrl(String),

    #[error("spreadsheet not found")]
    NotFound,

    #[error("{0}")]
    Api(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("{0}")]
    Unexpected(String),
}

impl From<SheetsError> for AppError {
    fn from(err: SheetsError) -> Self {
        match err {
            SheetsError::InvalidUrl(_) | SheetsError::NotFound => {
                AppError::NotFound("Spreadsheet not found. Check URL and access.".to_string())
            }
            SheetsError::Api(message) => {
                AppError::Provider(format!("Google Sheets API error: {}", message))
            }
            other => AppError::Internal(format!("Unexpected error: {}", other)),
        }
    }
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, SheetsError>;
}

/// Fixed bearer token
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, SheetsError> {
        Ok(self.0.clone())
    }
}

/// The fields of a service-account key file this client needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, SheetsError> {
        serde_json::from_str(json)
            .map_err(|e| SheetsError::Auth(format!("invalid service account JSON: {}", e)))
    }
}

#[derive(Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct ServiceAccountTokenSource {
    client: Client,
    key: ServiceAccountKey,
}

impl ServiceAccountTokenSource {
    pub fn new(client: Client, key: ServiceAccountKey) -> Self {
        Self { client, key }
    }

    fn signed_assertion(&self, now: i64) -> Result<String, SheetsError> {
        let claims = GrantClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| SheetsError::Auth(format!("invalid private key: {}", e)))?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| SheetsError::Auth(e.to_string()))
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, SheetsError> {
        let assertion = self.signed_assertion(chrono::Utc::now().timestamp())?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| SheetsError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SheetsError::Auth(e.to_string()))?;
        Ok(token.access_token)
    }
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct GoogleErrorResponse {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    message: String,
}

/// Pull the spreadsheet id out of `https://docs.google.com/spreadsheets/d/<id>/...`
pub fn spreadsheet_id(sheet_url: &str) -> Result<String, SheetsError> {
    let invalid = || SheetsError::InvalidUrl(sheet_url.to_string());
    let (_, rest) = sheet_url.split_once("/spreadsheets/d/").ok_or_else(invalid)?;
    let id: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if id.is_empty() {
        return Err(invalid());
    }
    Ok(id)
}

pub struct SheetsClient {
    client: Client,
    tokens: Arc<dyn TokenSource>,
    api_base: String,
}

impl SheetsClient {
    pub fn new(client: Client, tokens: Arc<dyn TokenSource>, api_base: impl Into<String>) -> Self {
        Self {
            client,
            tokens,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Client authenticated with a service-account key file's JSON
    pub fn from_service_account_json(json: &str, api_base: impl Into<String>) -> Result<Self, SheetsError> {
        let client = Client::new();
        let key = ServiceAccountKey::from_json(json)?;
        let tokens = Arc::new(ServiceAccountTokenSource::new(client.clone(), key));
        Ok(Self::new(client, tokens, api_base))
    }

    fn spreadsheet_url(&self, id: &str, tail: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.api_base).map_err(|e| SheetsError::Unexpected(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Unexpected(format!("bad API base: {}", self.api_base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", id])
            .extend(tail);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        token: &str,
    ) -> Result<T, SheetsError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SheetsError::Unexpected(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SheetsError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(SheetsError::Api(format!("{} {}", status.as_u16(), message)));
        }

        response
            .json()
            .await
            .map_err(|e| SheetsError::Unexpected(e.to_string()))
    }

    /// Load every row of the first worksheet
    pub async fn fetch_table(&self, sheet_url: &str) -> Result<Table, SheetsError> {
        let id = spreadsheet_id(sheet_url)?;
        info!(spreadsheet_id = %id, "Loading Google Sheet");

        let token = self.tokens.access_token().await?;

        let mut meta_url = self.spreadsheet_url(&id, &[])?;
        meta_url
            .query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let meta: SpreadsheetMeta = self.get_json(meta_url, &token).await?;

        let title = match meta.sheets.into_iter().next() {
            Some(sheet) => sheet.properties.title,
            None => return Ok(Table::default()),
        };

        let range = format!("'{}'", title.replace('\'', "''"));
        let mut values_url = self.spreadsheet_url(&id, &["values", &range])?;
        values_url
            .query_pairs_mut()
            .append_pair("majorDimension", "ROWS");
        let values: ValueRange = self.get_json(values_url, &token).await?;

        debug!(sheet = %title, rows = values.values.len(), "Sheet values received");

        let rows = values
            .values
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match cell {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect();
        Ok(Table::from_string_rows(rows))
    }
}
