use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;

use crate::types::LLMProvider;

pub const DEFAULT_SERPAPI_BASE_URL: &str = "https://serpapi.com";
pub const DEFAULT_SEARCH_LOCATION: &str = "Austin, Texas, United States";
pub const DEFAULT_GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub llm: LLMConfig,
    pub sheets: SheetsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub serpapi_key: String,
    pub base_url: String,
    pub location: String,
    pub hl: String,
    pub gl: String,
    pub google_domain: String,
    /// Outbound quota for the search provider
    pub requests_per_second: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub api_key: String,
    pub api_base: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    /// Raw service-account JSON; the Sheets endpoint is disabled without it
    pub service_account_json: Option<String>,
    pub api_base: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let serpapi_key = lookup("SERPAPI_KEY").unwrap_or_default();
        if serpapi_key.trim().is_empty() {
            bail!("SERPAPI_KEY environment variable is not set");
        }

        let provider_name = var("LLM_PROVIDER", "groq");
        let provider = LLMProvider::parse(&provider_name)
            .with_context(|| format!("Unsupported LLM_PROVIDER: {}", provider_name))?;
        let (key_var, default_base) = match provider {
            LLMProvider::Groq => ("GROQ_API_KEY", DEFAULT_GROQ_API_BASE),
            LLMProvider::OpenAI => ("OPENAI_API_KEY", DEFAULT_OPENAI_API_BASE),
        };

        let requests_per_second: u32 = var("SEARCH_REQUESTS_PER_SECOND", "1")
            .parse()
            .context("SEARCH_REQUESTS_PER_SECOND must be a positive integer")?;
        if requests_per_second == 0 {
            bail!("SEARCH_REQUESTS_PER_SECOND must be a positive integer");
        }

        Ok(Self {
            server: ServerConfig {
                port: var("PORT", "5000")
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: var("ALLOWED_ORIGINS", "*")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                max_upload_bytes: var("MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string())
                    .parse()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
            },
            search: SearchConfig {
                serpapi_key,
                base_url: var("SERPAPI_BASE_URL", DEFAULT_SERPAPI_BASE_URL),
                location: var("SEARCH_LOCATION", DEFAULT_SEARCH_LOCATION),
                hl: var("SEARCH_HL", "en"),
                gl: var("SEARCH_GL", "us"),
                google_domain: var("SEARCH_GOOGLE_DOMAIN", "google.com"),
                requests_per_second,
            },
            llm: LLMConfig {
                provider,
                api_key: lookup(key_var).unwrap_or_default(),
                api_base: var("LLM_API_BASE", default_base),
                model: var("LLM_MODEL", DEFAULT_LLM_MODEL),
            },
            sheets: SheetsConfig {
                service_account_json: lookup("GOOGLE_SHEETS_API_KEY")
                    .filter(|s| !s.trim().is_empty()),
                api_base: var("GOOGLE_SHEETS_API_BASE", DEFAULT_SHEETS_API_BASE),
            },
        })
    }
}

impl SearchConfig {
    pub fn new(serpapi_key: impl Into<String>) -> Self {
        Self {
            serpapi_key: serpapi_key.into(),
            base_url: DEFAULT_SERPAPI_BASE_URL.to_string(),
            location: DEFAULT_SEARCH_LOCATION.to_string(),
            hl: "en".to_string(),
            gl: "us".to_string(),
            google_domain: "google.com".to_string(),
            requests_per_second: 1,
        }
    }
}

impl LLMConfig {
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self {
            provider: LLMProvider::Groq,
            api_key: api_key.into(),
            api_base: DEFAULT_GROQ_API_BASE.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
        }
    }
}
