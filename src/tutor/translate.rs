//! MyMemory translation API client.

use std::fmt;
use std::future::Future;

use serde::Deserialize;
use tracing::{debug, info};

const MYMEMORY_API_URL: &str = "https://api.mymemory.translated.net/get";

/// Error pages can be arbitrarily long; only this much of the body is kept.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Phrases are always translated from English.
const SOURCE_LANGUAGE: &str = "en";

#[derive(Debug)]
pub enum TranslateError {
    Http(reqwest::Error),
    Status { status: reqwest::StatusCode, body: String },
    Parse(serde_json::Error),
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Status { status, body } => write!(f, "API error {}: {}", status, body),
            Self::Parse(e) => write!(f, "unexpected response shape: {}", e),
        }
    }
}

impl std::error::Error for TranslateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Status { .. } => None,
        }
    }
}

/// Something that can translate an English phrase.
pub trait Translator: Send + Sync + 'static {
    fn translate(
        &self,
        phrase: &str,
        target_language: &str,
    ) -> impl Future<Output = Result<String, TranslateError>> + Send;
}

#[derive(Deserialize, Debug)]
struct ApiResponse {
    #[serde(rename = "responseData")]
    response_data: ResponseData,
}

#[derive(Deserialize, Debug)]
struct ResponseData {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

pub struct TranslationClient {
    base_url: String,
    client: reqwest::Client,
}

impl TranslationClient {
    pub fn new() -> Self {
        Self::with_base_url(MYMEMORY_API_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn request_url(&self, phrase: &str, target_language: &str) -> String {
        format!(
            "{}?q={}&langpair={}|{}",
            self.base_url,
            urlencoding::encode(phrase),
            SOURCE_LANGUAGE,
            urlencoding::encode(target_language)
        )
    }
}

impl Translator for TranslationClient {
    async fn translate(&self, phrase: &str, target_language: &str) -> Result<String, TranslateError> {
        info!("🌐 Translating {:?} to {}", phrase, target_language);

        let response = self
            .client
            .get(self.request_url(phrase, target_language))
            .send()
            .await
            .map_err(TranslateError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(TranslateError::Http)?;

        debug!("Translation response status: {status}");

        if !status.is_success() {
            return Err(TranslateError::Status { status, body: truncate_body(&body) });
        }

        parse_response(&body)
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", truncated)
    } else {
        body.to_string()
    }
}

fn parse_response(body: &str) -> Result<String, TranslateError> {
    let parsed: ApiResponse = serde_json::from_str(body).map_err(TranslateError::Parse)?;
    Ok(parsed.response_data.translated_text)
}
