//! GeminiOracle - direct REST implementation of the code oracle.
//!
//! Calls the Gemini `generateContent` endpoint without any CLI dependency.
//! The conversational context blob the core stores per chat is owned by this
//! module: a JSON array of `{role, parts: [{text}]}` turns, replayed as the
//! request `contents` and re-serialized with the new turn appended.

use crate::prompt;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tabula_core::{CodeOracle, OracleReply, OracleRequest, Result, TabulaError};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Part {
    text: String,
}

impl Content {
    fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }

    fn joined_text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Deserializes the opaque context blob back into history turns.
/// Anything that is not a turn array (fresh chat, cleared chat, foreign
/// format) starts the history over.
fn history_from_context(context: &serde_json::Value) -> Vec<Content> {
    match context {
        serde_json::Value::Array(_) => {
            serde_json::from_value(context.clone()).unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Oracle implementation backed by the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiOracle {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Reads the API key from the given environment variable.
    pub fn from_env(api_key_env: &str) -> Result<Self> {
        let api_key = std::env::var(api_key_env)
            .map_err(|_| TabulaError::Oracle(format!("{} is not set", api_key_env)))?;
        Ok(Self::new(api_key, DEFAULT_MODEL))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn send(&self, body: &GenerateContentRequest) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            BASE_URL, self.model, self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TabulaError::Oracle(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TabulaError::Oracle(format!("Gemini response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(TabulaError::Oracle(format!(
                "Gemini returned {}: {}",
                status, text
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| TabulaError::Oracle(format!("Gemini response malformed: {}", e)))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.joined_text())
            .ok_or_else(|| TabulaError::Oracle("Gemini returned no candidates".to_string()))
    }
}

#[async_trait]
impl CodeOracle for GeminiOracle {
    async fn generate(&self, request: OracleRequest) -> Result<OracleReply> {
        let system_instruction = prompt::render_system_instruction(&request.dataset_context)?;

        let mut contents = history_from_context(&request.prior_context);
        contents.push(Content::text("user", &request.query));

        let body = GenerateContentRequest {
            system_instruction: Content::text("user", system_instruction),
            contents: contents.clone(),
        };

        tracing::debug!(model = %self.model, turns = contents.len(), "requesting code generation");
        let reply_text = self.send(&body).await?;
        let generated = prompt::parse_generated(&reply_text)?;

        contents.push(Content::text("model", &reply_text));
        let updated_context = serde_json::to_value(&contents)?;

        Ok(OracleReply {
            generated,
            updated_context,
        })
    }
}
