// Copyright 2025 Rageval Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Judge oracle abstraction and the OpenAI-compatible HTTP client
//!
//! The judge never talks HTTP directly; it goes through [`JudgeOracle`]
//! so tests can substitute scripted oracles and the cache can wrap any
//! backend transparently.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Default judge model when `JUDGE_MODEL` is unset.
pub const DEFAULT_JUDGE_MODEL: &str = "Qwen/Qwen3-14B";

/// Near-zero temperature keeps verdicts reproducible across runs.
const JUDGE_TEMPERATURE: f64 = 0.001;

const SYSTEM_PROMPT: &str =
    "You are an expert evaluator. Answer strictly in the requested format.";

/// Token accounting reported by the judge endpoint, zero when absent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// One completed oracle call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleResponse {
    pub content: String,
    pub model: String,
    #[serde(default)]
    pub usage: TokenUsage,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Request(String),

    #[error("oracle returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("oracle rate limited")]
    RateLimited,

    #[error("oracle response missing choices")]
    EmptyResponse,

    #[error("oracle configuration incomplete: {0}")]
    Config(String),
}

/// A judgment backend the generation judge can call.
#[async_trait]
pub trait JudgeOracle: Send + Sync {
    /// Submit one prompt and return the raw completion text.
    async fn invoke(&self, prompt: &str) -> Result<OracleResponse, OracleError>;

    /// Model identifier, for logging and cache diagnostics.
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible chat-completions client.
///
/// Works against any endpoint speaking the `/chat/completions` wire
/// shape, which covers the usual self-hosted judge deployments.
pub struct OpenAiJudge {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiJudge {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Build from `OPENAI_BASE_URL`, `OPENAI_API_KEY`, and `JUDGE_MODEL`.
    pub fn from_env() -> Result<Self, OracleError> {
        let api_base = std::env::var("OPENAI_BASE_URL")
            .map_err(|_| OracleError::Config("OPENAI_BASE_URL is not set".into()))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OracleError::Config("OPENAI_API_KEY is not set".into()))?;
        let model =
            std::env::var("JUDGE_MODEL").unwrap_or_else(|_| DEFAULT_JUDGE_MODEL.to_string());
        Ok(Self::new(api_base, api_key, model))
    }
}

#[async_trait]
impl JudgeOracle for OpenAiJudge {
    async fn invoke(&self, prompt: &str) -> Result<OracleResponse, OracleError> {
        let url = format!("{}/chat/completions", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "temperature": JUDGE_TEMPERATURE,
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": prompt},
                ],
            }))
            .send()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OracleError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api { status, body });
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(OracleError::EmptyResponse)?
            .to_string();
        let usage = serde_json::from_value(payload["usage"].clone()).unwrap_or_default();

        Ok(OracleResponse {
            content,
            model: self.model.clone(),
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
