use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

use crate::config::with_trailing_slash;
use crate::error::{status_text, RecommendError};

pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const MIN_FIELD_CHARS: usize = 10;

const PROMPT_TEMPLATE: &str = "You are an expert movie and TV show recommender.

You will use the user's viewing history and preferences to recommend movies and TV shows that the user is likely to enjoy.

Use the following information to generate the recommendations:

Viewing History: {viewing_history}
Preferences: {preferences}

Output the recommendations as a list.
";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(alias = "viewingHistory")]
    pub viewing_history: String,
    pub preferences: String,
}

impl RecommendationRequest {
    pub fn validate(&self) -> Result<(), RecommendError> {
        if self.viewing_history.trim().chars().count() < MIN_FIELD_CHARS {
            return Err(RecommendError::Validation {
                field: "viewing_history",
                message: "Please describe your viewing history in a bit more detail.",
            });
        }
        if self.preferences.trim().chars().count() < MIN_FIELD_CHARS {
            return Err(RecommendError::Validation {
                field: "preferences",
                message: "Please describe your preferences in a bit more detail.",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub recommendations: String,
}

pub fn render_prompt(request: &RecommendationRequest) -> String {
    PROMPT_TEMPLATE
        .replace("{viewing_history}", request.viewing_history.trim())
        .replace("{preferences}", request.preferences.trim())
}

#[async_trait]
pub trait RecommendationEngine: Send + Sync {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Recommendations, RecommendError>;
}

/// Text-in/text-out completion client for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: Url,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: Url, model: impl Into<String>, api_key: Option<String>) -> anyhow::Result<Self> {
        let user_agent = format!("flickpick/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .user_agent(user_agent)
            .build()
            .context("Failed to build Gemini HTTP client")?;
        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn endpoint(&self) -> Result<Url, RecommendError> {
        self.base_url
            .join(&format!("models/{}:generateContent", self.model))
            .map_err(|e| RecommendError::Transport(format!("invalid model endpoint: {}", e)))
    }
}

#[async_trait]
impl RecommendationEngine for GeminiClient {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Recommendations, RecommendError> {
        request.validate()?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RecommendError::Configuration)?;
        let url = self.endpoint()?;

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": render_prompt(request) }]
            }]
        });

        let res = self
            .client
            .post(url.clone())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RecommendError::Transport(e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| RecommendError::Transport(format!("reading body failed: {}", e)))?;
        if !status.is_success() {
            error!("Recommendation request to {} failed: {} -> {}", url, status, text);
            return Err(RecommendError::Upstream {
                status: status.as_u16(),
                status_text: status_text(status),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| RecommendError::Transport(format!("JSON parse failed: {}", e)))?;
        let recommendations = parsed.first_text().ok_or(RecommendError::EmptyResponse)?;
        info!("Generated {} characters of recommendations", recommendations.len());
        Ok(Recommendations { recommendations })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}
