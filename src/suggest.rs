//! Optional social-media suggestions from the Gemini text API.
//!
//! Best effort: without a key, or when the call fails, `suggest` returns `None`
//! and logs why.

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::SuggestConfig;
use crate::sentiment::SentimentLabel;

/// Engagement ideas kept from a reply.
pub const MAX_ENGAGEMENT_IDEAS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestions {
    pub caption: String,
    pub hashtags: Vec<String>,
    pub engagement_ideas: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<SentimentLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Reply shape requested in the prompt; every field may be missing.
#[derive(Debug, Deserialize)]
struct RawSuggestions {
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    hashtags: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
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
    #[serde(default)]
    text: Option<String>,
}

pub struct SuggestionClient {
    config: SuggestConfig,
    http_client: Option<reqwest::Client>,
}

impl SuggestionClient {
    pub fn new(config: SuggestConfig) -> Result<Self> {
        let http_client = match config.api_key {
            Some(_) => Some(
                reqwest::Client::builder()
                    .timeout(config.timeout)
                    .build()
                    .context("Failed to create HTTP client for suggestions")?,
            ),
            None => None,
        };

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.http_client.is_some()
    }

    /// One attempt; `None` when disabled or on any failure.
    pub async fn suggest(&self, text: &str) -> Option<Suggestions> {
        let (Some(client), Some(api_key)) = (&self.http_client, &self.config.api_key) else {
            debug!("Suggestion API key not configured, skipping suggestions");
            return None;
        };
        if text.trim().is_empty() {
            return None;
        }

        match self.request(client, api_key, text).await {
            Ok(suggestions) => {
                info!(
                    "Received {} engagement ideas from {}",
                    suggestions.engagement_ideas.len(),
                    self.config.model
                );
                Some(suggestions)
            }
            Err(e) => {
                warn!("Suggestion service unavailable: {:#}", e);
                None
            }
        }
    }

    async fn request(&self, client: &reqwest::Client, api_key: &str, text: &str) -> Result<Suggestions> {
        let prompt = build_prompt(text, self.config.char_cap);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.6,
                "maxOutputTokens": 512,
                "responseMimeType": "application/json"
            }
        });

        let response = client
            .post(format!(
                "{}/models/{}:generateContent",
                self.config.api_base.trim_end_matches('/'),
                self.config.model
            ))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Gemini API request failed: {} - {}", status, error_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        let reply: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| anyhow!("Gemini API returned no candidates"))?;

        parse_suggestions(&reply)
    }
}

/// Prompt asking for strict JSON, embedding at most `char_cap` characters.
pub fn build_prompt(text: &str, char_cap: usize) -> String {
    format!(
        "Return only JSON.\n\
         Analyze the text below and produce:\n\
         - caption (string)\n\
         - hashtags (array of 7-10 strings starting with #, lowercase)\n\
         - suggestions (exactly 10 short actionable strings)\n\
         - tone (positive|neutral|negative)\n\
         - confidence (0-1 number)\n\
         \n\
         Text:\n{}\n",
        truncate_chars(text, char_cap)
    )
}

/// First `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Parse a model reply, tolerating a surrounding markdown code fence.
pub fn parse_suggestions(reply: &str) -> Result<Suggestions> {
    let raw: RawSuggestions =
        serde_json::from_str(strip_code_fence(reply)).context("Reply is not the expected JSON")?;

    let caption = raw
        .caption
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| anyhow!("Reply has no caption"))?;

    let hashtags = raw
        .hashtags
        .into_iter()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .map(|h| if h.starts_with('#') { h } else { format!("#{}", h) })
        .collect();

    let engagement_ideas = raw
        .suggestions
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_ENGAGEMENT_IDEAS)
        .collect();

    Ok(Suggestions {
        caption,
        hashtags,
        engagement_ideas,
        tone: raw.tone.as_deref().and_then(SentimentLabel::parse),
        confidence: raw.confidence.filter(|c| (0.0..=1.0).contains(c)),
    })
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_end().trim_end_matches('`').trim()
}
