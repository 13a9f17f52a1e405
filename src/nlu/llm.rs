//! LLM-backed NLU provider.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint. Structured
//! calls (classification, extraction) request JSON output and parse the
//! model's reply into the wire shapes below; freeform completion passes
//! the text through.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::NluConfig;
use crate::error::{NluError, Result};
use crate::session::ChatTurn;

use super::provider::NluProvider;
use super::types::{ExtractedFields, Intent, IntentClassification};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Model reply for intent classification.
#[derive(Debug, Deserialize)]
struct IntentReply {
    intent: String,
    #[serde(default = "default_confidence")]
    confidence: f32,
}

fn default_confidence() -> f32 {
    0.5
}

/// Model reply for field extraction. All fields arrive as loosely
/// formatted strings and are validated here.
#[derive(Debug, Default, Deserialize)]
struct FieldsReply {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    attendees: Option<Vec<String>>,
    #[serde(default)]
    description: Option<String>,
}

// ============================================================================
// LLM NLU Provider
// ============================================================================

/// NLU provider backed by a chat-completions API.
pub struct LlmNlu {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl LlmNlu {
    /// Create a provider from configuration.
    pub fn new(config: &NluConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NluError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.resolve_api_key(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Send a completion request and return the raw reply text.
    async fn complete(&self, system: &str, user: &str, json_mode: bool) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": 0.1,
        });
        if json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        let mut request = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NluError::Timeout(self.timeout_secs)
            } else {
                NluError::Request(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(NluError::Api(format!("completion returned {}", response.status())).into());
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| NluError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| NluError::InvalidResponse("empty completion".to_string()).into())
    }
}

#[async_trait]
impl NluProvider for LlmNlu {
    async fn classify_intent(
        &self,
        text: &str,
        _history: &[ChatTurn],
    ) -> Result<IntentClassification> {
        let user = format!(
            "Analyze this user message and extract the intent: \"{text}\"\n\n\
             Possible intents:\n\
             - book_appointment: User wants to schedule a new appointment\n\
             - check_availability: User wants to check when they're available\n\
             - modify_appointment: User wants to change an existing appointment\n\
             - cancel_appointment: User wants to cancel an appointment\n\
             - general_query: General questions or conversation\n\n\
             Respond with JSON: {{\"intent\": \"intent_name\", \"confidence\": 0.95}}"
        );

        let reply = self
            .complete("You are an intent classifier for a calendar assistant.", &user, true)
            .await?;

        let parsed: IntentReply = serde_json::from_str(&reply)
            .map_err(|e| NluError::InvalidResponse(format!("intent reply: {e}")))?;

        let intent = Intent::parse(&parsed.intent);
        debug!("Classified intent: {} ({:.2})", intent, parsed.confidence);
        Ok(IntentClassification::new(intent, parsed.confidence))
    }

    async fn extract_fields(&self, text: &str, now: DateTime<Utc>) -> Result<ExtractedFields> {
        let user = format!(
            "Extract appointment booking information from this user message: \"{text}\"\n\n\
             Current date and time: {}\n\n\
             Please extract:\n\
             - title: What is the appointment for? (meeting title/purpose)\n\
             - date: What date? Convert relative dates like \"tomorrow\", \"next week\" to YYYY-MM-DD format\n\
             - start_time: What time should it start? (HH:MM format in 24-hour)\n\
             - duration: How long should it be? (in minutes, default 60)\n\
             - attendees: Who else should be invited? (email addresses)\n\
             - description: Any additional details?\n\n\
             Important rules:\n\
             - If no specific time is given but \"morning\" is mentioned, use 09:00\n\
             - If no specific time is given but \"afternoon\" is mentioned, use 14:00\n\
             - If no specific time is given but \"evening\" is mentioned, use 18:00\n\
             - Default duration is 60 minutes if not specified\n\n\
             Respond with JSON. Use null for missing information.",
            now.format("%Y-%m-%d %H:%M:%S")
        );

        let reply = self
            .complete(
                "You extract structured booking fields for a calendar assistant.",
                &user,
                true,
            )
            .await?;

        let parsed: FieldsReply = serde_json::from_str(&reply)
            .map_err(|e| NluError::InvalidResponse(format!("fields reply: {e}")))?;

        Ok(ExtractedFields {
            title: parsed.title.filter(|t| !t.trim().is_empty()),
            date: parsed
                .date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            start_time: parsed
                .start_time
                .and_then(|t| NaiveTime::parse_from_str(&t, "%H:%M").ok()),
            duration_minutes: parsed.duration,
            attendees: parsed.attendees.unwrap_or_default(),
            description: parsed.description.filter(|d| !d.trim().is_empty()),
        })
    }

    async fn complete_freeform(&self, text: &str, context: &str) -> Result<String> {
        let user = format!(
            "User message: \"{text}\"\n\
             Context: {context}\n\n\
             Provide a helpful response. If the user is asking about booking \
             appointments, guide them on what information you need."
        );

        self.complete("You are a friendly calendar booking assistant.", &user, false)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_reply_lenient_parsing() {
        let reply: FieldsReply = serde_json::from_str(
            r#"{"title": "Dentist", "date": "2025-06-10", "start_time": "10:00",
                "duration": 30, "attendees": null, "description": null}"#,
        )
        .unwrap();
        assert_eq!(reply.title.as_deref(), Some("Dentist"));
        assert_eq!(reply.date.as_deref(), Some("2025-06-10"));
        assert_eq!(reply.duration, Some(30));
    }

    #[test]
    fn test_intent_reply_missing_confidence_defaults() {
        let reply: IntentReply = serde_json::from_str(r#"{"intent": "book_appointment"}"#).unwrap();
        assert_eq!(Intent::parse(&reply.intent), Intent::BookAppointment);
        assert!((reply.confidence - 0.5).abs() < f32::EPSILON);
    }
}
