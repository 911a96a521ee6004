//! Blocking client for an OpenAI-compatible API.
//!
//! Used from worker threads, so it uses `reqwest::blocking` rather than
//! an async client. One client serves vision, transcription and text.

use std::time::Duration;

use base64::Engine;
use log::debug;
use reqwest::blocking::{multipart, Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use super::{SpeechToText, TextSummarizer, VisionAnalyzer};
use crate::config::AiConfig;
use crate::error::AiError;
use crate::secrets::resolve_secret;

const MAX_ERROR_BODY: usize = 512;
const VISION_MAX_TOKENS: u32 = 500;
const SUMMARY_MAX_TOKENS: u32 = 200;

const INSPECTOR_ROLE: &str = "You are an expert real-estate inspector.";
const GENERIC_PROMPT: &str = "Describe in detail the condition of this property item.";

/// Vision instruction for a photo, naming the checklist item when known.
pub fn prompt_for_item(item: Option<&str>) -> String {
    match item.map(str::trim).filter(|i| !i.is_empty()) {
        Some(item) => format!(
            "Describe in detail the condition of this {}.",
            item.to_lowercase()
        ),
        None => GENERIC_PROMPT.to_string(),
    }
}

/// Cuts provider error bodies down to something fit for a log line.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub struct AiClient {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    vision_model: String,
    transcription_model: String,
    text_model: String,
}

impl AiClient {
    /// Builds a client from config, resolving the API key from the
    /// configured direct value, file or environment variable.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let api_key = resolve_secret(
            config.api_key.as_deref(),
            config.api_key_file.as_deref(),
            config.api_key_env_var.as_deref(),
        )?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            vision_model: config.vision_model.clone(),
            transcription_model: config.transcription_model.clone(),
            text_model: config.text_model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    fn check_status(response: Response) -> Result<Response, AiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(AiError::Api {
            status: status.as_u16(),
            body: truncate_body(&body),
        })
    }

    fn chat(&self, body: serde_json::Value) -> Result<String, AiError> {
        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()?;
        let parsed: ChatResponse = Self::check_status(response)?
            .json()
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

impl VisionAnalyzer for AiClient {
    fn describe_image(
        &self,
        image: &[u8],
        mime_type: &str,
        item: Option<&str>,
    ) -> Result<String, AiError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let prompt = format!("{} {}", INSPECTOR_ROLE, prompt_for_item(item));
        debug!(
            "Requesting vision analysis ({} bytes, {})",
            image.len(),
            mime_type
        );

        self.chat(json!({
            "model": self.vision_model,
            "max_tokens": VISION_MAX_TOKENS,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:{};base64,{}", mime_type, encoded) }
                    }
                ]
            }]
        }))
    }
}

impl SpeechToText for AiClient {
    fn transcribe(&self, audio: &[u8], filename: &str) -> Result<String, AiError> {
        let part = multipart::Part::bytes(audio.to_vec()).file_name(filename.to_string());
        let form = multipart::Form::new()
            .text("model", self.transcription_model.clone())
            .part("file", part);

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()?;
        let parsed: TranscriptionResponse = Self::check_status(response)?
            .json()
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        Ok(parsed.text.trim().to_string())
    }
}

impl TextSummarizer for AiClient {
    fn summarize(&self, text: &str) -> Result<String, AiError> {
        self.chat(json!({
            "model": self.text_model,
            "max_tokens": SUMMARY_MAX_TOKENS,
            "messages": [
                {
                    "role": "system",
                    "content": format!(
                        "{} Summarise the inspector's dictated notes in two or three \
                         sentences, listing every damaged, dirty or missing item.",
                        INSPECTOR_ROLE
                    )
                },
                { "role": "user", "content": text }
            ]
        }))
    }
}
