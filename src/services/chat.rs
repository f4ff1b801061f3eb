// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat provider client (Gemini generateContent API).
//!
//! The provider is stateless from our side: each call replays the stored
//! conversation history as ordered context, with the fixed healthcare
//! system prompt as the first turn. There is no in-process session state.

use crate::error::AppError;
use crate::models::ChatMessage;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str =
    "You are a friendly and professional healthcare assistant specialized in both physical \
     and mental health. Always keep your responses aligned with medical support, wellness \
     advice, and mental health awareness. Ask follow-up questions like a compassionate \
     doctor, such as symptoms, duration, pain level, emotional impact, and previous \
     treatments. Avoid discussing any topic outside of healthcare and well-being. Always \
     be empathetic and supportive.";

/// Chat provider client.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    /// Offline mode for tests: canned responses, no network.
    mock: bool,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

impl Content {
    fn user(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }

    fn model(text: &str) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

impl ChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key,
            model,
            mock: false,
        }
    }

    /// Create a mock client for testing (offline mode).
    pub fn new_mock() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "http://mock.local".to_string(),
            api_key: "mock".to_string(),
            model: "mock".to_string(),
            mock: true,
        }
    }

    /// Produce a reply to `message` given the prior turns for this
    /// conversation, oldest first.
    pub async fn respond(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String, AppError> {
        if self.mock {
            return Ok(format!("Mock response to: {}", message));
        }

        let mut contents = Vec::with_capacity(history.len() * 2 + 2);
        contents.push(Content::user(SYSTEM_PROMPT));
        for turn in history {
            contents.push(Content::user(&turn.user_message));
            contents.push(Content::model(&turn.bot_response));
        }
        contents.push(Content::user(message));

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&GenerateRequest { contents })
            .send()
            .await
            .map_err(|e| AppError::ChatProvider(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Chat provider returned error");
            return Err(AppError::ChatProvider(format!(
                "Provider returned status {}",
                status
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::ChatProvider(format!("Invalid response body: {}", e)))?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| AppError::ChatProvider("Empty response from model".to_string()))
    }
}
