//! services/api/src/adapters/llm.rs
//!
//! This module contains the inference gateway, the concrete implementation of
//! the `InferenceService` port. It talks to an LM Studio style chat-completions
//! endpoint: one POST per chat turn, no retry, no backoff, no streaming.
//!
//! The backend is treated as an unreliable black box. Every failure mode
//! (unreachable host, non-2xx status, unparseable body) degrades to
//! `InferenceOutcome::Degraded` instead of an error, so the chat endpoint can
//! always answer.

use async_trait::async_trait;
use doc_chat_core::ports::{InferenceOutcome, InferenceService};
use serde::{Deserialize, Serialize};

/// Token budget for the health-check probe.
const PING_MAX_TOKENS: u32 = 10;
const PING_PROMPT: &str = "Hello, are you there?";

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A gateway that implements `InferenceService` against an OpenAI-compatible
/// chat-completions endpoint such as LM Studio.
#[derive(Clone)]
pub struct LmStudioGateway {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl LmStudioGateway {
    /// Creates a new gateway for the configured endpoint and model name.
    pub fn new(endpoint: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            model,
        }
    }
}

//=========================================================================================
// `InferenceService` Trait Implementation
//=========================================================================================

#[async_trait]
impl InferenceService for LmStudioGateway {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> InferenceOutcome {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        };

        let response = match self.http.post(&self.endpoint).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                return InferenceOutcome::Degraded {
                    reason: format!("request failed: {}", e),
                }
            }
        };

        if !response.status().is_success() {
            return InferenceOutcome::Degraded {
                reason: format!("inference backend returned {}", response.status()),
            };
        }

        let body: ChatCompletionResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                return InferenceOutcome::Degraded {
                    reason: format!("malformed response body: {}", e),
                }
            }
        };

        match body.choices.into_iter().next() {
            Some(choice) => InferenceOutcome::Answer(choice.message.content),
            None => InferenceOutcome::Degraded {
                reason: "response contained no choices".to_string(),
            },
        }
    }

    async fn ping(&self) -> bool {
        matches!(
            self.complete(PING_PROMPT, PING_MAX_TOKENS).await,
            InferenceOutcome::Answer(_)
        )
    }
}
