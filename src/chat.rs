use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub prompt: String,
    pub context: String,
}

#[derive(Deserialize)]
struct ChatReply {
    response: String,
}

/// Client for the assistant backend's single `/chat` route.
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AppError> {
        let http = Client::builder()
            .build()
            .context("Failed to initialise HTTP client")
            .map_err(AppError::from)?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn send(&self, request: &ChatRequest) -> Result<String, AppError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .with_context(|| format!("Failed sending chat request to {}", self.endpoint))
            .map_err(AppError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AppError::Chat(if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {body}")
            }));
        }

        let reply: ChatReply = response
            .json()
            .context("Failed decoding chat response")
            .map_err(AppError::from)?;
        Ok(reply.response)
    }
}
