//! 텍스트 생성 모듈 - OpenAI Chat Completions 클라이언트
//!
//! 고정 모델 / 고정 시스템 역할 메시지로 답변 텍스트를 생성합니다.
//! ref: https://platform.openai.com/docs/api-reference/chat

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// OpenAI API 기본 URL
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// 생성 모델 식별자 (고정)
pub const CHAT_MODEL: &str = "gpt-4o";

/// 요청 타임아웃 (생성은 임베딩보다 오래 걸림)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// CompletionProvider Trait
// ============================================================================

/// 텍스트 생성 프로바이더 트레이트
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// 시스템 메시지 + 사용자 프롬프트로 응답 텍스트 생성
    async fn complete(&self, system: &str, user: &str) -> Result<String, ServiceError>;
}

// ============================================================================
// OpenAI Chat
// ============================================================================

/// OpenAI Chat Completions 구현체
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OpenAiChat {
    /// 새 인스턴스 생성 (고정 모델)
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: OPENAI_API_BASE.to_string(),
            model: CHAT_MODEL.to_string(),
        }
    }

    /// API 기본 URL 교체 (테스트용)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Chat Completions 요청 본문
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat Completions 응답
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for OpenAiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::generation(format!("failed to send chat request: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::generation(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ServiceError::Generation(format!(
                "OpenAI API error ({status}): {body}"
            )));
        }

        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceError::generation(format!("failed to parse chat response: {e}")))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ServiceError::generation("empty completion response"))
    }
}

// ============================================================================
// Tests
// ============================================================================
