//! 임베딩 모듈 - OpenAI API를 통한 텍스트 벡터화
//!
//! 텍스트를 고정 차원 벡터로 변환하는 OpenAI 임베딩 프로바이더입니다.
//! 시맨틱 검색을 위한 핵심 모듈입니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OpenAiEmbedding::new(api_key);
//! let embedding = embedder.embed("Hello, world!").await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError>;

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;
}

// ============================================================================
// OpenAI Embedding
// ============================================================================

/// OpenAI API 기본 URL
/// ref: https://platform.openai.com/docs/api-reference/embeddings
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// 임베딩 모델 식별자 (고정)
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// 기본 임베딩 차원
pub const DEFAULT_DIMENSION: usize = 1536;

/// 요청 타임아웃
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 429 에러 시 최대 재시도 횟수
const MAX_RETRIES: u32 = 3;
/// 재시도 시 초기 백오프 (ms)
const INITIAL_BACKOFF_MS: u64 = 500;

/// OpenAI 임베딩 구현체
#[derive(Debug, Clone)]
pub struct OpenAiEmbedding {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    dimension: usize,
}

impl OpenAiEmbedding {
    /// 새 OpenAI 임베딩 인스턴스 생성 (기본 차원)
    pub fn new(api_key: String) -> Self {
        Self::with_dimension(api_key, DEFAULT_DIMENSION)
    }

    /// 차원을 지정하여 생성
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API 키
    /// * `dimension` - 임베딩 차원 (인덱스 차원과 일치해야 함)
    pub fn with_dimension(api_key: String, dimension: usize) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: OPENAI_API_BASE.to_string(),
            dimension,
        }
    }

    /// API 기본 URL 교체 (테스트용)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// 임베딩 API 요청 본문
#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
    dimensions: usize,
}

/// 임베딩 API 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// OpenAI API 에러 응답
#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(default, rename = "type")]
    error_type: String,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        // 빈 텍스트 처리
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }

        let request = EmbedRequest {
            model: EMBEDDING_MODEL.to_string(),
            input: vec![text.to_string()],
            dimensions: self.dimension,
        };

        let url = format!("{}/embeddings", self.base_url);
        let mut last_error: Option<ServiceError> = None;

        // 재시도 루프 (429 에러 시 지수 백오프)
        for attempt in 0..=MAX_RETRIES {
            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .timeout(REQUEST_TIMEOUT)
                .json(&request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(ServiceError::embedding(format!(
                        "failed to send embedding request: {e}"
                    )));
                    if attempt < MAX_RETRIES {
                        let backoff =
                            Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            "Embedding request failed, retrying in {:?} (attempt {}/{})",
                            backoff,
                            attempt + 1,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ServiceError::embedding(format!("failed to read response: {e}")))?;

            // 성공
            if status.is_success() {
                let embed_response: EmbedResponse = serde_json::from_str(&body).map_err(|e| {
                    ServiceError::embedding(format!("failed to parse embedding response: {e}"))
                })?;

                return embed_response
                    .data
                    .into_iter()
                    .next()
                    .map(|d| d.embedding)
                    .ok_or_else(|| ServiceError::embedding("empty embedding response"));
            }

            // 429 Rate Limit - 재시도
            if status.as_u16() == 429 {
                let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt));
                tracing::warn!(
                    "Embedding rate limit hit (429), backing off {:?} (attempt {}/{})",
                    backoff,
                    attempt + 1,
                    MAX_RETRIES
                );
                last_error = Some(ServiceError::embedding("rate limit exceeded (429)"));

                if attempt < MAX_RETRIES {
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            } else {
                // 다른 에러 - 즉시 실패
                if let Ok(parsed) = serde_json::from_str::<OpenAiError>(&body) {
                    return Err(ServiceError::Embedding(format!(
                        "OpenAI API error ({}): {}",
                        parsed.error.error_type, parsed.error.message
                    )));
                }
                return Err(ServiceError::Embedding(format!(
                    "OpenAI API error ({status}): {body}"
                )));
            }
        }

        Err(last_error
            .unwrap_or_else(|| ServiceError::embedding("embedding failed after retries")))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_dimension_accessor() {
        let embedder = OpenAiEmbedding::with_dimension("fake-key".to_string(), 256);
        assert_eq!(embedder.dimension(), 256);

        let embedder = OpenAiEmbedding::new("fake-key".to_string());
        assert_eq!(embedder.dimension(), DEFAULT_DIMENSION);
    }

    #[tokio::test]
    async fn test_embed_empty_text_returns_zero_vector() {
        let embedder = OpenAiEmbedding::with_dimension("fake-key".to_string(), 8);
        let embedding = embedder.embed("   ").await.unwrap();
        assert_eq!(embedding, vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_embed_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(json!({
                "model": EMBEDDING_MODEL,
                "input": ["hello world"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "embedding": [0.1, 0.2, 0.3] }]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedding::with_dimension("fake-key".to_string(), 3)
            .with_base_url(server.uri());

        let embedding = embedder.embed("hello world").await.unwrap();
        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_embed_api_error_propagates_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let embedder =
            OpenAiEmbedding::new("bad-key".to_string()).with_base_url(server.uri());

        let err = embedder.embed("hello").await.unwrap_err();
        assert!(err.to_string().contains("Incorrect API key"));
    }

    #[tokio::test]
    async fn test_embed_retries_on_rate_limit() {
        let server = MockServer::start().await;

        // 첫 호출은 429, 이후 성공
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Rate limit reached", "type": "rate_limit_error" }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "embedding": [1.0, 0.0] }]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedding::with_dimension("fake-key".to_string(), 2)
            .with_base_url(server.uri());

        let embedding = embedder.embed("retry me").await.unwrap();
        assert_eq!(embedding, vec![1.0, 0.0]);
    }
}
