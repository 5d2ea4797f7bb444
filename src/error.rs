//! 에러 타입 정의
//!
//! 설정 / 백엔드 호출 / 문서 추출 실패를 구분하는 타입 기반 에러 모델입니다.
//! 서빙 경로의 에러는 요청당 단일 경계(`ApiError`)에서 HTTP 응답으로 변환됩니다.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// 레이트 리밋 초과 시 고정 응답 문구
pub const RATE_LIMIT_DETAIL: &str = "Rate limit exceeded. Please try again later.";

// ============================================================================
// ConfigError
// ============================================================================

/// 환경 설정 에러
///
/// 기동 시점에 감지되며 치명적입니다. 프로세스는 트래픽을 받지 않고 종료합니다.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} environment variable is not set")]
    MissingVar { name: &'static str },

    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },

    #[error("invalid chunk size: max_words must be greater than 0")]
    InvalidChunkSize,
}

// ============================================================================
// ServiceError
// ============================================================================

/// 외부 백엔드 호출 실패
///
/// 임베딩 / 벡터 인덱스 / 생성 서비스 호출 실패를 나타냅니다.
/// 호출자에게는 세부 원인 구분 없이 메시지만 전파됩니다. 재시도하지 않습니다.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("embedding service error: {0}")]
    Embedding(String),

    #[error("vector index error: {0}")]
    Index(String),

    #[error("generation service error: {0}")]
    Generation(String),
}

impl ServiceError {
    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        ServiceError::Embedding(err.to_string())
    }

    pub fn index<E: std::fmt::Display>(err: E) -> Self {
        ServiceError::Index(err.to_string())
    }

    pub fn generation<E: std::fmt::Display>(err: E) -> Self {
        ServiceError::Generation(err.to_string())
    }
}

// ============================================================================
// ExtractionError
// ============================================================================

/// 문서 추출 에러 (인제스트 전용)
///
/// 오프라인 배치에서만 발생합니다. 소스 단위로 기록하고 계속 진행한 뒤
/// 배치 종료 시 실패 여부를 보고합니다.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read source {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to extract text from {path}: {reason}")]
    Extract { path: String, reason: String },

    #[error("failed to fetch feed {url}: {reason}")]
    Fetch { url: String, reason: String },
}

// ============================================================================
// ApiError (HTTP 경계)
// ============================================================================

/// `/ask` 요청 경계 에러
///
/// 레이트 리밋은 429, 그 외 모든 백엔드 실패는 단일 500으로 매핑됩니다.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("{0}")]
    Service(#[from] ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::RateLimited => {
                (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_DETAIL.to_string())
            }
            ApiError::Service(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================
