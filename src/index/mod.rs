//! 벡터 인덱스 모듈 - 원격 관리형 벡터 데이터베이스
//!
//! 외부에서 관리되는 서버리스 벡터 인덱스에 청크 임베딩을 저장하고
//! 코사인 유사도 기반 최근접 검색을 수행합니다. 저장 엔진 자체는
//! 외부 서비스가 소유하며, 이 모듈은 요청/응답 계약만 다룹니다.

pub mod pinecone;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub use pinecone::{IndexConfig, PineconeIndex};

// ============================================================================
// Types
// ============================================================================

/// 벡터 레코드 (저장용)
///
/// 동일 식별자로 재업서트하면 중복 생성 없이 덮어씁니다.
#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    /// 결정적 식별자 (`{source}-{doc_index}-{chunk_index}`)
    pub id: String,
    /// 임베딩 벡터
    pub values: Vec<f32>,
    /// 청크 메타데이터
    pub metadata: RecordMetadata,
}

/// 레코드 메타데이터
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordMetadata {
    /// 소스 태그 (portfolio, resume, blog, blog_summary 등)
    pub source: String,
    /// 소스 내 청크 인덱스 (0부터 시작)
    pub chunk: u32,
    /// 청크 텍스트
    pub text: String,
}

/// 검색 결과 청크
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// 레코드 식별자
    pub id: String,
    /// 유사도 스코어
    pub score: f32,
    /// 소스 태그
    pub source: String,
    /// 청크 텍스트
    pub text: String,
}

/// 레코드 식별자 생성
///
/// 소스 태그, 문서 인덱스, 청크 인덱스로부터 결정적으로 만들어집니다.
pub fn record_id(source: &str, doc_index: usize, chunk_index: usize) -> String {
    format!("{}-{}-{}", source, doc_index, chunk_index)
}

// ============================================================================
// VectorIndex Trait
// ============================================================================

/// 벡터 인덱스 트레이트 (async)
///
/// 벡터 저장소의 공통 인터페이스입니다.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// 레코드 배치 업서트 (동일 id는 덮어쓰기)
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize, ServiceError>;

    /// 최근접 검색
    ///
    /// 저장된 레코드가 `top_k`보다 적으면 더 짧은 (비어 있을 수 있는)
    /// 결과를 반환하며, 에러가 아닙니다.
    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, ServiceError>;
}

// ============================================================================
// Tests
// ============================================================================
