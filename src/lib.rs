//! persona-rag - 개인 문서 RAG 질의응답 서비스
//!
//! 개인 문서(HTML / PDF / 블로그 RSS)를 외부 벡터 인덱스에 인제스트하고,
//! 질문을 임베딩 → 검색 → 생성 순서로 답하는 HTTP 서비스입니다.
//! 임베딩 / 벡터 검색 / 텍스트 생성은 모두 외부 API에 위임합니다.

pub mod answer;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod feed;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod server;

// Re-exports
pub use answer::AnswerService;
pub use chunker::{ChunkConfig, WordChunker};
pub use config::AppConfig;
pub use embedding::{EmbeddingProvider, OpenAiEmbedding};
pub use error::{ApiError, ConfigError, ExtractionError, ServiceError};
pub use extract::{DocumentExtractor, SourceKind};
pub use feed::{FeedDocument, FeedReader};
pub use generation::{CompletionProvider, OpenAiChat};
pub use index::{
    record_id, IndexConfig, PineconeIndex, RecordMetadata, RetrievedChunk, VectorIndex,
    VectorRecord,
};
pub use ingest::{IngestPipeline, IngestReport};
pub use server::AppContext;
