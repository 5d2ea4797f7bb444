//! 인제스트 파이프라인
//!
//! 고정된 문서 소스 집합을 추출 → 청킹 → 임베딩 → 업서트로 처리하는
//! 오프라인 배치입니다. 소스 하나의 실패는 기록하고 계속 진행하며,
//! 배치가 끝난 뒤 실패 여부를 보고합니다. 서빙과의 동시 실행은
//! 조정하지 않습니다 (오프라인 전용).

use std::path::PathBuf;
use std::sync::Arc;

use crate::chunker::WordChunker;
use crate::config::AppConfig;
use crate::embedding::EmbeddingProvider;
use crate::extract::{DocumentExtractor, SourceKind};
use crate::feed::FeedReader;
use crate::index::{record_id, RecordMetadata, VectorIndex, VectorRecord};

// ============================================================================
// Source Manifest
// ============================================================================

/// 문서 소스 정의
#[derive(Debug, Clone, Copy)]
pub struct SourceSpec {
    /// 소스 태그 (레코드 id와 메타데이터에 사용)
    pub tag: &'static str,
    /// 데이터 디렉토리 기준 파일명
    pub file: &'static str,
    /// 추출기 종류
    pub kind: SourceKind,
}

/// 고정 소스 매니페스트
///
/// 로컬 파일 소스 목록입니다. 블로그 피드는 별도로 수집됩니다.
pub const SOURCE_MANIFEST: &[SourceSpec] = &[
    SourceSpec {
        tag: "portfolio",
        file: "portfolio.html",
        kind: SourceKind::Html,
    },
    SourceSpec {
        tag: "resume",
        file: "resume.pdf",
        kind: SourceKind::PdfText,
    },
    SourceSpec {
        tag: "portfolio_pdf",
        file: "portfolio.pdf",
        kind: SourceKind::PdfOcr,
    },
    SourceSpec {
        tag: "github_profile",
        file: "github_profile.pdf",
        kind: SourceKind::PdfOcr,
    },
    SourceSpec {
        tag: "linkedin_profile",
        file: "rakesh_linkedin_summary.pdf",
        kind: SourceKind::PdfOcr,
    },
    SourceSpec {
        tag: "skills",
        file: "rakesh_skills.pdf",
        kind: SourceKind::PdfOcr,
    },
    SourceSpec {
        tag: "certificates",
        file: "rakesh_certifications.pdf",
        kind: SourceKind::PdfOcr,
    },
];

// ============================================================================
// IngestReport
// ============================================================================

/// 배치 실행 결과
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// 인덱싱된 소스 수
    pub sources_indexed: usize,
    /// 업서트된 청크 수
    pub chunks_indexed: usize,
    /// 실패한 소스 수 (추출 또는 임베딩/업서트 실패)
    pub failed_sources: usize,
}

// ============================================================================
// IngestPipeline
// ============================================================================

/// 인제스트 파이프라인
pub struct IngestPipeline {
    extractor: DocumentExtractor,
    feed: FeedReader,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    chunker: WordChunker,
    data_dir: PathBuf,
    blog_rss_url: String,
}

impl IngestPipeline {
    /// 파이프라인 구성
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            extractor: DocumentExtractor::new(config.openai_api_key.clone()),
            feed: FeedReader::new(),
            embedder,
            index,
            chunker: WordChunker::with_defaults(),
            data_dir: config.data_dir.clone(),
            blog_rss_url: config.blog_rss_url.clone(),
        }
    }

    /// 배치 실행: 소스 수집 후 전체 인덱싱
    pub async fn run(&self) -> IngestReport {
        let mut failed_sources = 0;

        // 1. 로컬 파일 소스 추출
        let mut sources: Vec<(String, String)> = Vec::new();
        for spec in SOURCE_MANIFEST {
            let path = self.data_dir.join(spec.file);
            match self.extractor.extract(&path, spec.kind).await {
                Ok(text) => {
                    tracing::info!("Extracted source '{}' ({} chars)", spec.tag, text.len());
                    sources.push((spec.tag.to_string(), text));
                }
                Err(e) => {
                    tracing::error!("Source '{}' failed: {}", spec.tag, e);
                    failed_sources += 1;
                }
            }
        }

        // 2. 블로그 피드 수집
        match self.feed.fetch(&self.blog_rss_url).await {
            Ok(docs) => {
                tracing::info!("Fetched {} feed documents", docs.len());
                sources.extend(docs.into_iter().map(|d| (d.source, d.text)));
            }
            Err(e) => {
                tracing::error!("Feed ingestion failed: {}", e);
                failed_sources += 1;
            }
        }

        // 3. 청킹 / 임베딩 / 업서트
        let mut report = self.index_documents(&sources).await;
        report.failed_sources += failed_sources;
        report
    }

    /// 수집된 소스들을 청킹하고 임베딩하여 업서트
    ///
    /// 레코드 id는 `{source}-{doc_index}-{chunk_index}`로 결정적이며,
    /// 같은 소스를 다시 인제스트하면 기존 레코드를 덮어씁니다.
    pub async fn index_documents(&self, sources: &[(String, String)]) -> IngestReport {
        let mut report = IngestReport::default();

        'sources: for (doc_index, (source, content)) in sources.iter().enumerate() {
            let chunks = self.chunker.chunk(content);
            if chunks.is_empty() {
                tracing::warn!("No chunks generated for source '{}'", source);
                continue;
            }

            let mut entries = Vec::with_capacity(chunks.len());

            for (chunk_index, chunk) in chunks.iter().enumerate() {
                let embedding = match self.embedder.embed(chunk).await {
                    Ok(e) => e,
                    Err(e) => {
                        // 소스 단위 실패: 나머지 소스는 계속 진행
                        tracing::error!("Embedding failed for '{}': {}", source, e);
                        report.failed_sources += 1;
                        continue 'sources;
                    }
                };

                entries.push(VectorRecord {
                    id: record_id(source, doc_index, chunk_index),
                    values: embedding,
                    metadata: RecordMetadata {
                        source: source.clone(),
                        chunk: chunk_index as u32,
                        text: chunk.clone(),
                    },
                });
            }

            match self.index.upsert(&entries).await {
                Ok(count) => {
                    tracing::info!(
                        "Indexed source '{}' (doc={}, chunks={})",
                        source,
                        doc_index,
                        count
                    );
                    report.sources_indexed += 1;
                    report.chunks_indexed += entries.len();
                }
                Err(e) => {
                    tracing::error!("Upsert failed for '{}': {}", source, e);
                    report.failed_sources += 1;
                }
            }
        }

        report
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::ServiceError;
    use crate::index::RetrievedChunk;

    struct MockEmbedder {
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
            if let Some(marker) = self.fail_on {
                if text.contains(marker) {
                    return Err(ServiceError::embedding("mock failure"));
                }
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[derive(Default)]
    struct MockIndex {
        records: Mutex<HashMap<String, VectorRecord>>,
        upsert_calls: Mutex<usize>,
    }

    #[async_trait]
    impl VectorIndex for MockIndex {
        async fn upsert(&self, records: &[VectorRecord]) -> Result<usize, ServiceError> {
            let mut stored = self.records.lock().unwrap();
            for record in records {
                stored.insert(record.id.clone(), record.clone());
            }
            *self.upsert_calls.lock().unwrap() += 1;
            Ok(records.len())
        }

        async fn query(
            &self,
            _embedding: &[f32],
            _top_k: usize,
        ) -> Result<Vec<RetrievedChunk>, ServiceError> {
            Ok(vec![])
        }
    }

    fn test_pipeline(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> IngestPipeline {
        let config = AppConfig {
            openai_api_key: "fake".to_string(),
            pinecone_api_key: "fake".to_string(),
            index_name: "test".to_string(),
            embed_dim: 2,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            port: 8000,
            allowed_origins: vec![],
            rate_limit_per_minute: 5,
            blog_rss_url: "https://example.com/rss.xml".to_string(),
            data_dir: PathBuf::from("mydata"),
        };
        IngestPipeline::new(&config, embedder, index)
    }

    #[test]
    fn test_manifest_covers_fixed_sources() {
        assert_eq!(SOURCE_MANIFEST.len(), 7);
        assert_eq!(SOURCE_MANIFEST[0].tag, "portfolio");
        assert_eq!(SOURCE_MANIFEST[0].kind, SourceKind::Html);
        assert_eq!(SOURCE_MANIFEST[1].kind, SourceKind::PdfText);

        let ocr_count = SOURCE_MANIFEST
            .iter()
            .filter(|s| s.kind == SourceKind::PdfOcr)
            .count();
        assert_eq!(ocr_count, 5);
    }

    #[tokio::test]
    async fn test_index_documents_deterministic_ids() {
        let index = Arc::new(MockIndex::default());
        let pipeline = test_pipeline(
            Arc::new(MockEmbedder { fail_on: None }),
            Arc::clone(&index) as Arc<dyn VectorIndex>,
        );

        let sources = vec![
            ("portfolio".to_string(), "first source text".to_string()),
            ("resume".to_string(), "second source text".to_string()),
        ];

        let report = pipeline.index_documents(&sources).await;
        assert_eq!(report.sources_indexed, 2);
        assert_eq!(report.failed_sources, 0);

        let stored = index.records.lock().unwrap();
        assert!(stored.contains_key("portfolio-0-0"));
        assert!(stored.contains_key("resume-1-0"));
    }

    #[tokio::test]
    async fn test_reingest_overwrites_instead_of_duplicating() {
        let index = Arc::new(MockIndex::default());
        let pipeline = test_pipeline(
            Arc::new(MockEmbedder { fail_on: None }),
            Arc::clone(&index) as Arc<dyn VectorIndex>,
        );

        let sources = vec![("resume".to_string(), "resume body".to_string())];

        pipeline.index_documents(&sources).await;
        let count_after_first = index.records.lock().unwrap().len();

        pipeline.index_documents(&sources).await;
        let count_after_second = index.records.lock().unwrap().len();

        // 동일 id 재업서트는 덮어쓰기 - 레코드 수 불변
        assert_eq!(count_after_first, count_after_second);
        assert_eq!(*index.upsert_calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_index_documents_records_metadata() {
        let index = Arc::new(MockIndex::default());
        let pipeline = test_pipeline(
            Arc::new(MockEmbedder { fail_on: None }),
            Arc::clone(&index) as Arc<dyn VectorIndex>,
        );

        let sources = vec![("skills".to_string(), "Rust Python Java".to_string())];
        pipeline.index_documents(&sources).await;

        let stored = index.records.lock().unwrap();
        let record = stored.get("skills-0-0").unwrap();
        assert_eq!(record.metadata.source, "skills");
        assert_eq!(record.metadata.chunk, 0);
        assert_eq!(record.metadata.text, "Rust Python Java");
    }

    #[tokio::test]
    async fn test_failed_source_does_not_block_others() {
        let index = Arc::new(MockIndex::default());
        let pipeline = test_pipeline(
            Arc::new(MockEmbedder {
                fail_on: Some("poison"),
            }),
            Arc::clone(&index) as Arc<dyn VectorIndex>,
        );

        let sources = vec![
            ("portfolio".to_string(), "poison text".to_string()),
            ("resume".to_string(), "healthy text".to_string()),
        ];

        let report = pipeline.index_documents(&sources).await;
        assert_eq!(report.failed_sources, 1);
        assert_eq!(report.sources_indexed, 1);

        let stored = index.records.lock().unwrap();
        assert!(!stored.contains_key("portfolio-0-0"));
        // 실패한 소스 뒤의 소스도 문서 인덱스를 유지한 채 인덱싱됨
        assert!(stored.contains_key("resume-1-0"));
    }

    #[tokio::test]
    async fn test_empty_source_is_skipped() {
        let index = Arc::new(MockIndex::default());
        let pipeline = test_pipeline(
            Arc::new(MockEmbedder { fail_on: None }),
            Arc::clone(&index) as Arc<dyn VectorIndex>,
        );

        let sources = vec![("portfolio".to_string(), "   ".to_string())];
        let report = pipeline.index_documents(&sources).await;

        assert_eq!(report.sources_indexed, 0);
        assert_eq!(report.failed_sources, 0);
        assert!(index.records.lock().unwrap().is_empty());
    }
}
