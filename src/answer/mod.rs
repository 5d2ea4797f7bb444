//! 답변 서비스 - RAG 질의응답 플로우
//!
//! 질문 임베딩 → 최근접 청크 검색 → 컨텍스트 조립 → 생성 호출을
//! 순차 실행합니다. 각 단계는 이전 단계의 결과에 의존하므로 요청 내
//! 병렬화는 없으며, 어느 단계든 실패하면 요청 전체가 실패합니다
//! (재시도 없음, 부분 응답 없음).

use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::error::ServiceError;
use crate::generation::CompletionProvider;
use crate::index::{RetrievedChunk, VectorIndex};

/// 검색 상위 K
pub const TOP_K: usize = 5;

/// 컨텍스트 청크 구분자
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// 컨텍스트 부족 시 고정 응답 문구
pub const FALLBACK_ANSWER: &str = "I don't have information about that.";

/// 고정 시스템 메시지
const SYSTEM_MESSAGE: &str = "You answer based on Rakesh's professional background.";

// ============================================================================
// AnswerService
// ============================================================================

/// RAG 답변 서비스
///
/// 임베딩 / 인덱스 / 생성 클라이언트를 소유하고 질문당 한 번의
/// 검색-생성 플로우를 수행합니다.
pub struct AnswerService {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    chat: Arc<dyn CompletionProvider>,
}

impl AnswerService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        chat: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            embedder,
            index,
            chat,
        }
    }

    /// 질문에 답변
    pub async fn answer(&self, question: &str) -> Result<String, ServiceError> {
        // 1. 질문 임베딩
        let embedding = self.embedder.embed(question).await?;

        // 2. 최근접 청크 검색
        let results = self.index.query(&embedding, TOP_K).await?;
        tracing::debug!("Retrieved {} context chunks", results.len());

        // 3. 컨텍스트 조립
        let context = build_context(&results);

        // 4. 생성
        let prompt = render_prompt(&context, question);
        let answer = self.chat.complete(SYSTEM_MESSAGE, &prompt).await?;

        Ok(answer.trim().to_string())
    }
}

// ============================================================================
// Prompt Assembly
// ============================================================================

/// 검색 결과를 순위 순서대로 구분자로 이어 컨텍스트 생성
fn build_context(results: &[RetrievedChunk]) -> String {
    results
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// 고정 프롬프트 템플릿 렌더링
///
/// 컨텍스트에 없는 내용은 고정 문구로 답하도록 지시합니다.
fn render_prompt(context: &str, question: &str) -> String {
    format!(
        "You are Rakesh's professional assistant. Answer the user's question using the context below.\n\
         If the context doesn't contain the answer, say \"{FALLBACK_ANSWER}\"\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         Answer:"
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    struct MockEmbedder;

    #[async_trait]
    impl EmbeddingProvider for MockEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ServiceError> {
            Ok(vec![0.5, 0.5])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    struct MockIndex {
        results: Vec<RetrievedChunk>,
    }

    #[async_trait]
    impl VectorIndex for MockIndex {
        async fn upsert(
            &self,
            _records: &[crate::index::VectorRecord],
        ) -> Result<usize, ServiceError> {
            Ok(0)
        }

        async fn query(
            &self,
            _embedding: &[f32],
            top_k: usize,
        ) -> Result<Vec<RetrievedChunk>, ServiceError> {
            let mut results = self.results.clone();
            results.truncate(top_k);
            Ok(results)
        }
    }

    /// 받은 프롬프트를 그대로 돌려주는 생성 목 (충실한 전사 가정)
    struct EchoChat;

    #[async_trait]
    impl CompletionProvider for EchoChat {
        async fn complete(&self, _system: &str, user: &str) -> Result<String, ServiceError> {
            Ok(user.to_string())
        }
    }

    /// 고정 문구를 돌려주는 생성 목
    struct FallbackChat;

    #[async_trait]
    impl CompletionProvider for FallbackChat {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, ServiceError> {
            Ok(format!("  {FALLBACK_ANSWER}  "))
        }
    }

    struct FailingChat;

    #[async_trait]
    impl CompletionProvider for FailingChat {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, ServiceError> {
            Err(ServiceError::generation("model unavailable"))
        }
    }

    fn chunk(id: &str, source: &str, text: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            id: id.to_string(),
            score,
            source: source.to_string(),
            text: text.to_string(),
        }
    }

    fn service(
        results: Vec<RetrievedChunk>,
        chat: Arc<dyn CompletionProvider>,
    ) -> AnswerService {
        AnswerService::new(Arc::new(MockEmbedder), Arc::new(MockIndex { results }), chat)
    }

    #[test]
    fn test_build_context_joins_with_separator() {
        let results = vec![
            chunk("a-0-0", "resume", "first chunk", 0.9),
            chunk("b-1-0", "blog", "second chunk", 0.8),
        ];

        let context = build_context(&results);
        assert_eq!(context, "first chunk\n---\nsecond chunk");
    }

    #[test]
    fn test_build_context_empty() {
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_render_prompt_contains_fixed_instructions() {
        let prompt = render_prompt("some context", "some question");
        assert!(prompt.contains(FALLBACK_ANSWER));
        assert!(prompt.contains("Context:\nsome context"));
        assert!(prompt.contains("Question: some question"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[tokio::test]
    async fn test_answer_includes_matching_chunk_verbatim() {
        let results = vec![
            chunk("resume-1-0", "resume", "Rakesh worked at ACME for 5 years", 0.95),
            chunk("blog-3-0", "blog", "unrelated post", 0.2),
        ];

        let service = service(results, Arc::new(EchoChat));
        let answer = service.answer("Where did Rakesh work?").await.unwrap();

        // 저장된 청크 텍스트가 컨텍스트에 그대로 포함됨
        assert!(answer.contains("Rakesh worked at ACME for 5 years"));
    }

    #[tokio::test]
    async fn test_answer_empty_store_uses_fallback() {
        let service = service(vec![], Arc::new(FallbackChat));
        let answer = service.answer("anything?").await.unwrap();

        assert!(answer.contains(FALLBACK_ANSWER));
        // trim 확인
        assert_eq!(answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_answer_blog_summary_count() {
        // blog_summary 레코드 하나로 집계 질문에 답하는 종단 플로우
        let summary = "Rakesh Vardan has written 3 blogs:\n- A\n- B\n- C";
        let results = vec![chunk("blog_summary-9-0", "blog_summary", summary, 0.9)];

        let service = service(results, Arc::new(EchoChat));
        let answer = service
            .answer("How many blog posts has Rakesh written?")
            .await
            .unwrap();

        assert!(answer.contains("has written 3 blogs"));
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let service = service(vec![], Arc::new(FailingChat));
        let err = service.answer("q").await.unwrap_err();
        assert!(matches!(err, ServiceError::Generation(_)));
    }
}
