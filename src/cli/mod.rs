//! CLI 모듈
//!
//! persona-rag CLI 명령어 정의 및 구현.
//! `serve`는 HTTP 질의응답 서버, `ingest`는 오프라인 문서 인제스트 배치입니다.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::answer::AnswerService;
use crate::config::{self, AppConfig};
use crate::embedding::OpenAiEmbedding;
use crate::generation::OpenAiChat;
use crate::index::{IndexConfig, PineconeIndex, VectorIndex};
use crate::ingest::IngestPipeline;
use crate::server::{self, AppContext};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "persona-rag")]
#[command(version, about = "개인 문서 RAG 질의응답 서비스", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTP 질의응답 서버 실행
    Serve,

    /// 문서 소스 인제스트 (오프라인 배치)
    Ingest,

    /// 설정 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve => cmd_serve().await,
        Commands::Ingest => cmd_ingest().await,
        Commands::Status => cmd_status(),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 서버 명령어 (serve)
///
/// 설정 로드 → 클라이언트 구성 → 인덱스 확보 → HTTP 서버 기동.
/// 설정 에러는 치명적이며 트래픽을 받기 전에 종료합니다.
async fn cmd_serve() -> Result<()> {
    let config = AppConfig::from_env().context("설정 로드 실패")?;

    println!("[*] 벡터 인덱스 확인 중: {}", config.index_name);
    let (embedder, index) = build_backends(&config).await?;
    let chat = Arc::new(OpenAiChat::new(config.openai_api_key.clone()));

    let answer = AnswerService::new(embedder, index, chat);
    let state = Arc::new(AppContext::new(answer, config.rate_limit_per_minute));

    println!("[OK] 서버 시작 (포트: {})", config.port);
    server::serve(&config, state).await
}

/// 인제스트 명령어 (ingest)
///
/// 고정 소스 매니페스트와 블로그 피드를 추출 → 청킹 → 임베딩 → 업서트.
/// 소스 단위 실패는 계속 진행하고 마지막에 보고합니다.
async fn cmd_ingest() -> Result<()> {
    let config = AppConfig::from_env().context("설정 로드 실패")?;

    println!("[*] 벡터 인덱스 확인 중: {}", config.index_name);
    let (embedder, index) = build_backends(&config).await?;

    println!("[*] 문서 인제스트 시작 (데이터 디렉토리: {})", config.data_dir.display());

    let pipeline = IngestPipeline::new(&config, embedder, index);
    let report = pipeline.run().await;

    println!();
    println!(
        "[OK] 완료: 소스 {} 건, 청크 {} 건 인덱싱",
        report.sources_indexed, report.chunks_indexed
    );

    if report.failed_sources > 0 {
        bail!("인제스트 실패: {} 개 소스 처리 실패", report.failed_sources);
    }

    Ok(())
}

/// 상태 명령어 (status)
///
/// 설정과 API 키 존재 여부를 확인합니다. 네트워크 호출은 하지 않습니다.
fn cmd_status() -> Result<()> {
    println!("persona-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    if config::has_required_keys() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    필수: OPENAI_API_KEY, PINECONE_API_KEY, PINECONE_INDEX_NAME");
    }

    match AppConfig::from_env() {
        Ok(config) => {
            println!("[OK] 설정 유효");
            println!("    인덱스: {} (dim={})", config.index_name, config.embed_dim);
            println!("    리전: {}/{}", config.cloud, config.region);
            println!("    데이터 디렉토리: {}", config.data_dir.display());
            println!("    허용 오리진: {} 개", config.allowed_origins.len());
            if config.rate_limit_per_minute > 0 {
                println!("    레이트 리밋: 분당 {} 요청", config.rate_limit_per_minute);
            } else {
                println!("    레이트 리밋: 비활성화");
            }
        }
        Err(e) => {
            println!("[!] 설정 에러: {}", e);
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 임베딩 클라이언트 구성 및 벡터 인덱스 확보
async fn build_backends(
    config: &AppConfig,
) -> Result<(Arc<OpenAiEmbedding>, Arc<dyn VectorIndex>)> {
    let embedder = Arc::new(OpenAiEmbedding::with_dimension(
        config.openai_api_key.clone(),
        config.embed_dim,
    ));

    let index_config = IndexConfig {
        name: config.index_name.clone(),
        dimension: config.embed_dim,
        cloud: config.cloud.clone(),
        region: config.region.clone(),
    };

    let index = PineconeIndex::ensure(config.pinecone_api_key.clone(), &index_config)
        .await
        .context("벡터 인덱스 초기화 실패")?;

    Ok((embedder, Arc::new(index)))
}
