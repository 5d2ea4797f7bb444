//! 환경 설정 모듈
//!
//! 서비스 설정을 환경변수에서 한 번 읽어 `AppConfig`로 구성합니다.
//! 필수 값 누락은 기동 시점의 치명적 에러이며, 프로세스는 트래픽을 받지 않습니다.

use std::path::PathBuf;

use url::Url;

use crate::error::ConfigError;

// ============================================================================
// Defaults
// ============================================================================

/// 기본 임베딩 차원 (text-embedding-3-small 기본값)
pub const DEFAULT_EMBED_DIM: usize = 1536;

/// 기본 서버 포트
pub const DEFAULT_PORT: u16 = 8000;

/// 기본 레이트 리밋 (클라이언트당 분당 요청 수, 0이면 비활성화)
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 5;

/// 기본 벡터 DB 클라우드 / 리전
pub const DEFAULT_CLOUD: &str = "aws";
pub const DEFAULT_REGION: &str = "us-east-1";

/// 기본 블로그 RSS 피드 URL
pub const DEFAULT_BLOG_RSS_URL: &str = "https://blog.rakeshvardan.com/rss.xml";

/// 기본 문서 소스 디렉토리
pub const DEFAULT_DATA_DIR: &str = "mydata";

// ============================================================================
// AppConfig
// ============================================================================

/// 애플리케이션 설정
///
/// 기동 시 한 번 구성되어 핸들러에 공유 상태로 전달됩니다.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// OpenAI API 키 (임베딩 / 생성 / OCR 공용)
    pub openai_api_key: String,
    /// Pinecone API 키
    pub pinecone_api_key: String,
    /// 벡터 인덱스 이름
    pub index_name: String,
    /// 임베딩 차원
    pub embed_dim: usize,
    /// 인덱스 프로비저닝용 클라우드 / 리전
    pub cloud: String,
    pub region: String,
    /// HTTP 서버 포트
    pub port: u16,
    /// CORS 허용 오리진 목록
    pub allowed_origins: Vec<String>,
    /// 클라이언트당 분당 요청 한도 (0 = 비활성화)
    pub rate_limit_per_minute: u32,
    /// 블로그 RSS 피드 URL
    pub blog_rss_url: String,
    /// 문서 소스 디렉토리
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key = required_var("OPENAI_API_KEY")?;
        let pinecone_api_key = required_var("PINECONE_API_KEY")?;
        let index_name = required_var("PINECONE_INDEX_NAME")?;

        let embed_dim = parsed_var("PINECONE_EMBED_DIM", DEFAULT_EMBED_DIM)?;
        let cloud = var_or("PINECONE_CLOUD", DEFAULT_CLOUD);
        let region = var_or("PINECONE_REGION", DEFAULT_REGION);
        let port = parsed_var("PORT", DEFAULT_PORT)?;
        let rate_limit_per_minute =
            parsed_var("RATE_LIMIT_PER_MINUTE", DEFAULT_RATE_LIMIT_PER_MINUTE)?;

        let allowed_origins = match std::env::var("ALLOWED_ORIGINS") {
            Ok(raw) if !raw.trim().is_empty() => parse_origins(&raw),
            _ => default_allowed_origins(),
        };

        let blog_rss_url = var_or("BLOG_RSS_URL", DEFAULT_BLOG_RSS_URL);
        if Url::parse(&blog_rss_url).is_err() {
            return Err(ConfigError::InvalidVar {
                name: "BLOG_RSS_URL",
                value: blog_rss_url,
            });
        }

        let data_dir = PathBuf::from(var_or("DATA_DIR", DEFAULT_DATA_DIR));

        if embed_dim == 0 {
            return Err(ConfigError::InvalidVar {
                name: "PINECONE_EMBED_DIM",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            openai_api_key,
            pinecone_api_key,
            index_name,
            embed_dim,
            cloud,
            region,
            port,
            allowed_origins,
            rate_limit_per_minute,
            blog_rss_url,
            data_dir,
        })
    }
}

/// 필수 API 키 존재 여부 (status 명령어용, 값은 노출하지 않음)
pub fn has_required_keys() -> bool {
    ["OPENAI_API_KEY", "PINECONE_API_KEY", "PINECONE_INDEX_NAME"]
        .iter()
        .all(|name| {
            std::env::var(name)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
        })
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 필수 환경변수 읽기 (빈 값은 미설정으로 간주)
fn required_var(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar { name }),
    }
}

/// 선택 환경변수 읽기 (미설정 시 기본값)
fn var_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// 파싱 가능한 선택 환경변수 읽기
fn parsed_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|_| ConfigError::InvalidVar {
                name,
                value: value.clone(),
            })
        }
        _ => Ok(default),
    }
}

/// 쉼표 구분 오리진 목록 파싱
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_string())
        .collect()
}

/// 기본 CORS 허용 오리진 (로컬 개발 + 운영 도메인)
fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "https://rakeshvardan.com".to_string(),
        "https://www.rakeshvardan.com".to_string(),
    ]
}

// ============================================================================
// Tests
// ============================================================================
