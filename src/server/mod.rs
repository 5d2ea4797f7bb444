//! HTTP 프론트엔드
//!
//! 단일 `/ask` 엔드포인트를 노출합니다. CORS 허용 목록과 클라이언트별
//! 레이트 리밋은 설정으로 구성되는 레이어이며, 서비스 진입점은 하나입니다.
//! 모든 공유 상태는 기동 시 한 번 구성되는 `AppContext`로 전달됩니다.

pub mod limit;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderValue, Method};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::answer::AnswerService;
use crate::config::AppConfig;
use crate::error::ApiError;

use self::limit::RateLimiter;

/// 레이트 리밋 윈도우 (고정 60초)
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

// ============================================================================
// AppContext
// ============================================================================

/// 프로세스 공유 상태
///
/// 기동 시 한 번 구성되어 모든 핸들러에 전달됩니다.
/// 벡터 인덱스는 읽기 위주이고, 리미터 카운터만 뮤텍스로 보호합니다.
pub struct AppContext {
    pub answer: AnswerService,
    /// 클라이언트별 요청 카운터 (None이면 레이트 리밋 비활성화)
    pub limiter: Option<Mutex<RateLimiter>>,
}

impl AppContext {
    pub fn new(answer: AnswerService, rate_limit_per_minute: u32) -> Self {
        let limiter = (rate_limit_per_minute > 0)
            .then(|| Mutex::new(RateLimiter::new(rate_limit_per_minute, RATE_LIMIT_WINDOW)));

        Self { answer, limiter }
    }
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

// ============================================================================
// Router
// ============================================================================

/// 애플리케이션 라우터 구성
///
/// CORS 허용 목록은 설정에서 읽어 레이어로 부착합니다.
pub fn build_router(state: Arc<AppContext>, config: &AppConfig) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .with_state(state)
        .layer(build_cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS 레이어 구성 (명시적 오리진 허용 목록)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
        .allow_credentials(true)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /ask - 질문에 답변
async fn ask(
    State(state): State<Arc<AppContext>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    if let Some(limiter) = &state.limiter {
        let allowed = limiter
            .lock()
            .map(|mut l| l.check(addr.ip()))
            .unwrap_or(true);

        if !allowed {
            tracing::warn!("Rate limit exceeded for {}", addr.ip());
            return Err(ApiError::RateLimited);
        }
    }

    let answer = state.answer.answer(&request.question).await?;
    Ok(Json(AskResponse { answer }))
}

// ============================================================================
// Server
// ============================================================================

/// HTTP 서버 기동 (ctrl-c로 종료)
pub async fn serve(config: &AppConfig, state: Arc<AppContext>) -> anyhow::Result<()> {
    let router = build_router(state, config);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to install ctrl-c handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}

// ============================================================================
// Tests
// ============================================================================
