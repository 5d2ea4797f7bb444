//! Pinecone 벡터 인덱스 - 서버리스 인덱스 클라이언트
//!
//! 컨트롤 플레인(인덱스 목록/생성/조회)과 데이터 플레인(업서트/쿼리)을 다룹니다.
//! 인덱스는 생성 시 차원과 코사인 메트릭이 고정되며, 프로비저닝은 멱등합니다:
//! 이미 존재하는 인덱스는 그대로 재사용합니다.
//!
//! ref: https://docs.pinecone.io/reference/api/introduction

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

use super::{RecordMetadata, RetrievedChunk, VectorIndex, VectorRecord};

/// 컨트롤 플레인 URL
const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// API 버전 헤더 값
const API_VERSION: &str = "2025-01";

/// 요청 타임아웃
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// IndexConfig
// ============================================================================

/// 인덱스 프로비저닝 설정
///
/// 차원 / 클라우드 / 리전은 생성 시 한 번 고정됩니다.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub name: String,
    pub dimension: usize,
    pub cloud: String,
    pub region: String,
}

// ============================================================================
// PineconeIndex
// ============================================================================

/// Pinecone 서버리스 인덱스 클라이언트
pub struct PineconeIndex {
    api_key: String,
    /// 데이터 플레인 호스트 (스킴 포함)
    host: String,
    client: reqwest::Client,
}

impl PineconeIndex {
    /// 인덱스 확보 후 데이터 플레인 핸들 생성 (멱등)
    ///
    /// 인덱스 목록에 없으면 설정된 차원 / 코사인 메트릭 / 클라우드 / 리전으로
    /// 생성하고, 있으면 그대로 재사용합니다.
    pub async fn ensure(api_key: String, config: &IndexConfig) -> Result<Self, ServiceError> {
        Self::ensure_at(CONTROL_PLANE_URL, api_key, config).await
    }

    /// 컨트롤 플레인 URL을 지정하여 인덱스 확보 (테스트용)
    pub async fn ensure_at(
        control_url: &str,
        api_key: String,
        config: &IndexConfig,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::new();

        let existing = list_indexes(&client, control_url, &api_key).await?;
        let description = match existing.into_iter().find(|ix| ix.name == config.name) {
            Some(desc) => {
                tracing::info!("Using existing vector index: {}", config.name);
                desc
            }
            None => {
                tracing::info!(
                    "Creating vector index: {} (dim={}, {}/{})",
                    config.name,
                    config.dimension,
                    config.cloud,
                    config.region
                );
                create_index(&client, control_url, &api_key, config).await?
            }
        };

        let host = if description.host.starts_with("http") {
            description.host
        } else {
            format!("https://{}", description.host)
        };

        Ok(Self {
            api_key,
            host,
            client,
        })
    }

    /// 알려진 호스트로 직접 연결 (프로비저닝 생략, 테스트용)
    pub fn with_host(api_key: String, host: impl Into<String>) -> Self {
        Self {
            api_key,
            host: host.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp, ServiceError> {
        let url = format!("{}{}", self.host, path);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::index(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::index(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ServiceError::Index(format!(
                "index API error ({status}): {body}"
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| ServiceError::index(format!("failed to parse response: {e}")))
    }
}

// ============================================================================
// Control Plane
// ============================================================================

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    name: String,
    host: String,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

/// 인덱스 목록 조회
async fn list_indexes(
    client: &reqwest::Client,
    control_url: &str,
    api_key: &str,
) -> Result<Vec<IndexDescription>, ServiceError> {
    let response = client
        .get(format!("{control_url}/indexes"))
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|e| ServiceError::index(format!("failed to list indexes: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ServiceError::index(format!("failed to read response: {e}")))?;

    if !status.is_success() {
        return Err(ServiceError::Index(format!(
            "index API error ({status}): {body}"
        )));
    }

    let list: IndexList = serde_json::from_str(&body)
        .map_err(|e| ServiceError::index(format!("failed to parse index list: {e}")))?;

    Ok(list.indexes)
}

/// 인덱스 생성 (코사인 메트릭 고정)
async fn create_index(
    client: &reqwest::Client,
    control_url: &str,
    api_key: &str,
    config: &IndexConfig,
) -> Result<IndexDescription, ServiceError> {
    let request = CreateIndexRequest {
        name: &config.name,
        dimension: config.dimension,
        metric: "cosine",
        spec: IndexSpec {
            serverless: ServerlessSpec {
                cloud: &config.cloud,
                region: &config.region,
            },
        },
    };

    let response = client
        .post(format!("{control_url}/indexes"))
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .timeout(REQUEST_TIMEOUT)
        .json(&request)
        .send()
        .await
        .map_err(|e| ServiceError::index(format!("failed to create index: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ServiceError::index(format!("failed to read response: {e}")))?;

    if !status.is_success() {
        return Err(ServiceError::Index(format!(
            "index API error ({status}): {body}"
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| ServiceError::index(format!("failed to parse index description: {e}")))
}

// ============================================================================
// Data Plane
// ============================================================================

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    metadata: Option<RecordMetadata>,
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize, ServiceError> {
        if records.is_empty() {
            return Ok(0);
        }

        let response: UpsertResponse = self
            .post_json("/vectors/upsert", &UpsertRequest { vectors: records })
            .await?;

        Ok(response.upserted_count)
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, ServiceError> {
        let response: QueryResponse = self
            .post_json(
                "/query",
                &QueryRequest {
                    vector: embedding,
                    top_k,
                    include_metadata: true,
                },
            )
            .await?;

        let chunks = response
            .matches
            .into_iter()
            .filter_map(|m| match m.metadata {
                Some(metadata) => Some(RetrievedChunk {
                    id: m.id,
                    score: m.score,
                    source: metadata.source,
                    text: metadata.text,
                }),
                None => {
                    tracing::warn!("Query match {} has no metadata, skipping", m.id);
                    None
                }
            })
            .collect();

        Ok(chunks)
    }
}

// ============================================================================
// Tests
// ============================================================================
