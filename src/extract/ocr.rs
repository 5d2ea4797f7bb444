//! 스캔 PDF 텍스트 추출 모듈
//!
//! 비전 모델(Chat Completions 파일 입력)로 스캔 PDF에서 텍스트를 전사합니다.
//! 텍스트 레이어가 없는 스크린샷 PDF(링크드인 요약, 스킬, 자격증 등)에 사용합니다.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

use super::path_display;

/// OpenAI API 기본 URL
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// 전사에 사용하는 비전 모델
const OCR_MODEL: &str = "gpt-4o";

/// 전사 프롬프트
const TRANSCRIPTION_PROMPT: &str = "Extract all text content from the attached document. \
Transcribe every piece of visible text, preserving the reading order. \
Output the raw text only, without commentary. \
If the document contains no text, respond with an empty string.";

/// 스캔 PDF에서 텍스트 추출
///
/// PDF 전체를 base64 인라인 파일로 전송하고 모델의 전사 결과를 반환합니다.
/// 페이지 분리는 모델에 위임합니다.
pub async fn extract_pdf_ocr(
    path: &Path,
    api_key: &str,
    base_url: Option<&str>,
) -> Result<String, ExtractionError> {
    // 1. PDF 파일 읽기
    let pdf_data = tokio::fs::read(path)
        .await
        .map_err(|e| ExtractionError::Read {
            path: path_display(path),
            reason: e.to_string(),
        })?;

    // 2. Base64 인코딩 (data URL)
    let file_data = format!("data:application/pdf;base64,{}", STANDARD.encode(&pdf_data));

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.pdf")
        .to_string();

    // 3. API 요청 구성
    let request = OcrRequest {
        model: OCR_MODEL.to_string(),
        messages: vec![OcrMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text {
                    text: TRANSCRIPTION_PROMPT.to_string(),
                },
                ContentPart::File {
                    file: FileData {
                        filename,
                        file_data,
                    },
                },
            ],
        }],
        temperature: 0.0,
    };

    // 4. API 호출
    let url = format!(
        "{}/chat/completions",
        base_url.unwrap_or(OPENAI_API_BASE)
    );
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await
        .map_err(|e| ExtractionError::Extract {
            path: path_display(path),
            reason: format!("failed to send transcription request: {e}"),
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| ExtractionError::Extract {
        path: path_display(path),
        reason: format!("failed to read response: {e}"),
    })?;

    if !status.is_success() {
        return Err(ExtractionError::Extract {
            path: path_display(path),
            reason: format!("vision API error ({status}): {body}"),
        });
    }

    // 5. 응답 파싱
    let ocr_response: OcrResponse =
        serde_json::from_str(&body).map_err(|e| ExtractionError::Extract {
            path: path_display(path),
            reason: format!("failed to parse response: {e}"),
        })?;

    let text = ocr_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    if text.trim().is_empty() {
        tracing::warn!("No text transcribed from PDF: {:?}", path);
    }

    Ok(text)
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OcrRequest {
    model: String,
    messages: Vec<OcrMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OcrMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    File { file: FileData },
}

#[derive(Debug, Serialize)]
struct FileData {
    filename: String,
    file_data: String,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    choices: Vec<OcrChoice>,
}

#[derive(Debug, Deserialize)]
struct OcrChoice {
    message: OcrChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OcrChoiceMessage {
    content: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
