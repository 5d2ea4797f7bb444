//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트로 텍스트 레이어가 있는 PDF에서 텍스트를 추출합니다.
//! 스캔 문서(텍스트 레이어 없음)는 `ocr` 모듈로 처리해야 합니다.

use std::path::Path;

use crate::error::ExtractionError;

use super::path_display;

/// PDF에서 내장 텍스트 추출
pub fn extract_pdf_text(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractionError::Read {
        path: path_display(path),
        reason: e.to_string(),
    })?;

    let text =
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractionError::Extract {
            path: path_display(path),
            reason: e.to_string(),
        })?;

    if text.trim().is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {:?}. It might be a scanned document.",
            path
        );
    }

    Ok(text)
}

// ============================================================================
// Tests
// ============================================================================
