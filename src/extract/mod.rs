//! 문서 추출 모듈
//!
//! 소스 형식별 텍스트 추출기입니다.
//! - HTML 파일: 태그 제거 후 본문 텍스트
//! - 텍스트 내장 PDF: pdf-extract로 직접 추출
//! - 스캔 PDF: 비전 모델로 텍스트 전사 (OCR 대체)

pub mod html;
pub mod ocr;
pub mod pdf;

use std::path::Path;

use crate::error::ExtractionError;

// ============================================================================
// SourceKind
// ============================================================================

/// 소스 형식
///
/// 추출 메커니즘은 형식별로 다르며, 형식에 따라 추출기가 선택됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// 로컬 HTML 파일
    Html,
    /// 텍스트 레이어가 있는 PDF
    PdfText,
    /// 스캔 이미지 PDF (비전 모델 전사)
    PdfOcr,
}

// ============================================================================
// DocumentExtractor
// ============================================================================

/// 문서 추출기
///
/// 형식에 맞는 추출 경로로 디스패치합니다.
pub struct DocumentExtractor {
    /// 비전 모델 OCR용 API 키
    openai_api_key: String,
    ocr_base_url: Option<String>,
}

impl DocumentExtractor {
    pub fn new(openai_api_key: String) -> Self {
        Self {
            openai_api_key,
            ocr_base_url: None,
        }
    }

    /// OCR API 기본 URL 교체 (테스트용)
    pub fn with_ocr_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.ocr_base_url = Some(base_url.into());
        self
    }

    /// 파일에서 텍스트 추출
    pub async fn extract(&self, path: &Path, kind: SourceKind) -> Result<String, ExtractionError> {
        match kind {
            SourceKind::Html => html::extract_html_file(path),
            SourceKind::PdfText => {
                // PDF 파싱은 CPU 바운드이므로 spawn_blocking 사용
                let display = path_display(path);
                let owned = path.to_path_buf();
                tokio::task::spawn_blocking(move || pdf::extract_pdf_text(&owned))
                    .await
                    .map_err(|e| ExtractionError::Extract {
                        path: display,
                        reason: format!("extraction task failed: {e}"),
                    })?
            }
            SourceKind::PdfOcr => {
                ocr::extract_pdf_ocr(path, &self.openai_api_key, self.ocr_base_url.as_deref())
                    .await
            }
        }
    }
}

pub(crate) fn path_display(path: &Path) -> String {
    path.display().to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_extract_html_dispatch() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            "<html><body><p>Hello</p><p>extraction world</p></body></html>"
        )
        .unwrap();

        let extractor = DocumentExtractor::new("fake-key".to_string());
        let text = extractor.extract(&path, SourceKind::Html).await.unwrap();

        assert!(text.contains("Hello"));
        assert!(text.contains("extraction world"));
    }

    #[tokio::test]
    async fn test_extract_missing_file_is_read_error() {
        let extractor = DocumentExtractor::new("fake-key".to_string());
        let result = extractor
            .extract(Path::new("mydata/does-not-exist.html"), SourceKind::Html)
            .await;

        assert!(matches!(result, Err(ExtractionError::Read { .. })));
    }
}
