//! HTML 텍스트 추출 모듈
//!
//! HTML 문서에서 태그를 제거한 본문 텍스트를 추출합니다.
//! 블로그 피드 본문 변환에도 같은 루틴을 사용합니다.

use std::path::Path;

use scraper::{Html, Selector};

use crate::error::ExtractionError;

use super::path_display;

/// 로컬 HTML 파일에서 텍스트 추출
pub fn extract_html_file(path: &Path) -> Result<String, ExtractionError> {
    let html = std::fs::read_to_string(path).map_err(|e| ExtractionError::Read {
        path: path_display(path),
        reason: e.to_string(),
    })?;

    Ok(extract_text(&html))
}

/// HTML 문자열에서 텍스트 추출
///
/// 텍스트 노드를 단일 공백으로 이어 붙이고 연속 공백을 정리합니다.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    // 우선순위: body > 전체 문서
    if let Ok(selector) = Selector::parse("body") {
        if let Some(element) = document.select(&selector).next() {
            return collect_text(element.text());
        }
    }

    collect_text(document.root_element().text())
}

/// 텍스트 노드 수집 (공백 정규화)
fn collect_text<'a>(nodes: impl Iterator<Item = &'a str>) -> String {
    let mut text = String::new();

    for node in nodes {
        let trimmed = node.trim();
        if !trimmed.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(trimmed);
        }
    }

    // 연속 공백 정리
    if let Ok(re) = regex::Regex::new(r"\s+") {
        re.replace_all(&text, " ").trim().to_string()
    } else {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

// ============================================================================
// Tests
// ============================================================================
