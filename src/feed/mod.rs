//! RSS 피드 수집 모듈
//!
//! 블로그 RSS 피드를 가져와 게시물별 문서와 제목 요약 문서를 생성합니다.
//! 요약 문서는 "블로그 몇 개 썼나요" 같은 집계 질문에 전문 검색 없이
//! 답할 수 있도록 별도 소스 태그(`blog_summary`)로 저장됩니다.

use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::parser;

use crate::error::ExtractionError;
use crate::extract::html;

/// 블로그 게시물 소스 태그
pub const BLOG_SOURCE: &str = "blog";

/// 요약 문서 소스 태그
pub const BLOG_SUMMARY_SOURCE: &str = "blog_summary";

/// 피드 요청 타임아웃
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Types
// ============================================================================

/// 피드에서 생성된 문서 소스
#[derive(Debug, Clone)]
pub struct FeedDocument {
    /// 소스 태그 (blog 또는 blog_summary)
    pub source: String,
    /// 추출된 본문 텍스트
    pub text: String,
}

// ============================================================================
// FeedReader
// ============================================================================

/// RSS 피드 리더
pub struct FeedReader {
    client: reqwest::Client,
}

impl FeedReader {
    /// 새 피드 리더 생성
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// 피드 URL에서 문서 목록 생성
    pub async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedDocument>, ExtractionError> {
        tracing::info!("Fetching blog feed: {}", feed_url);

        let response = self
            .client
            .get(feed_url)
            .header(reqwest::header::USER_AGENT, "persona-rag/0.1")
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| ExtractionError::Fetch {
                url: feed_url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Fetch {
                url: feed_url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let bytes = response.bytes().await.map_err(|e| ExtractionError::Fetch {
            url: feed_url.to_string(),
            reason: e.to_string(),
        })?;

        parse_feed(&bytes, feed_url)
    }
}

impl Default for FeedReader {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Feed Parsing
// ============================================================================

/// 피드 바이트를 문서 목록으로 변환 (fetch와 분리 - 테스트용)
///
/// 게시물마다 한 문서, 마지막에 전체 제목을 나열한 요약 문서 하나를 추가합니다.
pub fn parse_feed(bytes: &[u8], feed_url: &str) -> Result<Vec<FeedDocument>, ExtractionError> {
    let feed = parser::parse(bytes).map_err(|e| ExtractionError::Fetch {
        url: feed_url.to_string(),
        reason: format!("feed parse error: {e}"),
    })?;

    let mut documents = Vec::with_capacity(feed.entries.len() + 1);
    let mut titles = Vec::with_capacity(feed.entries.len());

    for entry in feed.entries {
        let title = entry.title.map(|t| t.content).unwrap_or_default();
        titles.push(title.clone());

        // 전체 본문 우선, 없으면 요약으로 폴백
        let body_html = entry
            .content
            .and_then(|c| c.body)
            .or_else(|| entry.summary.map(|s| s.content))
            .unwrap_or_default();
        let body = html::extract_text(&body_html);

        let published = format_published(entry.published);
        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();

        documents.push(FeedDocument {
            source: BLOG_SOURCE.to_string(),
            text: format!(
                "Blog Title: {title}\nPublished: {published}\nLink: {link}\n\n{body}"
            ),
        });
    }

    documents.push(FeedDocument {
        source: BLOG_SUMMARY_SOURCE.to_string(),
        text: build_summary(&titles),
    });

    Ok(documents)
}

/// 게시 일시 포맷 (RFC 2822, 없으면 빈 문자열)
fn format_published(published: Option<DateTime<Utc>>) -> String {
    published.map(|d| d.to_rfc2822()).unwrap_or_default()
}

/// 제목 요약 문서 생성
fn build_summary(titles: &[String]) -> String {
    let mut summary = format!("Rakesh Vardan has written {} blogs:", titles.len());
    for title in titles {
        summary.push_str("\n- ");
        summary.push_str(title);
    }
    summary
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Rakesh's Blog</title>
    <link>https://blog.rakeshvardan.com</link>
    <item>
      <title>Testing with Playwright</title>
      <link>https://blog.rakeshvardan.com/playwright</link>
      <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
      <description>Short summary</description>
      <content:encoded><![CDATA[<p>Full <b>playwright</b> article body.</p>]]></content:encoded>
    </item>
    <item>
      <title>CI Pipelines</title>
      <link>https://blog.rakeshvardan.com/ci</link>
      <description><![CDATA[<p>Only a summary here.</p>]]></description>
    </item>
    <item>
      <title>API Automation</title>
      <link>https://blog.rakeshvardan.com/api</link>
      <description>Plain summary</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_produces_entry_and_summary_documents() {
        let docs = parse_feed(SAMPLE_RSS.as_bytes(), "https://example.com/rss.xml").unwrap();

        // 게시물 3 + 요약 1
        assert_eq!(docs.len(), 4);
        assert!(docs[..3].iter().all(|d| d.source == BLOG_SOURCE));
        assert_eq!(docs[3].source, BLOG_SUMMARY_SOURCE);
    }

    #[test]
    fn test_parse_feed_entry_format() {
        let docs = parse_feed(SAMPLE_RSS.as_bytes(), "https://example.com/rss.xml").unwrap();

        let first = &docs[0].text;
        assert!(first.contains("Blog Title: Testing with Playwright"));
        assert!(first.contains("Link: https://blog.rakeshvardan.com/playwright"));
        // 본문 HTML 태그 제거됨
        assert!(first.contains("Full playwright article body."));
        assert!(!first.contains("<b>"));
    }

    #[test]
    fn test_parse_feed_falls_back_to_summary_body() {
        let docs = parse_feed(SAMPLE_RSS.as_bytes(), "https://example.com/rss.xml").unwrap();

        // content:encoded가 없는 항목은 description 사용
        assert!(docs[1].text.contains("Only a summary here."));
    }

    #[test]
    fn test_summary_lists_all_titles_with_count() {
        let docs = parse_feed(SAMPLE_RSS.as_bytes(), "https://example.com/rss.xml").unwrap();

        let summary = &docs[3].text;
        assert!(summary.contains("has written 3 blogs:"));
        assert!(summary.contains("- Testing with Playwright"));
        assert!(summary.contains("- CI Pipelines"));
        assert!(summary.contains("- API Automation"));
    }

    #[test]
    fn test_empty_feed_still_produces_summary() {
        let empty = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        let docs = parse_feed(empty.as_bytes(), "https://example.com/rss.xml").unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, BLOG_SUMMARY_SOURCE);
        assert!(docs[0].text.contains("has written 0 blogs"));
    }

    #[test]
    fn test_invalid_feed_is_fetch_error() {
        let result = parse_feed(b"this is not xml", "https://example.com/rss.xml");
        assert!(matches!(result, Err(ExtractionError::Fetch { .. })));
    }
}
