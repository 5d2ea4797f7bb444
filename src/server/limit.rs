//! 요청 레이트 리미터
//!
//! 클라이언트 주소별 슬라이딩 윈도우 카운터입니다.
//! 한도를 넘긴 요청은 대기 없이 즉시 거부합니다 (HTTP 429).

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// 슬라이딩 윈도우 레이트 리미터
#[derive(Debug)]
pub struct RateLimiter {
    requests: HashMap<IpAddr, Vec<Instant>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    /// 새 리미터 생성
    ///
    /// # Arguments
    /// * `max_requests` - 윈도우당 허용 요청 수
    /// * `window` - 윈도우 길이 (기본 60초)
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            requests: HashMap::new(),
            max_requests,
            window,
        }
    }

    /// 요청 허용 여부 확인 및 기록
    ///
    /// 허용되면 현재 요청을 카운터에 기록하고 true를 반환합니다.
    /// 거부된 요청은 기록하지 않습니다.
    pub fn check(&mut self, client: IpAddr) -> bool {
        let now = Instant::now();

        // 빈 엔트리 정리 (오래 전에 떠난 클라이언트)
        self.requests.retain(|_, entries| !entries.is_empty());

        let entries = self.requests.entry(client).or_default();

        // 윈도우 밖의 오래된 요청 제거
        entries.retain(|&t| now.duration_since(t) < self.window);

        if entries.len() >= self.max_requests as usize {
            return false;
        }

        entries.push(now);
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
