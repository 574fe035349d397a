use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;
use async_trait::async_trait;

use super::config::RateLimitConfig;

/// 요청 한 건에 대한 한도 판정
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateDecision {
    /// 허용. 남은 버스트 여유분
    Allowed { remaining: u32 },
    /// 한도 초과. 다음 요청이 허용될 때까지의 시간
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// 클라이언트 키 하나의 토큰 버킷
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(limit: &RateLimitConfig) -> Self {
        Self {
            tokens: f64::from(limit.burst),
            last_refill: Instant::now(),
        }
    }

    /// 경과 시간만큼 보충한 뒤 토큰 하나를 소비합니다.
    fn take(&mut self, limit: &RateLimitConfig, now: Instant) -> RateDecision {
        let rate = f64::from(limit.average);
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(f64::from(limit.burst));
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            RateDecision::Allowed { remaining: self.tokens.floor() as u32 }
        } else {
            RateDecision::Limited {
                retry_after: Duration::from_secs_f64((1.0 - self.tokens) / rate),
            }
        }
    }
}

/// 클라이언트 키별 한도 상태 저장소
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// 요청 한 건을 기록하고 허용 여부를 반환합니다.
    async fn acquire(&self, key: &str, limit: &RateLimitConfig) -> RateDecision;
}

/// 정리 주기 기본값 (acquire 호출 수)
const DEFAULT_SWEEP_INTERVAL: u32 = 1024;

#[derive(Debug, Default)]
struct Buckets {
    by_key: HashMap<String, TokenBucket>,
    since_sweep: u32,
}

impl Buckets {
    /// 버스트까지 다시 채워진 버킷을 제거합니다.
    ///
    /// 가득 찬 버킷은 새로 만든 버킷과 같으므로 제거해도 판정이 달라지지 않습니다.
    fn sweep(&mut self, limit: &RateLimitConfig, now: Instant) -> usize {
        let refill = Duration::from_secs_f64(f64::from(limit.burst) / f64::from(limit.average));
        let before = self.by_key.len();
        self.by_key
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < refill);
        self.since_sweep = 0;
        before - self.by_key.len()
    }
}

/// 메모리 기반 토큰 버킷 저장소
///
/// API 정의마다 하나씩 만들어지며 그 API의 체인에서만 공유됩니다.
/// `sweep_interval`번의 `acquire`마다 다시 가득 찬 버킷을 정리합니다.
#[derive(Debug, Clone)]
pub struct TokenBucketStore {
    buckets: Arc<Mutex<Buckets>>,
    sweep_interval: u32,
}

impl Default for TokenBucketStore {
    fn default() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }
}

impl TokenBucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_interval(sweep_interval: u32) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(Buckets::default())),
            sweep_interval: sweep_interval.max(1),
        }
    }

    pub async fn bucket_count(&self) -> usize {
        self.buckets.lock().await.by_key.len()
    }
}

#[async_trait]
impl RateLimitStore for TokenBucketStore {
    async fn acquire(&self, key: &str, limit: &RateLimitConfig) -> RateDecision {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;

        buckets.since_sweep += 1;
        if buckets.since_sweep >= self.sweep_interval {
            let evicted = buckets.sweep(limit, now);
            if evicted > 0 {
                debug!(evicted, remaining = buckets.by_key.len(), "토큰 버킷 정리");
            }
        }

        let bucket = buckets.by_key.entry(key.to_string()).or_insert_with(|| {
            debug!(key, average = limit.average, burst = limit.burst, "새 토큰 버킷 생성");
            TokenBucket::full(limit)
        });

        bucket.take(limit, now)
    }
}
