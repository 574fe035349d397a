use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// 윈도우를 나누는 기본 버킷 수
const DEFAULT_BUCKETS: usize = 10;

/// 최근 요청량을 세는 슬라이딩 윈도우 카운터
///
/// 윈도우를 고정 개수의 버킷으로 나누어 보관합니다. 윈도우를 벗어난 버킷은
/// 별도의 정리 작업 없이 다음 `incr`/`rate` 호출 시점에 비워집니다.
///
/// 모든 요청 태스크가 `Arc<RateCounter>`를 공유하며, 내부 잠금으로
/// 동시 증가 시에도 카운트가 유실되지 않습니다.
#[derive(Debug)]
pub struct RateCounter {
    window: Duration,
    resolution_nanos: u128,
    state: Mutex<Buckets>,
}

#[derive(Debug)]
struct Buckets {
    counts: Vec<u64>,
    /// 마지막으로 기록된 틱 (origin 기준 resolution 단위)
    head: u64,
    origin: Instant,
}

impl Buckets {
    /// 현재 시각까지 틱을 전진시키고 만료된 버킷을 비웁니다.
    fn advance(&mut self, now: Instant, resolution_nanos: u128) {
        let elapsed = now.saturating_duration_since(self.origin).as_nanos();
        let tick = u64::try_from(elapsed / resolution_nanos).unwrap_or(u64::MAX);
        if tick <= self.head {
            return;
        }

        let len = self.counts.len() as u64;
        let stale = (tick - self.head).min(len);
        for step in 1..=stale {
            let idx = ((self.head + step) % len) as usize;
            self.counts[idx] = 0;
        }
        self.head = tick;
    }

    fn current(&mut self) -> &mut u64 {
        let idx = (self.head % self.counts.len() as u64) as usize;
        &mut self.counts[idx]
    }
}

impl RateCounter {
    /// 주어진 윈도우 길이로 카운터를 생성합니다.
    pub fn new(window: Duration) -> Self {
        Self::with_buckets(window, DEFAULT_BUCKETS)
    }

    /// 버킷 수를 직접 지정해 카운터를 생성합니다.
    ///
    /// 버킷이 많을수록 만료 시점이 정확해집니다.
    pub fn with_buckets(window: Duration, buckets: usize) -> Self {
        let buckets = buckets.max(1);
        let resolution_nanos = (window.as_nanos() / buckets as u128).max(1);

        Self {
            window,
            resolution_nanos,
            state: Mutex::new(Buckets {
                counts: vec![0; buckets],
                head: 0,
                origin: Instant::now(),
            }),
        }
    }

    /// 현재 버킷에 `n`을 더합니다.
    pub fn incr(&self, n: u64) {
        let mut state = self.state.lock();
        state.advance(Instant::now(), self.resolution_nanos);
        *state.current() += n;
    }

    /// 윈도우 안에 기록된 요청 수를 반환합니다.
    pub fn rate(&self) -> u64 {
        let mut state = self.state.lock();
        state.advance(Instant::now(), self.resolution_nanos);
        state.counts.iter().sum()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for RateCounter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
