//! Rate Limiting 미들웨어
//!
//! 클라이언트별 요청 속도를 제한하는 미들웨어를 제공합니다.

mod config;
pub mod store;
mod middleware;

pub use config::RateLimitConfig;
pub use middleware::RateLimitMiddleware;
pub use store::{RateDecision, RateLimitStore, TokenBucketStore};
