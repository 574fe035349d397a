use crate::middleware::client_ip::{peer_ip, request_ip};
use crate::middleware::{BaseMiddleware, Middleware, MiddlewareError, Outcome, Request};
use crate::session::SessionState;
use super::{config::RateLimitConfig, store::{RateDecision, RateLimitStore}};
use async_trait::async_trait;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use hyper::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 클라이언트별 Rate Limit 미들웨어
///
/// 세션이 있으면 세션 키로, 없으면 클라이언트 IP로 버킷을 나눕니다.
pub struct RateLimitMiddleware<S: RateLimitStore> {
    base: BaseMiddleware,
    store: Arc<S>,
}

impl<S: RateLimitStore> RateLimitMiddleware<S> {
    pub fn new(base: BaseMiddleware, store: Arc<S>) -> Self {
        Self { base, store }
    }

    /// 클라이언트 식별자를 추출합니다.
    ///
    /// 전달 헤더는 `trust_forwarded_headers`가 켜진 경우에만 봅니다.
    fn get_client_id(req: &Request, conf: &RateLimitConfig) -> String {
        if let Some(session) = SessionState::from_request(req) {
            return format!("key:{}", session.key_id);
        }
        let ip = if conf.trust_forwarded_headers {
            request_ip(req)
        } else {
            peer_ip(req)
        };
        format!("ip:{}", ip)
    }

    /// 429 응답에 붙일 헤더
    fn limit_headers(retry_after: Duration, config: &RateLimitConfig) -> HeaderMap {
        let retry_after = retry_after.as_secs_f64().ceil().max(1.0) as u64;

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-ratelimit-limit"), HeaderValue::from(config.average));
        headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
        headers
    }
}

#[async_trait]
impl<S: RateLimitStore + 'static> Middleware for RateLimitMiddleware<S> {
    type Config = RateLimitConfig;

    fn name(&self) -> &str {
        "RateLimit"
    }

    fn base(&self) -> &BaseMiddleware {
        &self.base
    }

    fn config(&self) -> Result<RateLimitConfig, MiddlewareError> {
        let config = self.base.spec().rate_limit.clone();
        config.validate().map_err(|e| MiddlewareError::config(self.name(), e))?;
        Ok(config)
    }

    fn is_enabled_for_spec(&self) -> bool {
        !self.base.spec().disable_rate_limit
    }

    async fn process_request(&self, req: &mut Request, conf: &RateLimitConfig) -> Outcome {
        let client_id = Self::get_client_id(req, conf);

        match self.store.acquire(&client_id, conf).await {
            RateDecision::Allowed { remaining } => {
                debug!(client = %client_id, remaining, "Rate limit 통과");
                Outcome::Continue
            }
            RateDecision::Limited { retry_after } => {
                debug!(client = %client_id, retry_after_ms = retry_after.as_millis() as u64, "Rate limit 초과");
                Outcome::reject_with_headers(
                    StatusCode::TOO_MANY_REQUESTS,
                    "Rate limit exceeded",
                    Self::limit_headers(retry_after, conf),
                )
            }
        }
    }
}
