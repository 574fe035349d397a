mod common;

use async_trait::async_trait;
use bytes::Bytes;
use common::{body_string, request, MockUpstream};
use gateway_chain::api_spec::{ApiSpec, MiddlewareDefinition};
use gateway_chain::middleware::{
    DynamicHandler, DynamicRegistry, NullInstrument, Outcome, Request,
};
use gateway_chain::rate::RateCounter;
use gateway_chain::server::{Gateway, GatewayOptions};
use gateway_chain::session::SessionState;
use http_body_util::Full;
use hyper::StatusCode;
use std::sync::Arc;
use std::time::Duration;

/// 항상 성공하는 인증 단계
struct AuthUnit;

#[async_trait]
impl DynamicHandler for AuthUnit {
    async fn process(&self, req: &mut Request, _session: Option<&SessionState>) -> Outcome {
        SessionState::new("always-valid").attach(req);
        Outcome::Continue
    }
}

/// 윈도우 내 요청 수가 한도를 넘으면 429로 거부
struct QuotaUnit {
    counter: Arc<RateCounter>,
    limit: u64,
}

#[async_trait]
impl DynamicHandler for QuotaUnit {
    async fn process(&self, _req: &mut Request, session: Option<&SessionState>) -> Outcome {
        assert!(session.is_some());
        if self.counter.rate() > self.limit {
            return Outcome::reject(StatusCode::TOO_MANY_REQUESTS, "Quota exceeded");
        }
        Outcome::Continue
    }
}

/// 캐시에 있는 경로는 저장된 본문으로 바로 응답
struct CacheUnit;

#[async_trait]
impl DynamicHandler for CacheUnit {
    async fn process(&self, req: &mut Request, _session: Option<&SessionState>) -> Outcome {
        if req.uri().path() != "/cached/hit" {
            return Outcome::Continue;
        }

        let res = hyper::Response::builder()
            .status(StatusCode::OK)
            .header("x-cache", "HIT")
            .body(Full::new(Bytes::from_static(b"{\"cached\":true}")))
            .unwrap();
        Outcome::Handled(res)
    }
}

fn definition(name: &str, require_session: bool) -> MiddlewareDefinition {
    MiddlewareDefinition {
        name: name.to_string(),
        require_session,
    }
}

#[tokio::test]
async fn test_quota_rejects_request_over_threshold() {
    const LIMIT: u64 = 3;

    let counter = Arc::new(RateCounter::new(Duration::from_secs(60)));
    let mut registry = DynamicRegistry::new();
    registry.register("AuthUnit", Arc::new(AuthUnit));
    registry.register(
        "QuotaUnit",
        Arc::new(QuotaUnit {
            counter: counter.clone(),
            limit: LIMIT,
        }),
    );

    let upstream = Arc::new(MockUpstream::new("{}"));
    let mut gateway = Gateway::new(GatewayOptions {
        resolver: Arc::new(registry),
        instrument: Arc::new(NullInstrument),
        upstream: upstream.clone(),
        rate: counter.clone(),
        ..GatewayOptions::default()
    });

    let mut spec = ApiSpec::new("quota", "/quota", "http://127.0.0.1:9000");
    spec.disable_rate_limit = true;
    spec.custom_middleware.pre = vec![definition("AuthUnit", false)];
    spec.custom_middleware.post = vec![definition("QuotaUnit", true)];
    gateway.add_api(spec).unwrap();

    for _ in 0..LIMIT {
        let res = gateway.handle(request("GET", "/quota/items")).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
    assert_eq!(upstream.call_count(), LIMIT as usize);

    let res = gateway.handle(request("GET", "/quota/items")).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(body_string(res).await.contains("Quota exceeded"));
    assert_eq!(upstream.call_count(), LIMIT as usize);
    assert_eq!(counter.rate(), LIMIT + 1);
}

#[tokio::test]
async fn test_cache_hit_never_reaches_upstream() {
    let mut registry = DynamicRegistry::new();
    registry.register("CacheUnit", Arc::new(CacheUnit));

    let upstream = Arc::new(MockUpstream::new("{\"cached\":false}"));
    let mut gateway = Gateway::new(GatewayOptions {
        resolver: Arc::new(registry),
        instrument: Arc::new(NullInstrument),
        upstream: upstream.clone(),
        ..GatewayOptions::default()
    });

    let mut spec = ApiSpec::new("cached", "/cached", "http://127.0.0.1:9000");
    spec.disable_rate_limit = true;
    spec.custom_middleware.pre = vec![definition("CacheUnit", false)];
    gateway.add_api(spec).unwrap();

    let res = gateway.handle(request("GET", "/cached/hit")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-cache"], "HIT");
    assert_eq!(body_string(res).await, "{\"cached\":true}");
    assert_eq!(upstream.call_count(), 0);

    let res = gateway.handle(request("GET", "/cached/miss")).await;
    assert_eq!(body_string(res).await, "{\"cached\":false}");
    assert_eq!(upstream.call_count(), 1);
}

#[tokio::test]
async fn test_unknown_dynamic_middleware_fails_assembly() {
    let mut gateway = Gateway::new(GatewayOptions {
        upstream: Arc::new(MockUpstream::new("{}")),
        ..GatewayOptions::default()
    });

    let mut spec = ApiSpec::new("broken", "/broken", "http://127.0.0.1:9000");
    spec.custom_middleware.pre = vec![definition("NoSuchUnit", false)];

    assert!(gateway.add_api(spec).is_err());
    assert!(gateway.routes().is_empty());
}
