use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use tracing::{debug, error, info, instrument, warn};

use crate::api_spec::{ApiSpec, MiddlewareDefinition};
use crate::logging::{log_request, RequestLog};
use crate::middleware::basic_auth::BasicAuthMiddleware;
use crate::middleware::client_ip::ClientAddr;
use crate::middleware::rate_limit::{RateLimitMiddleware, TokenBucketStore};
use crate::middleware::{
    error_response, BaseMiddleware, DefaultErrorHandler, DynamicRegistry, DynamicResolver,
    ErrorHandler, Instrument, MiddlewareChain, MiddlewareError, Request, Response, ResponseChain,
    TracingInstrument,
};
use crate::proxy::{HttpUpstream, Upstream};
use crate::rate::RateCounter;
use crate::session::SessionState;
use crate::settings::{normalize_listen_path, Settings};

/// 게이트웨이 조립에 필요한 협력자
#[derive(Clone)]
pub struct GatewayOptions {
    pub resolver: Arc<dyn DynamicResolver>,
    pub instrument: Arc<dyn Instrument>,
    pub error_handler: Arc<dyn ErrorHandler>,
    pub upstream: Arc<dyn Upstream>,
    /// 전체 요청량 카운터. 모든 요청 태스크가 공유합니다.
    pub rate: Arc<RateCounter>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            resolver: Arc::new(DynamicRegistry::new()),
            instrument: Arc::new(TracingInstrument),
            error_handler: Arc::new(DefaultErrorHandler),
            upstream: Arc::new(HttpUpstream::new()),
            rate: Arc::new(RateCounter::default()),
        }
    }
}

/// API 정의 하나와 그에 맞춰 조립된 요청/응답 체인
pub struct ApiRoute {
    spec: Arc<ApiSpec>,
    chain: MiddlewareChain,
    response_chain: ResponseChain,
}

impl ApiRoute {
    /// 체인 조립 순서: 앞쪽 동적 미들웨어, BasicAuth, RateLimit, 뒤쪽 동적 미들웨어
    pub fn assemble(spec: ApiSpec, options: &GatewayOptions) -> Result<Self, MiddlewareError> {
        let spec = Arc::new(spec);
        let base = BaseMiddleware::new(spec.clone());

        let mut chain = MiddlewareChain::new()
            .with_instrument(options.instrument.clone())
            .with_error_handler(options.error_handler.clone());

        append_dynamic_all(&mut chain, &spec.custom_middleware.pre, true, &base, options)?;
        chain.append_middleware(BasicAuthMiddleware::new(base.clone()))?;
        chain.append_middleware(RateLimitMiddleware::new(
            base.clone(),
            Arc::new(TokenBucketStore::new()),
        ))?;
        append_dynamic_all(&mut chain, &spec.custom_middleware.post, false, &base, options)?;

        let response_chain = ResponseChain::from_spec(&spec)?;

        info!(
            api_id = %spec.api_id,
            listen_path = %spec.listen_path,
            middlewares = ?chain.names(),
            response_handlers = response_chain.len(),
            "API 체인 조립 완료"
        );

        Ok(Self {
            spec,
            chain,
            response_chain,
        })
    }

    pub fn spec(&self) -> &ApiSpec {
        &self.spec
    }

    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    pub fn response_chain(&self) -> &ResponseChain {
        &self.response_chain
    }

    /// 경로가 listen_path 아래에 있는지 확인합니다. 세그먼트 경계에서만 일치합니다.
    fn matches(&self, path: &str) -> bool {
        let prefix = normalize_listen_path(&self.spec.listen_path);
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.is_empty(),
            None => false,
        }
    }
}

fn append_dynamic_all(
    chain: &mut MiddlewareChain,
    definitions: &[MiddlewareDefinition],
    is_pre: bool,
    base: &BaseMiddleware,
    options: &GatewayOptions,
) -> Result<(), MiddlewareError> {
    for def in definitions {
        chain.append_dynamic(&def.name, is_pre, def.require_session, base.clone(), options.resolver.clone())?;
    }
    Ok(())
}

/// 응답 체인에 넘길 요청 사본. 본문은 업스트림으로 넘어가므로 비웁니다.
fn request_head(req: &Request) -> Request {
    let mut head = Request::default();
    *head.method_mut() = req.method().clone();
    *head.uri_mut() = req.uri().clone();
    *head.version_mut() = req.version();
    *head.headers_mut() = req.headers().clone();
    *head.extensions_mut() = req.extensions().clone();
    head
}

/// 요청을 API별 체인에 태우고 업스트림으로 전달하는 게이트웨이
pub struct Gateway {
    routes: Vec<ApiRoute>,
    options: GatewayOptions,
}

impl Gateway {
    pub fn new(options: GatewayOptions) -> Self {
        Self {
            routes: Vec::new(),
            options,
        }
    }

    /// 설정의 모든 API를 조립합니다. 하나라도 실패하면 게이트웨이를 만들지 않습니다.
    pub fn from_settings(settings: &Settings, options: GatewayOptions) -> Result<Self, MiddlewareError> {
        let mut gateway = Self::new(options);
        for spec in &settings.apis {
            gateway.add_api(spec.clone())?;
        }
        Ok(gateway)
    }

    pub fn add_api(&mut self, spec: ApiSpec) -> Result<(), MiddlewareError> {
        let route = ApiRoute::assemble(spec, &self.options)?;
        self.routes.push(route);
        // 긴 listen_path가 먼저 검사되도록 정렬
        self.routes.sort_by(|a, b| {
            normalize_listen_path(&b.spec.listen_path)
                .len()
                .cmp(&normalize_listen_path(&a.spec.listen_path).len())
        });
        Ok(())
    }

    pub fn routes(&self) -> &[ApiRoute] {
        &self.routes
    }

    pub fn rate(&self) -> &Arc<RateCounter> {
        &self.options.rate
    }

    pub fn find_route(&self, path: &str) -> Option<&ApiRoute> {
        self.routes.iter().find(|route| route.matches(path))
    }

    #[instrument(skip_all, fields(method = %req.method(), path = %req.uri().path()))]
    pub async fn handle(&self, req: Request) -> Response {
        let started = Instant::now();
        let mut log = RequestLog::new(&req);
        self.options.rate.incr(1);

        let response = match self.find_route(req.uri().path()) {
            Some(route) => {
                log.with_api(&route.spec.api_id);
                let log = &mut log;
                route
                    .chain
                    .handle(req, move |req| self.forward(route, req, log))
                    .await
            }
            None => error_response(StatusCode::NOT_FOUND, "No API is listening on this path"),
        };

        log.with_response(response.status());
        log.duration = started.elapsed();
        log_request(&log);
        response
    }

    /// 체인을 통과한 요청을 업스트림으로 보내고 응답 체인을 적용합니다.
    async fn forward(&self, route: &ApiRoute, req: Request, log: &mut RequestLog) -> Response {
        let head = request_head(&req);

        let mut res = match self.options.upstream.forward(&route.spec, req).await {
            Ok(res) => res,
            Err(e) => {
                error!(api_id = %route.spec.api_id, error = %e, "업스트림 요청 실패");
                log.with_error(&e);
                return error_response(StatusCode::BAD_GATEWAY, "There was a problem proxying the request");
            }
        };

        let session = SessionState::from_request(&head);
        if let Err(e) = route.response_chain.handle(&mut res, &head, session).await {
            error!(api_id = %route.spec.api_id, error = %e, "응답 핸들러 실패");
            log.with_error(&e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "There was a problem processing the response");
        }

        debug!(api_id = %route.spec.api_id, status = res.status().as_u16(), "업스트림 응답 처리 완료");
        res
    }

    /// 수신한 요청의 본문을 모두 읽은 뒤 파이프라인에 넘깁니다.
    pub async fn handle_incoming(
        &self,
        req: hyper::Request<Incoming>,
        remote: SocketAddr,
    ) -> Result<Response, Infallible> {
        let (parts, body) = req.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!(error = %e, remote = %remote, "요청 본문 수신 실패");
                return Ok(error_response(StatusCode::BAD_REQUEST, "Failed to read request body"));
            }
        };

        let mut req = Request::from_parts(parts, Full::new(bytes));
        req.extensions_mut().insert(ClientAddr(remote));
        Ok(self.handle(req).await)
    }

    pub async fn handle_connection<I>(&self, io: I, remote: SocketAddr) -> Result<(), hyper::Error>
    where
        I: hyper::rt::Read + hyper::rt::Write + Send + Unpin + 'static,
    {
        http1::Builder::new()
            .serve_connection(io, service_fn(|req| self.handle_incoming(req, remote)))
            .await
    }
}
