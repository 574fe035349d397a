use super::{
    DefaultErrorHandler, ErrorHandler, Instrument, Middleware, MiddlewareError, Outcome, Request,
    RequestMeta, Response, TracingInstrument,
};
use super::dynamic::{DynamicMiddleware, DynamicResolver};
use super::BaseMiddleware;
use async_trait::async_trait;
use hyper::Method;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// 미들웨어 호출 계측 job 이름
pub const MIDDLEWARE_JOB: &str = "MiddlewareCall";

/// 체인 실행 결과
#[derive(Debug)]
pub enum ChainOutcome {
    /// 모든 미들웨어를 통과. 업스트림으로 전달할 요청
    Forward(Request),

    /// 체인이 중단되고 클라이언트에 보낼 응답이 결정됨
    Respond(Response),
}

/// 한 단계 실행 후 다음 단계로 진행할지 여부
enum Step {
    Next,
    Stop(Response),
}

/// 체인 링크가 공유하는 협력자
#[derive(Clone)]
struct ChainHooks {
    instrument: Arc<dyn Instrument>,
    error_handler: Arc<dyn ErrorHandler>,
}

#[async_trait]
trait ChainLink: Send + Sync {
    fn name(&self) -> &str;

    async fn call(&self, req: &mut Request, hooks: &ChainHooks) -> Step;
}

/// 미들웨어와 조립 시점에 만든 설정을 묶은 체인 링크
struct MiddlewareFrame<M: Middleware> {
    middleware: M,
    conf: M::Config,
    executed_event: String,
    timing_event: String,
}

impl<M: Middleware> MiddlewareFrame<M> {
    fn emit_timing(&self, hooks: &ChainHooks, started: Instant, meta: &RequestMeta) {
        let nanos = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        hooks.instrument.timing_kv(MIDDLEWARE_JOB, "exec_time", nanos, meta);
        hooks.instrument.timing_kv(MIDDLEWARE_JOB, &self.timing_event, nanos, meta);
    }
}

#[async_trait]
impl<M: Middleware> ChainLink for MiddlewareFrame<M> {
    fn name(&self) -> &str {
        self.middleware.name()
    }

    async fn call(&self, req: &mut Request, hooks: &ChainHooks) -> Step {
        let mut meta = RequestMeta::from_request(req, self.middleware.name());
        hooks.instrument.event_kv(MIDDLEWARE_JOB, "executed", &meta);
        hooks.instrument.event_kv(MIDDLEWARE_JOB, &self.executed_event, &meta);
        let started = Instant::now();

        if self.middleware.base().options_passthrough() && req.method() == Method::OPTIONS {
            return Step::Next;
        }

        let step = match self.middleware.process_request(req, &self.conf).await {
            Outcome::Reject { status, message, headers } => {
                debug!(
                    middleware = self.middleware.name(),
                    status = status.as_u16(),
                    error = %message,
                    "미들웨어가 요청을 거부"
                );
                let mut response = hooks.error_handler.handle_error(req, &message, status);
                response.headers_mut().extend(headers);
                meta.insert("error", message);
                Step::Stop(response)
            }
            Outcome::Continue => {
                meta.insert("bypass", "1");
                Step::Next
            }
            Outcome::Handled(response) => {
                debug!(middleware = self.middleware.name(), "미들웨어가 응답을 직접 작성");
                Step::Stop(response)
            }
        };

        self.emit_timing(hooks, started, &meta);
        step
    }
}

/// 요청 미들웨어 체인
///
/// 조립은 트래픽을 받기 전에 한 번 끝나야 하며, 이후에는 `Arc`로 공유되는
/// 읽기 전용 구조입니다. 실행기는 링크를 순서대로 돌며 각 단계 후 계속 진행할지 확인합니다.
#[derive(Clone)]
pub struct MiddlewareChain {
    links: Vec<Arc<dyn ChainLink>>,
    hooks: ChainHooks,
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            hooks: ChainHooks {
                instrument: Arc::new(TracingInstrument),
                error_handler: Arc::new(DefaultErrorHandler),
            },
        }
    }

    pub fn with_instrument(mut self, instrument: Arc<dyn Instrument>) -> Self {
        self.hooks.instrument = instrument;
        self
    }

    pub fn with_error_handler(mut self, error_handler: Arc<dyn ErrorHandler>) -> Self {
        self.hooks.error_handler = error_handler;
        self
    }

    /// 미들웨어를 체인 끝에 추가합니다.
    ///
    /// 이 API 정의에서 비활성화된 미들웨어는 초기화하지 않고 건너뛰며 `Ok(false)`를 반환합니다.
    /// 초기화나 설정 생성에 실패하면 체인을 사용할 수 없으므로 에러를 그대로 반환합니다.
    pub fn append_middleware<M: Middleware>(&mut self, mut middleware: M) -> Result<bool, MiddlewareError> {
        if !middleware.is_enabled_for_spec() {
            debug!(middleware = middleware.name(), "비활성화된 미들웨어 건너뜀");
            return Ok(false);
        }

        middleware.init()?;
        let conf = middleware.config()?;

        let name = middleware.name().to_string();
        info!(middleware = %name, position = self.links.len(), "미들웨어 추가");

        self.links.push(Arc::new(MiddlewareFrame {
            executed_event: format!("{}.executed", name),
            timing_event: format!("{}.exec_time", name),
            middleware,
            conf,
        }));
        Ok(true)
    }

    /// 이름으로 해석되는 동적 미들웨어를 추가합니다.
    pub fn append_dynamic(
        &mut self,
        class_name: &str,
        is_pre: bool,
        use_session: bool,
        base: BaseMiddleware,
        resolver: Arc<dyn DynamicResolver>,
    ) -> Result<bool, MiddlewareError> {
        self.append_middleware(DynamicMiddleware::new(class_name, is_pre, use_session, base, resolver))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// 조립된 순서대로 미들웨어 이름을 반환합니다.
    pub fn names(&self) -> Vec<&str> {
        self.links.iter().map(|link| link.name()).collect()
    }

    /// 요청을 체인에 통과시킵니다.
    pub async fn execute(&self, mut req: Request) -> ChainOutcome {
        for link in &self.links {
            match link.call(&mut req, &self.hooks).await {
                Step::Next => continue,
                Step::Stop(response) => return ChainOutcome::Respond(response),
            }
        }
        ChainOutcome::Forward(req)
    }

    /// 체인을 실행하고, 모두 통과하면 `terminal`을 정확히 한 번 호출합니다.
    pub async fn handle<F, Fut>(&self, req: Request, terminal: F) -> Response
    where
        F: FnOnce(Request) -> Fut + Send,
        Fut: Future<Output = Response> + Send,
    {
        match self.execute(req).await {
            ChainOutcome::Forward(req) => terminal(req).await,
            ChainOutcome::Respond(response) => response,
        }
    }
}
