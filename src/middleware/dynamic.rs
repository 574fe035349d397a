//! 이름으로 연결되는 동적 미들웨어
//!
//! 운영자가 게이트웨이의 정적 체인을 고치지 않고 외부에서 정의한 처리 로직을
//! 붙일 수 있게 합니다. 클래스 이름을 실제 로직으로 바꾸는 방법(스크립트 런타임 등)은
//! [`DynamicResolver`] 구현체가 결정합니다.

use super::{BaseMiddleware, Middleware, MiddlewareError, Outcome, Request};
use crate::session::SessionState;
use async_trait::async_trait;
use hyper::StatusCode;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 외부에서 정의된 요청 처리 로직
#[async_trait]
pub trait DynamicHandler: Send + Sync {
    /// `session`은 미들웨어가 세션을 요구할 때만 전달됩니다.
    async fn process(&self, req: &mut Request, session: Option<&SessionState>) -> Outcome;
}

/// 클래스 이름을 처리 로직으로 해석합니다.
pub trait DynamicResolver: Send + Sync {
    fn resolve(&self, class_name: &str) -> Option<Arc<dyn DynamicHandler>>;
}

/// 메모리 기반 동적 미들웨어 저장소
#[derive(Default, Clone)]
pub struct DynamicRegistry {
    handlers: HashMap<String, Arc<dyn DynamicHandler>>,
}

impl DynamicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 같은 이름으로 다시 등록하면 이전 핸들러를 교체합니다.
    pub fn register(&mut self, class_name: impl Into<String>, handler: Arc<dyn DynamicHandler>) {
        self.handlers.insert(class_name.into(), handler);
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.handlers.contains_key(class_name)
    }
}

impl DynamicResolver for DynamicRegistry {
    fn resolve(&self, class_name: &str) -> Option<Arc<dyn DynamicHandler>> {
        self.handlers.get(class_name).cloned()
    }
}

impl fmt::Debug for DynamicRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// 조립 시점에 클래스 이름으로 로직이 결정되는 미들웨어
pub struct DynamicMiddleware {
    base: BaseMiddleware,
    class_name: String,
    pre: bool,
    use_session: bool,
    resolver: Arc<dyn DynamicResolver>,
}

impl DynamicMiddleware {
    pub fn new(
        class_name: impl Into<String>,
        pre: bool,
        use_session: bool,
        base: BaseMiddleware,
        resolver: Arc<dyn DynamicResolver>,
    ) -> Self {
        Self {
            base,
            class_name: class_name.into(),
            pre,
            use_session,
            resolver,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// 정적 체인 앞에 붙는지 여부
    pub fn is_pre(&self) -> bool {
        self.pre
    }

    pub fn uses_session(&self) -> bool {
        self.use_session
    }
}

#[async_trait]
impl Middleware for DynamicMiddleware {
    type Config = Arc<dyn DynamicHandler>;

    fn name(&self) -> &str {
        "DynamicMiddleware"
    }

    fn base(&self) -> &BaseMiddleware {
        &self.base
    }

    fn config(&self) -> Result<Self::Config, MiddlewareError> {
        debug!(
            class = %self.class_name,
            pre = self.pre,
            use_session = self.use_session,
            "동적 미들웨어 해석"
        );
        self.resolver
            .resolve(&self.class_name)
            .ok_or_else(|| MiddlewareError::UnknownDynamic(self.class_name.clone()))
    }

    fn is_enabled_for_spec(&self) -> bool {
        true
    }

    async fn process_request(&self, req: &mut Request, handler: &Self::Config) -> Outcome {
        if !self.use_session {
            return handler.process(req, None).await;
        }

        let Some(session) = SessionState::from_request(req).cloned() else {
            return Outcome::reject(StatusCode::FORBIDDEN, "Session state is missing or unset");
        };
        handler.process(req, Some(&session)).await
    }
}
