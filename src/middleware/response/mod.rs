//! 업스트림 응답 처리
//!
//! 응답 핸들러는 이름으로 등록되어 있으며, API 정의의 `response_processors`
//! 순서대로 실행됩니다.

mod body_transform;
mod header_injector;
mod header_transform;

pub use body_transform::ResponseTransformMiddleware;
pub use header_injector::HeaderInjector;
pub use header_transform::HeaderTransform;

use super::{MiddlewareError, Request, Response};
use crate::api_spec::ApiSpec;
use crate::session::SessionState;
use async_trait::async_trait;
use tracing::{debug, warn};

/// 응답 핸들러 트레이트
#[async_trait]
pub trait ResponseHandler: Send + Sync {
    fn name(&self) -> &str;

    /// 핸들러 옵션과 API 정의로 초기화합니다. 체인 조립 시 한 번 호출됩니다.
    fn init(&mut self, options: &serde_json::Value, spec: &ApiSpec) -> Result<(), MiddlewareError>;

    /// 업스트림 응답을 처리합니다.
    async fn handle_response(
        &self,
        res: &mut Response,
        req: &Request,
        session: Option<&SessionState>,
    ) -> Result<(), MiddlewareError>;
}

/// 이름에 해당하는 응답 핸들러를 생성합니다.
///
/// 등록되지 않은 이름은 에러가 아니라 `None`입니다. 호출자는 건너뛰어야 합니다.
pub fn response_processor_by_name(name: &str) -> Option<Box<dyn ResponseHandler>> {
    match name {
        "header_injector" => Some(Box::new(HeaderInjector::default())),
        "response_body_transform" => Some(Box::new(ResponseTransformMiddleware::default())),
        "header_transform" => Some(Box::new(HeaderTransform::default())),
        _ => None,
    }
}

/// 응답 핸들러를 순서대로 실행합니다.
///
/// 첫 번째 실패에서 중단하고 그 에러를 반환합니다. 이미 적용된 변경은 되돌리지 않으므로
/// 실패한 응답은 클라이언트에 전달하면 안 됩니다.
pub async fn handle_response_chain(
    chain: &[Box<dyn ResponseHandler>],
    res: &mut Response,
    req: &Request,
    session: Option<&SessionState>,
) -> Result<(), MiddlewareError> {
    for handler in chain {
        debug!(handler = handler.name(), "응답 핸들러 실행");
        handler.handle_response(res, req, session).await?;
    }
    Ok(())
}

/// API 정의 하나에 대해 조립된 응답 핸들러 목록
#[derive(Default)]
pub struct ResponseChain {
    handlers: Vec<Box<dyn ResponseHandler>>,
}

impl ResponseChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// API 정의의 `response_processors`로 체인을 조립합니다.
    pub fn from_spec(spec: &ApiSpec) -> Result<Self, MiddlewareError> {
        let mut chain = Self::new();

        for processor in &spec.response_processors {
            let Some(mut handler) = response_processor_by_name(&processor.name) else {
                warn!(
                    api_id = %spec.api_id,
                    name = %processor.name,
                    "알 수 없는 응답 핸들러, 건너뜀"
                );
                continue;
            };

            handler.init(&processor.options, spec)?;
            chain.push(handler);
        }

        Ok(chain)
    }

    pub fn push(&mut self, handler: Box<dyn ResponseHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub async fn handle(
        &self,
        res: &mut Response,
        req: &Request,
        session: Option<&SessionState>,
    ) -> Result<(), MiddlewareError> {
        handle_response_chain(&self.handlers, res, req, session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_spec::ResponseProcessorConfig;
    use bytes::Bytes;
    use http_body_util::Full;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// 실행 순서를 기록하고 필요하면 실패하는 핸들러
    struct Recorder {
        name: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl ResponseHandler for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn init(&mut self, _options: &serde_json::Value, _spec: &ApiSpec) -> Result<(), MiddlewareError> {
            Ok(())
        }

        async fn handle_response(
            &self,
            res: &mut Response,
            _req: &Request,
            _session: Option<&SessionState>,
        ) -> Result<(), MiddlewareError> {
            self.log.lock().push(self.name);
            res.headers_mut().append("x-handled-by", self.name.parse().unwrap());
            if self.fail {
                return Err(MiddlewareError::response(self.name, "boom"));
            }
            Ok(())
        }
    }

    fn recorder(name: &'static str, fail: bool, log: &Arc<Mutex<Vec<&'static str>>>) -> Box<dyn ResponseHandler> {
        Box::new(Recorder { name, fail, log: log.clone() })
    }

    fn empty_request() -> Request {
        hyper::Request::new(Full::new(Bytes::new()))
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = vec![recorder("a", false, &log), recorder("b", true, &log), recorder("c", false, &log)];

        let mut res = hyper::Response::new(Full::new(Bytes::new()));
        let err = handle_response_chain(&chain, &mut res, &empty_request(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, MiddlewareError::Response { ref handler, .. } if handler == "b"));
        assert_eq!(*log.lock(), vec!["a", "b"]);
        // 적용된 변경은 되돌리지 않음
        assert_eq!(res.headers().get_all("x-handled-by").iter().count(), 2);
    }

    #[tokio::test]
    async fn test_chain_runs_all_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = vec![recorder("a", false, &log), recorder("b", false, &log)];

        let mut res = hyper::Response::new(Full::new(Bytes::new()));
        handle_response_chain(&chain, &mut res, &empty_request(), None).await.unwrap();
        assert_eq!(*log.lock(), vec!["a", "b"]);
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(response_processor_by_name("header_injector").unwrap().name(), "header_injector");
        assert_eq!(
            response_processor_by_name("response_body_transform").unwrap().name(),
            "response_body_transform"
        );
        assert_eq!(response_processor_by_name("header_transform").unwrap().name(), "header_transform");
        assert!(response_processor_by_name("gzip").is_none());
        assert!(response_processor_by_name("").is_none());
    }

    #[test]
    fn test_from_spec_skips_unknown_names() {
        let mut spec = ApiSpec::new("api", "/", "http://127.0.0.1:9000");
        spec.response_processors = vec![
            ResponseProcessorConfig {
                name: "does_not_exist".to_string(),
                options: serde_json::Value::Null,
            },
            ResponseProcessorConfig {
                name: "header_injector".to_string(),
                options: serde_json::json!({ "add_headers": { "X-Test": "1" } }),
            },
        ];

        let chain = ResponseChain::from_spec(&spec).unwrap();
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_from_spec_fails_on_bad_options() {
        let mut spec = ApiSpec::new("api", "/", "http://127.0.0.1:9000");
        spec.response_processors = vec![ResponseProcessorConfig {
            name: "header_injector".to_string(),
            options: serde_json::json!({ "add_headers": ["not", "a", "map"] }),
        }];

        assert!(matches!(
            ResponseChain::from_spec(&spec),
            Err(MiddlewareError::Config { .. })
        ));
    }
}
