use crate::api_spec::ApiSpec;
use std::sync::Arc;

/// 모든 미들웨어가 공유하는 API 정의 컨텍스트
#[derive(Debug, Clone)]
pub struct BaseMiddleware {
    spec: Arc<ApiSpec>,
}

impl BaseMiddleware {
    pub fn new(spec: Arc<ApiSpec>) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &ApiSpec {
        &self.spec
    }

    /// OPTIONS 요청을 미들웨어 처리 없이 통과시킬지 여부
    pub fn options_passthrough(&self) -> bool {
        self.spec.cors.options_passthrough
    }
}
