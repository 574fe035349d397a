use serde::{Deserialize, Serialize};

use crate::middleware::basic_auth::BasicAuthConfig;
use crate::middleware::rate_limit::RateLimitConfig;

/// 게이트웨이가 서비스하는 API 정의
///
/// 미들웨어는 `BaseMiddleware`를 통해 이 정의를 읽기 전용으로 공유합니다.
/// 체인 조립 이후에는 변경되지 않습니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSpec {
    /// API 고유 ID
    pub api_id: String,

    /// 표시용 이름
    pub name: String,

    /// 게이트웨이에서 이 API가 노출되는 경로 접두사
    pub listen_path: String,

    /// 업스트림 대상 URL
    pub target_url: String,

    pub cors: CorsSettings,

    /// Basic 인증 사용 여부
    pub use_basic_auth: bool,

    pub basic_auth: BasicAuthConfig,

    /// 클라이언트별 Rate Limit 비활성화
    pub disable_rate_limit: bool,

    pub rate_limit: RateLimitConfig,

    /// 이름으로 연결되는 외부 정의 미들웨어
    pub custom_middleware: CustomMiddleware,

    /// 업스트림 응답에 적용할 응답 핸들러 목록 (순서대로 실행)
    pub response_processors: Vec<ResponseProcessorConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// OPTIONS 요청을 미들웨어 처리 없이 다음 단계로 넘김
    pub options_passthrough: bool,
}

/// 체인 앞/뒤에 붙는 동적 미들웨어 목록
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomMiddleware {
    pub pre: Vec<MiddlewareDefinition>,
    pub post: Vec<MiddlewareDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiddlewareDefinition {
    /// 동적 미들웨어 클래스 이름
    pub name: String,

    #[serde(default)]
    pub require_session: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseProcessorConfig {
    /// 등록된 응답 핸들러 이름 (`header_injector` 등)
    pub name: String,

    #[serde(default)]
    pub options: serde_json::Value,
}

impl ApiSpec {
    pub fn new(api_id: impl Into<String>, listen_path: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            listen_path: listen_path.into(),
            target_url: target_url.into(),
            ..Default::default()
        }
    }
}
