use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 인증된 요청의 세션 상태
///
/// 인증 미들웨어가 요청 extensions에 붙이고, 이후 미들웨어와 응답 핸들러가 읽습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub key_id: String,
    pub org_id: String,

    /// 허용 요청 수 (per 초 당)
    pub rate: f64,
    pub per: f64,

    /// -1이면 무제한
    pub quota_max: i64,

    pub meta_data: HashMap<String, serde_json::Value>,
}

impl SessionState {
    pub fn new(key_id: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            quota_max: -1,
            ..Default::default()
        }
    }

    /// 요청에 붙은 세션을 조회합니다.
    pub fn from_request<B>(req: &hyper::Request<B>) -> Option<&SessionState> {
        req.extensions().get::<SessionState>()
    }

    /// 세션을 요청에 붙입니다. 기존 세션은 교체됩니다.
    pub fn attach<B>(self, req: &mut hyper::Request<B>) {
        req.extensions_mut().insert(self);
    }
}
