use crate::middleware::{BaseMiddleware, Middleware, MiddlewareError, Outcome, Request};
use crate::session::SessionState;
use super::auth::{create_authenticator, Authenticator};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::StatusCode;
use tracing::{debug, warn};

/// 조립 시점에 준비되는 Basic 인증 설정
pub struct BasicAuthState {
    realm: String,
    authenticator: Box<dyn Authenticator>,
}

/// Basic 인증 미들웨어
///
/// 인증에 성공하면 사용자 이름을 키로 하는 세션을 요청에 붙입니다.
pub struct BasicAuthMiddleware {
    base: BaseMiddleware,
}

impl BasicAuthMiddleware {
    pub fn new(base: BaseMiddleware) -> Self {
        Self { base }
    }

    /// Authorization 헤더에서 자격증명을 추출합니다.
    fn extract_credentials(req: &Request) -> Option<(String, String)> {
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|auth| auth.strip_prefix("Basic "))
            .and_then(|credentials| BASE64.decode(credentials.trim()).ok())
            .and_then(|decoded| String::from_utf8(decoded).ok())
            .and_then(|pair| {
                let (user, password) = pair.split_once(':')?;
                Some((user.to_string(), password.to_string()))
            })
    }

    /// 401 응답에 붙일 인증 요구 헤더
    fn challenge_headers(realm: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm)) {
            Ok(value) => {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
            Err(e) => warn!(realm, error = %e, "realm을 헤더 값으로 쓸 수 없습니다"),
        }
        headers
    }
}

#[async_trait]
impl Middleware for BasicAuthMiddleware {
    type Config = BasicAuthState;

    fn name(&self) -> &str {
        "BasicAuth"
    }

    fn base(&self) -> &BaseMiddleware {
        &self.base
    }

    fn config(&self) -> Result<BasicAuthState, MiddlewareError> {
        let config = &self.base.spec().basic_auth;
        Ok(BasicAuthState {
            realm: config.realm.clone(),
            authenticator: create_authenticator(config)?,
        })
    }

    fn is_enabled_for_spec(&self) -> bool {
        self.base.spec().use_basic_auth
    }

    async fn process_request(&self, req: &mut Request, conf: &BasicAuthState) -> Outcome {
        let Some((username, password)) = Self::extract_credentials(req) else {
            return Outcome::reject_with_headers(
                StatusCode::UNAUTHORIZED,
                "Authorization field missing",
                Self::challenge_headers(&conf.realm),
            );
        };

        if !conf.authenticator.verify_credentials(&username, &password) {
            debug!(user = %username, "Basic 인증 실패");
            return Outcome::reject(StatusCode::UNAUTHORIZED, "User not authorised");
        }

        SessionState::new(username).attach(req);
        Outcome::Continue
    }
}
