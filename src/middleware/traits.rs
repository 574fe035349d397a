use super::{BaseMiddleware, MiddlewareError, Request, Response};
use async_trait::async_trait;
use hyper::{HeaderMap, StatusCode};

/// 미들웨어 한 단계의 처리 결과
#[derive(Debug)]
pub enum Outcome {
    /// 다음 미들웨어로 진행
    Continue,

    /// 요청 거부. 에러 핸들러가 응답을 작성하고 체인은 여기서 종료됩니다.
    /// `headers`는 에러 핸들러가 만든 응답에 덧붙습니다.
    Reject {
        status: StatusCode,
        message: String,
        headers: HeaderMap,
    },

    /// 미들웨어가 클라이언트 응답을 직접 만들었음. 이후 미들웨어와 업스트림은 실행되지 않습니다.
    Handled(Response),
}

impl Outcome {
    pub fn reject(status: StatusCode, message: impl Into<String>) -> Self {
        Self::reject_with_headers(status, message, HeaderMap::new())
    }

    /// `Retry-After`, `WWW-Authenticate`처럼 거부 응답에 필요한 헤더를 함께 전달합니다.
    pub fn reject_with_headers(status: StatusCode, message: impl Into<String>, headers: HeaderMap) -> Self {
        Outcome::Reject {
            status,
            message: message.into(),
            headers,
        }
    }
}

/// 미들웨어 트레이트
///
/// 체인 조립 시 한 번 `init`과 `config`가 호출되고, 이후 요청마다
/// `process_request`가 같은 설정 스냅샷으로 호출됩니다.
/// 인스턴스는 모든 동시 요청이 공유하므로 요청별 상태를 필드에 두면 안 됩니다.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// `config`가 만들어 내는 불변 설정
    type Config: Send + Sync + 'static;

    /// 계측 이벤트 이름에 쓰이는 고유 이름
    fn name(&self) -> &str;

    /// 소속 API 정의에 대한 공통 컨텍스트
    fn base(&self) -> &BaseMiddleware;

    /// 일회성 초기화. 실패하면 체인을 조립할 수 없습니다.
    fn init(&mut self) -> Result<(), MiddlewareError> {
        Ok(())
    }

    /// 설정을 생성하고 검증합니다. 실패하면 체인을 조립할 수 없습니다.
    fn config(&self) -> Result<Self::Config, MiddlewareError>;

    /// 이 API 정의에서 활성화되어 있는지 여부. 조립 시 한 번만 평가됩니다.
    fn is_enabled_for_spec(&self) -> bool;

    /// 요청을 처리합니다.
    async fn process_request(&self, req: &mut Request, conf: &Self::Config) -> Outcome;
}
