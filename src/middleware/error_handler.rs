use super::{Request, Response};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::CONTENT_TYPE;
use hyper::StatusCode;
use tracing::warn;

/// 미들웨어가 거부한 요청에 대한 HTTP 응답을 작성합니다.
///
/// 체인은 언제 호출할지만 결정하고, 응답 형식은 구현체가 정합니다.
pub trait ErrorHandler: Send + Sync {
    fn handle_error(&self, req: &Request, message: &str, status: StatusCode) -> Response;
}

/// `{"error": "..."}` JSON 본문으로 응답하는 기본 에러 핸들러
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle_error(&self, req: &Request, message: &str, status: StatusCode) -> Response {
        warn!(
            method = %req.method(),
            path = %req.uri().path(),
            status = status.as_u16(),
            error = %message,
            "요청 거부"
        );
        error_response(status, message)
    }
}

/// JSON 에러 응답을 생성합니다.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string();

    hyper::Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| {
            let mut res = hyper::Response::new(Full::new(Bytes::from("Internal Server Error")));
            *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            res
        })
}
