
#[derive(Debug, thiserror::Error)]
pub enum MiddlewareError {
    #[error("미들웨어 {middleware} 초기화 실패: {message}")]
    Init {
        middleware: String,
        message: String,
    },

    #[error("미들웨어 {middleware} 설정 오류: {message}")]
    Config {
        middleware: String,
        message: String,
    },

    #[error("동적 미들웨어 클래스를 찾을 수 없음: {0}")]
    UnknownDynamic(String),

    #[error("응답 핸들러 {handler} 실행 실패: {message}")]
    Response {
        handler: String,
        message: String,
    },
}

impl MiddlewareError {
    pub fn config(middleware: impl Into<String>, message: impl ToString) -> Self {
        MiddlewareError::Config {
            middleware: middleware.into(),
            message: message.to_string(),
        }
    }

    pub fn response(handler: impl Into<String>, message: impl ToString) -> Self {
        MiddlewareError::Response {
            handler: handler.into(),
            message: message.to_string(),
        }
    }
}
