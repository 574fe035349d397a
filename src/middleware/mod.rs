//! 요청/응답 미들웨어 파이프라인
//!
//! 요청 미들웨어는 [`MiddlewareChain`]에 조립 순서대로 실행되고,
//! 업스트림 응답은 [`ResponseChain`]을 거쳐 클라이언트로 전달됩니다.

pub mod base;
pub mod basic_auth;
pub mod chain;
pub mod client_ip;
pub mod dynamic;
pub mod error;
pub mod error_handler;
pub mod instrument;
pub mod rate_limit;
pub mod response;
pub mod traits;

use bytes::Bytes;
use http_body_util::Full;

/// 파이프라인 전체에서 사용하는 본문 타입
pub type Body = Full<Bytes>;
pub type Request = hyper::Request<Body>;
pub type Response = hyper::Response<Body>;

pub use base::BaseMiddleware;
pub use chain::{ChainOutcome, MiddlewareChain};
pub use dynamic::{DynamicHandler, DynamicMiddleware, DynamicRegistry, DynamicResolver};
pub use error::MiddlewareError;
pub use error_handler::{error_response, DefaultErrorHandler, ErrorHandler};
pub use instrument::{Instrument, NullInstrument, RequestMeta, TracingInstrument};
pub use response::{handle_response_chain, response_processor_by_name, ResponseChain, ResponseHandler};
pub use traits::{Middleware, Outcome};
