//! API 게이트웨이 미들웨어 파이프라인
//!
//! API 정의마다 요청 미들웨어 체인과 응답 핸들러 체인을 조립하고,
//! 체인을 통과한 요청만 업스트림으로 전달합니다.
//!
//! # 주요 기능
//!
//! - 순서가 보장되는 요청 미들웨어 체인 ([`middleware::MiddlewareChain`])
//! - 이름으로 연결되는 동적 미들웨어 ([`middleware::DynamicRegistry`])
//! - 업스트림 응답을 가공하는 응답 핸들러 ([`middleware::ResponseChain`])
//! - 미들웨어 호출 계측과 전체 요청량 카운터 ([`rate::RateCounter`])
//!
//! # 예제
//!
//! ```
//! use gateway_chain::api_spec::ApiSpec;
//! use gateway_chain::server::{Gateway, GatewayOptions};
//!
//! let mut spec = ApiSpec::new("orders", "/orders", "http://127.0.0.1:9000");
//! spec.disable_rate_limit = true;
//!
//! let mut gateway = Gateway::new(GatewayOptions::default());
//! gateway.add_api(spec).unwrap();
//! assert!(gateway.find_route("/orders/42").is_some());
//! assert!(gateway.find_route("/ordersx").is_none());
//! ```

pub mod api_spec;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod rate;
pub mod server;
pub mod session;
pub mod settings;
