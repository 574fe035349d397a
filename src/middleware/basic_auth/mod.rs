//! Basic 인증 미들웨어
//!
//! 인증에 성공한 요청에는 사용자 이름을 키로 하는 세션이 붙습니다.

mod auth;
mod config;
mod middleware;

pub use auth::{create_authenticator, Authenticator, CredentialTable};
pub use config::{AuthSource, BasicAuthConfig};
pub use middleware::BasicAuthMiddleware;
