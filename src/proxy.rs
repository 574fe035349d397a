use async_trait::async_trait;
use http_body_util::BodyExt;
use hyper::header::HOST;
use hyper::Uri;
use hyper_util::client::legacy;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use http_body_util::Full;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::api_spec::ApiSpec;
use crate::middleware::{Body, Request, Response};
use crate::settings::normalize_listen_path;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("잘못된 업스트림 주소 {target}: {message}")]
    InvalidTarget { target: String, message: String },

    #[error("업스트림 요청 실패: {0}")]
    Upstream(#[from] legacy::Error),

    #[error("업스트림 응답 본문 수신 실패: {0}")]
    Body(#[from] hyper::Error),
}

/// 체인을 통과한 요청을 API의 업스트림으로 전달합니다.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn forward(&self, spec: &ApiSpec, req: Request) -> Result<Response, ProxyError>;
}

/// hyper 클라이언트 기반 HTTP 업스트림
#[derive(Clone)]
pub struct HttpUpstream {
    client: legacy::Client<HttpConnector, Body>,
}

impl HttpUpstream {
    pub fn new() -> Self {
        let connector = HttpConnector::new();
        let client = legacy::Client::builder(TokioExecutor::new())
            .build::<_, Body>(connector);

        Self { client }
    }
}

impl Default for HttpUpstream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn forward(&self, spec: &ApiSpec, req: Request) -> Result<Response, ProxyError> {
        let uri = upstream_uri(spec, req.uri())?;
        debug!(api_id = %spec.api_id, upstream = %uri, "업스트림 요청 전달");

        let (mut parts, body) = req.into_parts();
        parts.uri = uri;
        parts.headers.remove(HOST);

        let res = self.client.request(hyper::Request::from_parts(parts, body)).await?;
        let (parts, body) = res.into_parts();
        let bytes = body.collect().await?.to_bytes();

        Ok(Response::from_parts(parts, Full::new(bytes)))
    }
}

/// listen_path를 떼어낸 경로를 target_url 뒤에 붙인 업스트림 URI를 만듭니다.
pub fn upstream_uri(spec: &ApiSpec, uri: &Uri) -> Result<Uri, ProxyError> {
    let invalid = |message: String| ProxyError::InvalidTarget {
        target: spec.target_url.clone(),
        message,
    };

    let target = Url::parse(&spec.target_url).map_err(|e| invalid(e.to_string()))?;
    let host = target.host_str().ok_or_else(|| invalid("호스트가 없습니다".to_string()))?;

    let path = uri.path();
    let rest = path
        .strip_prefix(normalize_listen_path(&spec.listen_path))
        .unwrap_or(path);
    let rest = rest.trim_start_matches('/');

    let mut full = format!("{}://{}", target.scheme(), host);
    if let Some(port) = target.port() {
        full.push_str(&format!(":{}", port));
    }
    full.push_str(target.path().trim_end_matches('/'));
    full.push('/');
    full.push_str(rest);
    if let Some(query) = uri.query() {
        full.push('?');
        full.push_str(query);
    }

    full.parse().map_err(|e: hyper::http::uri::InvalidUri| invalid(e.to_string()))
}
