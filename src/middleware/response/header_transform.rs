use super::ResponseHandler;
use crate::api_spec::ApiSpec;
use crate::middleware::{MiddlewareError, Request, Response};
use crate::session::SessionState;
use async_trait::async_trait;
use hyper::header::{HeaderName, HeaderValue};
use serde::Deserialize;
use tracing::debug;
use url::Url;

const NAME: &str = "header_transform";

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderTransformOptions {
    pub rev_proxy_header_cleanup: RevProxyTransform,
}

/// 업스트림 주소가 담긴 헤더를 게이트웨이 주소로 되돌리는 설정
#[derive(Debug, Clone, Deserialize)]
pub struct RevProxyTransform {
    /// 검사할 헤더 (기본값: Location)
    #[serde(default = "default_headers")]
    pub headers: Vec<String>,

    /// 클라이언트가 보는 게이트웨이 주소 (예: `https://api.example.com`)
    pub target_host: String,
}

fn default_headers() -> Vec<String> {
    vec!["Location".to_string()]
}

/// `Location` 같은 응답 헤더의 업스트림 주소를 게이트웨이 주소로 바꾸는 응답 핸들러
#[derive(Debug, Default)]
pub struct HeaderTransform {
    headers: Vec<HeaderName>,
    upstream: Option<Url>,
    public: Option<Url>,
    listen_path: String,
}

impl HeaderTransform {
    /// 업스트림을 가리키는 URL이면 게이트웨이 주소로 바꾼 값을 반환합니다.
    fn rewrite(&self, value: &str) -> Option<String> {
        let (upstream, public) = (self.upstream.as_ref()?, self.public.as_ref()?);
        let mut url = Url::parse(value).ok()?;

        if url.host_str() != upstream.host_str()
            || url.port_or_known_default() != upstream.port_or_known_default()
        {
            return None;
        }

        let path = self.rewrite_path(upstream, url.path())?;
        url.set_scheme(public.scheme()).ok()?;
        url.set_host(public.host_str()).ok()?;
        url.set_port(public.port()).ok()?;
        url.set_path(&path);
        Some(url.to_string())
    }

    fn rewrite_path(&self, upstream: &Url, path: &str) -> Option<String> {
        let prefix = upstream.path().trim_end_matches('/');
        let rest = path.strip_prefix(prefix)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }

        let rewritten = format!("{}{}", self.listen_path.trim_end_matches('/'), rest);
        if rewritten.is_empty() {
            Some("/".to_string())
        } else {
            Some(rewritten)
        }
    }
}

#[async_trait]
impl ResponseHandler for HeaderTransform {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self, options: &serde_json::Value, spec: &ApiSpec) -> Result<(), MiddlewareError> {
        let options: HeaderTransformOptions =
            serde_json::from_value(options.clone()).map_err(|e| MiddlewareError::config(NAME, e))?;
        let transform = options.rev_proxy_header_cleanup;

        self.headers = transform.headers.iter()
            .map(|name| HeaderName::from_bytes(name.as_bytes()))
            .collect::<Result<_, _>>()
            .map_err(|e| MiddlewareError::config(NAME, e))?;
        self.upstream = Some(
            Url::parse(&spec.target_url)
                .map_err(|e| MiddlewareError::config(NAME, format!("target_url: {}", e)))?,
        );
        self.public = Some(
            Url::parse(&transform.target_host)
                .map_err(|e| MiddlewareError::config(NAME, format!("target_host: {}", e)))?,
        );
        self.listen_path = spec.listen_path.clone();
        Ok(())
    }

    async fn handle_response(
        &self,
        res: &mut Response,
        _req: &Request,
        _session: Option<&SessionState>,
    ) -> Result<(), MiddlewareError> {
        for name in &self.headers {
            let Some(original) = res.headers().get(name).and_then(|v| v.to_str().ok()) else {
                continue;
            };
            let Some(rewritten) = self.rewrite(original) else {
                continue;
            };

            debug!(header = %name, from = %original, to = %rewritten, "응답 헤더 주소 변환");
            let value = HeaderValue::from_str(&rewritten)
                .map_err(|e| MiddlewareError::response(NAME, e))?;
            res.headers_mut().insert(name.clone(), value);
        }
        Ok(())
    }
}
