use super::ResponseHandler;
use crate::api_spec::ApiSpec;
use crate::middleware::{MiddlewareError, Request, Response};
use crate::session::SessionState;
use async_trait::async_trait;
use hyper::header::{HeaderName, HeaderValue};
use serde::Deserialize;
use std::collections::HashMap;

const NAME: &str = "header_injector";

/// 응답 헤더 수정 설정
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeaderInjectorOptions {
    /// 추가하거나 덮어쓸 헤더
    pub add_headers: HashMap<String, String>,

    /// 삭제할 헤더
    pub delete_headers: Vec<String>,
}

/// 업스트림 응답 헤더를 삭제/추가하는 응답 핸들러
#[derive(Debug, Default)]
pub struct HeaderInjector {
    add: Vec<(HeaderName, HeaderValue)>,
    delete: Vec<HeaderName>,
}

#[async_trait]
impl ResponseHandler for HeaderInjector {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self, options: &serde_json::Value, _spec: &ApiSpec) -> Result<(), MiddlewareError> {
        let options: HeaderInjectorOptions = if options.is_null() {
            HeaderInjectorOptions::default()
        } else {
            serde_json::from_value(options.clone()).map_err(|e| MiddlewareError::config(NAME, e))?
        };

        // 헤더 이름/값은 조립 시점에 검증
        self.delete = options.delete_headers.iter()
            .map(|name| HeaderName::from_bytes(name.as_bytes()))
            .collect::<Result<_, _>>()
            .map_err(|e| MiddlewareError::config(NAME, e))?;

        self.add = options.add_headers.iter()
            .map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| MiddlewareError::config(NAME, e))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| MiddlewareError::config(NAME, e))?;
                Ok((name, value))
            })
            .collect::<Result<_, MiddlewareError>>()?;

        Ok(())
    }

    async fn handle_response(
        &self,
        res: &mut Response,
        _req: &Request,
        _session: Option<&SessionState>,
    ) -> Result<(), MiddlewareError> {
        let headers = res.headers_mut();
        for name in &self.delete {
            headers.remove(name);
        }
        for (name, value) in &self.add {
            headers.insert(name.clone(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;

    #[tokio::test]
    async fn test_injects_and_deletes_headers() {
        let mut injector = HeaderInjector::default();
        injector
            .init(
                &serde_json::json!({
                    "add_headers": { "X-Served-By": "gateway" },
                    "delete_headers": ["Server"]
                }),
                &ApiSpec::default(),
            )
            .unwrap();

        let mut res = hyper::Response::builder()
            .header("server", "nginx")
            .header("x-served-by", "upstream")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let req = hyper::Request::new(Full::new(Bytes::new()));

        injector.handle_response(&mut res, &req, None).await.unwrap();

        assert!(res.headers().get("server").is_none());
        assert_eq!(res.headers()["x-served-by"], "gateway");
    }

    #[test]
    fn test_invalid_header_name_fails_init() {
        let mut injector = HeaderInjector::default();
        let result = injector.init(
            &serde_json::json!({ "add_headers": { "bad header": "v" } }),
            &ApiSpec::default(),
        );
        assert!(matches!(result, Err(MiddlewareError::Config { .. })));
    }

    #[test]
    fn test_null_options_are_empty() {
        let mut injector = HeaderInjector::default();
        injector.init(&serde_json::Value::Null, &ApiSpec::default()).unwrap();
        assert!(injector.add.is_empty());
        assert!(injector.delete.is_empty());
    }
}
