use super::ResponseHandler;
use crate::api_spec::ApiSpec;
use crate::middleware::{MiddlewareError, Request, Response};
use crate::session::SessionState;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderValue, CONTENT_LENGTH};
use regex_lite::{Captures, Regex};
use serde::Deserialize;
use serde_json::Value;

const NAME: &str = "response_body_transform";

#[derive(Debug, Clone, Deserialize)]
pub struct BodyTransformOptions {
    /// `{{ .field }}` 자리표시자를 포함한 출력 템플릿
    pub template: String,
}

/// JSON 응답 본문을 템플릿으로 다시 작성하는 응답 핸들러
///
/// 자리표시자는 점으로 구분된 경로(`{{ .user.name }}`)로 JSON 값을 찾습니다.
/// 문자열은 따옴표 없이, 그 외 값은 JSON 표기 그대로, 없는 값은 빈 문자열로 채웁니다.
#[derive(Debug, Default)]
pub struct ResponseTransformMiddleware {
    template: String,
    placeholder: Option<Regex>,
}

impl ResponseTransformMiddleware {
    fn render(&self, data: &Value) -> Result<String, MiddlewareError> {
        let placeholder = self.placeholder.as_ref()
            .ok_or_else(|| MiddlewareError::response(NAME, "handler is not initialised"))?;

        let rendered = placeholder.replace_all(&self.template, |caps: &Captures<'_>| {
            let found = caps[1]
                .split('.')
                .filter(|segment| !segment.is_empty())
                .try_fold(data, |value, segment| value.get(segment));

            match found {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }
        });
        Ok(rendered.into_owned())
    }
}

#[async_trait]
impl ResponseHandler for ResponseTransformMiddleware {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self, options: &serde_json::Value, _spec: &ApiSpec) -> Result<(), MiddlewareError> {
        let options: BodyTransformOptions =
            serde_json::from_value(options.clone()).map_err(|e| MiddlewareError::config(NAME, e))?;

        self.placeholder = Some(
            Regex::new(r"\{\{\s*\.([A-Za-z0-9_.\-]*)\s*\}\}").map_err(|e| MiddlewareError::config(NAME, e))?,
        );
        self.template = options.template;
        Ok(())
    }

    async fn handle_response(
        &self,
        res: &mut Response,
        _req: &Request,
        _session: Option<&SessionState>,
    ) -> Result<(), MiddlewareError> {
        let body = std::mem::take(res.body_mut());
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        let data: Value = match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(e) => {
                *res.body_mut() = Full::new(bytes);
                return Err(MiddlewareError::response(NAME, format!("본문이 JSON이 아닙니다: {}", e)));
            }
        };

        let rendered = Bytes::from(self.render(&data)?);
        res.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(rendered.len()));
        *res.body_mut() = Full::new(rendered);
        Ok(())
    }
}
