#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use gateway_chain::api_spec::ApiSpec;
use gateway_chain::middleware::{Request, Response};
use gateway_chain::proxy::{upstream_uri, ProxyError, Upstream};
use http_body_util::{BodyExt, Full};
use hyper::header::HeaderMap;
use hyper::StatusCode;
use parking_lot::Mutex;

/// 업스트림에 도착한 요청 기록
#[derive(Debug, Clone)]
pub struct ForwardedCall {
    pub api_id: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// 고정 응답을 돌려주고 호출을 기록하는 업스트림
pub struct MockUpstream {
    pub calls: Mutex<Vec<ForwardedCall>>,
    status: StatusCode,
    body: String,
    fail: bool,
}

impl MockUpstream {
    pub fn new(body: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            status: StatusCode::OK,
            body: body.to_string(),
            fail: false,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn last_call(&self) -> Option<ForwardedCall> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn forward(&self, spec: &ApiSpec, req: Request) -> Result<Response, ProxyError> {
        let uri = upstream_uri(spec, req.uri())?;
        let (parts, body) = req.into_parts();
        let body = body.collect().await.map(|c| c.to_bytes()).unwrap_or_default();

        self.calls.lock().push(ForwardedCall {
            api_id: spec.api_id.clone(),
            uri: uri.to_string(),
            headers: parts.headers,
            body,
        });

        if self.fail {
            return Err(ProxyError::InvalidTarget {
                target: spec.target_url.clone(),
                message: "connection refused".to_string(),
            });
        }

        Ok(hyper::Response::builder()
            .status(self.status)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(self.body.clone())))
            .unwrap())
    }
}

pub fn request(method: &str, uri: &str) -> Request {
    hyper::Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

pub async fn body_string(res: Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
