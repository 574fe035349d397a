use super::client_ip::request_ip;
use super::Request;
use hyper::body::Body as _;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// 계측 이벤트에 첨부되는 요청 메타데이터
///
/// 요청마다, 미들웨어 호출마다 새로 만들어지며 요청 간에 공유되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMeta {
    fields: BTreeMap<&'static str, String>,
}

impl RequestMeta {
    pub fn from_request(req: &Request, mw_name: &str) -> Self {
        let size = req.body()
            .size_hint()
            .exact()
            .map(|n| n as i64)
            .unwrap_or(-1);

        let mut meta = Self::default();
        meta.insert("from_ip", request_ip(req));
        meta.insert("method", req.method().as_str());
        meta.insert("endpoint", req.uri().path());
        meta.insert("raw_url", req.uri().to_string());
        meta.insert("size", size.to_string());
        meta.insert("mw_name", mw_name);
        meta
    }

    pub fn insert(&mut self, key: &'static str, value: impl Into<String>) {
        self.fields.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// 계측 이벤트 수신자
///
/// 모든 요청 태스크에서 동시에 호출되므로 빠르게 반환해야 합니다.
pub trait Instrument: Send + Sync {
    fn event_kv(&self, job: &str, event: &str, meta: &RequestMeta);

    fn timing_kv(&self, job: &str, event: &str, nanos: u64, meta: &RequestMeta);
}

/// tracing 로그로 계측 이벤트를 남기는 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInstrument;

impl Instrument for TracingInstrument {
    fn event_kv(&self, job: &str, event: &str, meta: &RequestMeta) {
        trace!(job, event, meta = ?meta.fields, "instrument event");
    }

    fn timing_kv(&self, job: &str, event: &str, nanos: u64, meta: &RequestMeta) {
        debug!(job, event, nanos, meta = ?meta.fields, "instrument timing");
    }
}

/// 모든 이벤트를 버리는 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInstrument;

impl Instrument for NullInstrument {
    fn event_kv(&self, _job: &str, _event: &str, _meta: &RequestMeta) {}

    fn timing_kv(&self, _job: &str, _event: &str, _nanos: u64, _meta: &RequestMeta) {}
}
