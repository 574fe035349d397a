use std::path::Path;
use std::time::Duration;

use time::macros::format_description;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{fmt::time::UtcTime, EnvFilter};

use crate::settings::{LogFormat, LogOutput, LogSettings};

pub type InitError = Box<dyn std::error::Error + Send + Sync>;

/// 전역 tracing 구독자를 설정합니다.
///
/// 반환된 가드는 프로세스 종료 시까지 유지해야 버퍼된 로그가 유실되지 않습니다.
pub fn init_logging(settings: &LogSettings) -> Result<WorkerGuard, InitError> {
    let crate_directive = format!("gateway_chain={}", settings.level.as_str().to_lowercase()).parse::<Directive>()?;
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(settings.level).into())
        .from_env_lossy()
        .add_directive(crate_directive);

    let (writer, guard) = match &settings.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::File(path) => {
            let path = Path::new(path);
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| format!("로그 파일 이름이 없습니다: {}", path.display()))?;
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name))
        }
    };

    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true);

    match settings.format {
        LogFormat::Text => builder.try_init()?,
        LogFormat::Json => builder.json().try_init()?,
    }

    Ok(guard)
}

/// 게이트웨이를 통과한 요청 한 건의 접근 로그
#[derive(Debug)]
pub struct RequestLog {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub api_id: Option<String>,
    pub status_code: u16,
    pub duration: Duration,
    pub error: Option<String>,
}

impl RequestLog {
    pub fn new<B>(req: &hyper::Request<B>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            api_id: None,
            status_code: 0,
            duration: Duration::ZERO,
            error: None,
        }
    }

    pub fn with_api(&mut self, api_id: &str) {
        self.api_id = Some(api_id.to_string());
    }

    pub fn with_response(&mut self, status: hyper::StatusCode) {
        self.status_code = status.as_u16();
    }

    pub fn with_error(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }
}

pub fn log_request(log: &RequestLog) {
    let duration_ms = log.duration.as_millis() as u64;

    if let Some(err) = &log.error {
        error!(
            request_id = %log.request_id,
            method = %log.method,
            path = %log.path,
            api_id = ?log.api_id,
            status = log.status_code,
            duration_ms,
            error = %err,
            "요청 처리 실패"
        );
    } else if log.status_code >= 400 {
        warn!(
            request_id = %log.request_id,
            method = %log.method,
            path = %log.path,
            api_id = ?log.api_id,
            status = log.status_code,
            duration_ms,
            "요청 거부"
        );
    } else {
        info!(
            request_id = %log.request_id,
            method = %log.method,
            path = %log.path,
            api_id = ?log.api_id,
            status = log.status_code,
            duration_ms,
            "요청 완료"
        );
    }
}
