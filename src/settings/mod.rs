use std::{collections::HashSet, env, path::Path};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::api_spec::ApiSpec;

mod server;
pub mod logging;
mod error;

pub use server::ServerSettings;
pub use logging::{LogFormat, LogOutput, LogSettings};
pub use error::SettingsError;

pub type Result<T> = std::result::Result<T, SettingsError>;
pub use server::parse_env_var;

/// 설정 파일 경로를 지정하는 환경 변수
pub const CONFIG_FILE_ENV: &str = "GATEWAY_CONFIG_FILE";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    // 서버 설정
    #[serde(default)]
    pub server: ServerSettings,

    // 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,

    /// 서비스할 API 정의 목록
    #[serde(default)]
    pub apis: Vec<ApiSpec>,
}

impl Settings {
    pub async fn load() -> Result<Self> {
        if let Ok(config_path) = env::var(CONFIG_FILE_ENV) {
            Self::from_toml_file(&config_path).await
        } else {
            Self::from_env()
        }
    }

    pub async fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| SettingsError::FileError {
            path: path.as_ref().to_string_lossy().to_string(),
            error: e,
        })?;

        let settings = Self::from_toml_str(&content)?;
        info!(
            path = %path.as_ref().display(),
            apis = settings.apis.len(),
            "설정 파일 로드 완료"
        );
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| SettingsError::ParseError { source: e })?;

        settings.validate()?;
        Ok(settings)
    }

    /// 환경 변수만으로 설정을 구성합니다. API 정의는 비어 있습니다.
    pub fn from_env() -> Result<Self> {
        let settings = Self {
            server: ServerSettings::from_env()?,
            logging: LogSettings::from_env()?,
            apis: Vec::new(),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// 설정 유효성 검증
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;

        let mut listen_paths = HashSet::new();
        let mut api_ids = HashSet::new();

        for api in &self.apis {
            let invalid = |reason: String| SettingsError::InvalidApi {
                api_id: api.api_id.clone(),
                reason,
            };

            if api.api_id.is_empty() {
                return Err(invalid("api_id가 비어 있습니다".to_string()));
            }
            if !api_ids.insert(api.api_id.as_str()) {
                return Err(invalid("api_id 중복".to_string()));
            }
            if !api.listen_path.starts_with('/') {
                return Err(invalid(format!("listen_path는 '/'로 시작해야 합니다: {}", api.listen_path)));
            }
            if !listen_paths.insert(normalize_listen_path(&api.listen_path)) {
                return Err(SettingsError::DuplicateListenPath(api.listen_path.clone()));
            }

            let target = Url::parse(&api.target_url)
                .map_err(|e| invalid(format!("target_url 파싱 실패 ({}): {}", api.target_url, e)))?;
            if !matches!(target.scheme(), "http") {
                return Err(invalid(format!("지원하지 않는 업스트림 스킴: {}", target.scheme())));
            }

            api.rate_limit.validate().map_err(invalid)?;
            debug!(api_id = %api.api_id, listen_path = %api.listen_path, "API 설정 검증 완료");
        }

        Ok(())
    }
}

/// 끝의 '/'를 제거한 listen_path. 루트는 빈 문자열이 됩니다.
pub fn normalize_listen_path(path: &str) -> &str {
    path.trim_end_matches('/')
}
