use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Basic 인증 자격증명 소스
///
/// ```toml
/// [basic_auth]
/// realm = "Restricted Area"
/// source = "inline"
///
/// [basic_auth.users]
/// admin = "$2y$05$..."
/// ```
///
/// ```toml
/// [basic_auth]
/// source = { htpasswd_file = "/etc/gateway/.htpasswd" }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthSource {
    /// API 정의의 `users`에서 직접 설정
    #[default]
    Inline,
    /// .htpasswd 파일
    HtpasswdFile(String),
}

/// Basic 인증 설정
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicAuthConfig {
    /// 사용자 이름과 bcrypt 해시 맵
    #[serde(default)]
    pub users: HashMap<String, String>,

    /// 인증 영역 (realm)
    #[serde(default = "default_realm")]
    pub realm: String,

    /// 인증 소스
    #[serde(default)]
    pub source: AuthSource,
}

fn default_realm() -> String {
    "Restricted Area".to_string()
}

impl Default for BasicAuthConfig {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            realm: default_realm(),
            source: AuthSource::default(),
        }
    }
}
