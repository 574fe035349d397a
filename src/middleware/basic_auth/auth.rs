use std::collections::HashMap;
use std::fs;
use tracing::{debug, warn};

use crate::middleware::MiddlewareError;
use super::config::{AuthSource, BasicAuthConfig};

/// 사용자 이름과 비밀번호를 검증합니다.
pub trait Authenticator: Send + Sync {
    fn verify_credentials(&self, username: &str, password: &str) -> bool;
}

/// 사용자 이름과 bcrypt 해시로 이루어진 자격증명 표
///
/// bcrypt (`$2a$`, `$2b$`, `$2y$`) 외의 해시는 로드 시점에 버립니다.
#[derive(Debug, Default)]
pub struct CredentialTable {
    users: HashMap<String, String>,
}

impl CredentialTable {
    pub fn from_users(users: &HashMap<String, String>) -> Self {
        let mut table = Self::default();
        for (user, hash) in users {
            table.insert(user, hash, "inline");
        }
        table
    }

    /// `.htpasswd` 형식 (`user:hash`, `#` 주석) 을 읽습니다.
    pub fn from_htpasswd(content: &str) -> Self {
        let mut table = Self::default();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once(':') {
                Some((user, hash)) => table.insert(user, hash, "htpasswd"),
                None => warn!(line = line_no + 1, "htpasswd 형식이 아닌 줄 무시"),
            }
        }
        table
    }

    fn insert(&mut self, user: &str, hash: &str, source: &str) {
        if !is_bcrypt(hash) {
            warn!(user, source, "bcrypt가 아닌 해시는 지원하지 않습니다");
            return;
        }
        self.users.insert(user.to_string(), hash.to_string());
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Authenticator for CredentialTable {
    fn verify_credentials(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|hash| bcrypt::verify(password, hash).unwrap_or(false))
    }
}

fn is_bcrypt(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"].iter().any(|prefix| hash.starts_with(prefix))
}

/// 설정의 자격증명 소스로 인증기를 만듭니다. 파일을 읽지 못하면 초기화 에러입니다.
pub fn create_authenticator(config: &BasicAuthConfig) -> Result<Box<dyn Authenticator>, MiddlewareError> {
    let table = match &config.source {
        AuthSource::Inline => CredentialTable::from_users(&config.users),
        AuthSource::HtpasswdFile(path) => {
            let content = fs::read_to_string(path).map_err(|e| MiddlewareError::Init {
                middleware: "BasicAuth".to_string(),
                message: format!("htpasswd 파일 읽기 실패 {}: {}", path, e),
            })?;
            CredentialTable::from_htpasswd(&content)
        }
    };

    debug!(users = table.len(), realm = %config.realm, "Basic 인증 사용자 로드");
    Ok(Box::new(table))
}
