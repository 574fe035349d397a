use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use super::SettingsError;

#[derive(Clone, Debug, Deserialize)]
pub struct ServerSettings {
    /// 리스닝 주소 (기본값: 0.0.0.0:8080)
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T, SettingsError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: "".to_string(),
            reason: e.to_string(),
        }),
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let settings = Self {
            listen_addr: parse_env_var("GATEWAY_LISTEN_ADDR", default_listen_addr)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.listen_addr.parse().map_err(|e: std::net::AddrParseError| SettingsError::EnvVarInvalid {
            var_name: "server.listen_addr".to_string(),
            value: self.listen_addr.clone(),
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.socket_addr().map(|_| ())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}
