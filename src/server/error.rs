use crate::middleware::MiddlewareError;
use crate::settings::SettingsError;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    ConfigError(SettingsError),
    AssemblyError(MiddlewareError),
    IoError(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<SettingsError> for Error {
    fn from(err: SettingsError) -> Self {
        Error::ConfigError(err)
    }
}

impl From<MiddlewareError> for Error {
    fn from(err: MiddlewareError) -> Self {
        Error::AssemblyError(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigError(e) => write!(f, "Config Error: {}", e),
            Error::AssemblyError(e) => write!(f, "Chain Assembly Error: {}", e),
            Error::IoError(e) => write!(f, "IO Error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ConfigError(e) => Some(e),
            Error::AssemblyError(e) => Some(e),
            Error::IoError(e) => Some(e),
        }
    }
}
