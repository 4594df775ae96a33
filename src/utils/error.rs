use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RaspinelError>;

#[derive(Error, Debug)]
pub enum RaspinelError {
    #[error("No hostname configured: set RASPINEL_HOSTNAME or add `hostname` to a .raspinel.yml (searched: {searched})")]
    MissingHost { searched: String },

    #[error("Malformed configuration in {origin}: {reason}")]
    MalformedConfig { origin: String, reason: String },

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Transfer failed for {path}: {reason}")]
    Transfer { path: String, reason: String },

    #[error("Invalid format for {what}, got {got:?}")]
    Parse { what: String, got: String },

    #[error("Client is closed")]
    ClosedClient,

    #[error("Invalid exit code {0}")]
    ExitCode(i32),

    #[error("Invalid command template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("{what} already exists")]
    AlreadyExists { what: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RaspinelError {
    pub fn connection(message: impl Into<String>) -> Self {
        RaspinelError::Connection {
            message: message.into(),
        }
    }

    pub fn transfer(path: impl Into<String>, reason: impl ToString) -> Self {
        RaspinelError::Transfer {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(what: impl Into<String>, got: impl Into<String>) -> Self {
        RaspinelError::Parse {
            what: what.into(),
            got: got.into(),
        }
    }

    pub(crate) fn malformed(origin: impl Into<String>, reason: impl ToString) -> Self {
        RaspinelError::MalformedConfig {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn missing_host(searched: &[PathBuf]) -> Self {
        let searched = searched
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        RaspinelError::MissingHost { searched }
    }

    /// 远程命令的退出码（ExitCode 错误时）
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RaspinelError::ExitCode(code) => Some(*code),
            _ => None,
        }
    }
}
