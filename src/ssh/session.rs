// SSH会话管理：TCP 连接、认证、Connector
use crate::config::ConnectionConfig;
use crate::ssh::client::SshClient;
use crate::ssh::transport::Connector;
use crate::utils::error::{RaspinelError, Result};
use log::debug;
use ssh2::Session;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;

const DEFAULT_KEY_FILES: [&str; 3] = ["id_ed25519", "id_rsa", "id_ecdsa"];

/// Connects real SSH sessions through libssh2.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

impl Connector for SshConnector {
    type Transport = SshClient;

    fn connect(&self, config: &ConnectionConfig) -> Result<SshClient> {
        SshClient::connect(config)
    }
}

#[derive(Debug, Clone)]
pub enum AuthMethod {
    Password(String),
    /// SSH agent first, then the default identity files.
    Keys(Vec<PathBuf>),
}

impl AuthMethod {
    pub fn from_config(config: &ConnectionConfig) -> Self {
        match &config.password {
            Some(password) => AuthMethod::Password(password.clone()),
            None => AuthMethod::Keys(default_key_files()),
        }
    }

    pub fn authenticate(&self, session: &Session, username: &str) -> Result<()> {
        match self {
            AuthMethod::Password(password) => session
                .userauth_password(username, password)
                .map_err(|e| RaspinelError::connection(format!("Password authentication failed: {e}"))),
            AuthMethod::Keys(key_files) => {
                match session.userauth_agent(username) {
                    Ok(()) if session.authenticated() => return Ok(()),
                    Ok(()) => {}
                    Err(e) => debug!("SSH agent authentication failed: {}", e),
                }
                for key_path in key_files {
                    match session.userauth_pubkey_file(username, None, key_path, None) {
                        Ok(()) if session.authenticated() => return Ok(()),
                        Ok(()) => {}
                        Err(e) => debug!("Key {} rejected: {}", key_path.display(), e),
                    }
                }
                Err(RaspinelError::connection(format!(
                    "No password configured and no key accepted for {username}"
                )))
            }
        }
    }
}

fn default_key_files() -> Vec<PathBuf> {
    let Some(home) = home::home_dir() else {
        return Vec::new();
    };
    let ssh_dir = home.join(".ssh");
    DEFAULT_KEY_FILES
        .iter()
        .map(|name| ssh_dir.join(name))
        .filter(|path| path.exists())
        .collect()
}

/// Opens the TCP stream, bounded by the descriptor timeout.
pub(crate) fn open_tcp(config: &ConnectionConfig) -> Result<TcpStream> {
    let address = config.address();
    let addrs = (config.hostname.as_str(), config.port)
        .to_socket_addrs()
        .map_err(|e| RaspinelError::connection(format!("Cannot resolve {address}: {e}")))?;

    let mut last_error = None;
    for addr in addrs {
        let attempt = if config.timeout.is_zero() {
            TcpStream::connect(addr)
        } else {
            TcpStream::connect_timeout(&addr, config.timeout)
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Connecting to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(RaspinelError::connection(match last_error {
        Some(e) => format!("Failed to connect to {address}: {e}"),
        None => format!("No address found for {address}"),
    }))
}
