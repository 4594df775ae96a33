// SSH客户端封装
use crate::config::ConnectionConfig;
use crate::ssh::session::{open_tcp, AuthMethod};
use crate::ssh::transport::{CommandTransport, ExecOutput, FileTransport, Transport};
use crate::transfer::{self, resolve_remote_path, Downloaded, TransferProgress, Uploaded};
use crate::utils::error::{RaspinelError, Result};
use log::{debug, warn};
use ssh2::{Session, Sftp};
use std::io::Read;
use std::path::Path;

pub struct SshClient {
    session: Session,
    sftp: Option<Sftp>,
    remote_home: Option<String>,
}

impl SshClient {
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        debug!("Connecting to {}...", config.address());
        let tcp = open_tcp(config)?;

        let mut session = Session::new()
            .map_err(|e| RaspinelError::connection(format!("Failed to create SSH session: {e}")))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(config.timeout.as_millis()).unwrap_or(u32::MAX));
        session
            .handshake()
            .map_err(|e| RaspinelError::connection(format!("SSH handshake failed: {e}")))?;

        AuthMethod::from_config(config).authenticate(&session, &config.username)?;

        if !session.authenticated() {
            return Err(RaspinelError::connection(format!(
                "Authentication failed for {config}"
            )));
        }

        // 超时只限制连接阶段，之后的命令不设上限
        session.set_timeout(0);

        debug!("Authenticated as {}", config);
        Ok(SshClient {
            session,
            sftp: None,
            remote_home: None,
        })
    }

    fn sftp(&mut self) -> Result<&Sftp> {
        if self.sftp.is_none() {
            let sftp = self
                .session
                .sftp()
                .map_err(|e| RaspinelError::connection(format!("Failed to create SFTP session: {e}")))?;
            self.sftp = Some(sftp);
        }
        self.sftp
            .as_ref()
            .ok_or_else(|| RaspinelError::connection("SFTP session unavailable"))
    }

    // 远程家目录，用于展开 `~`
    fn remote_path(&mut self, remote_path: &str) -> Result<String> {
        if !remote_path.starts_with('~') && !remote_path.starts_with('.') {
            return Ok(remote_path.to_string());
        }
        if self.remote_home.is_none() {
            let home = self
                .sftp()?
                .realpath(Path::new("."))
                .map_err(|e| RaspinelError::connection(format!("Cannot resolve remote home: {e}")))?;
            self.remote_home = Some(home.to_string_lossy().into_owned());
        }
        let home = self.remote_home.as_deref().unwrap_or_default();
        Ok(resolve_remote_path(home, remote_path))
    }
}

impl CommandTransport for SshClient {
    fn exec(&mut self, command: &str) -> Result<ExecOutput> {
        let lost = |what: &str, e: ssh2::Error| {
            RaspinelError::connection(format!("{what} for {command:?}: {e}"))
        };

        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| lost("Failed to create SSH channel", e))?;
        channel
            .exec(command)
            .map_err(|e| lost("Failed to execute command", e))?;

        let mut stdout = Vec::new();
        channel
            .read_to_end(&mut stdout)
            .map_err(|e| RaspinelError::connection(format!("Failed to read output of {command:?}: {e}")))?;
        let mut stderr = Vec::new();
        channel
            .stderr()
            .read_to_end(&mut stderr)
            .map_err(|e| RaspinelError::connection(format!("Failed to read stderr of {command:?}: {e}")))?;

        channel
            .wait_close()
            .map_err(|e| lost("Failed to close channel", e))?;
        let exit = channel
            .exit_status()
            .map_err(|e| lost("Failed to read exit status", e))?;

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit,
        })
    }
}

impl FileTransport for SshClient {
    fn upload(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        progress: &dyn TransferProgress,
    ) -> Result<Uploaded> {
        let remote = self
            .remote_path(remote_path)
            .map_err(|e| RaspinelError::transfer(remote_path, e))?;
        let sftp = self
            .sftp()
            .map_err(|e| RaspinelError::transfer(&remote, e))?;
        transfer::upload_file(sftp, local_path, &remote, progress)
    }

    fn download(
        &mut self,
        remote_path: &str,
        local_path: &Path,
        progress: &dyn TransferProgress,
    ) -> Result<Downloaded> {
        let remote = self
            .remote_path(remote_path)
            .map_err(|e| RaspinelError::transfer(remote_path, e))?;
        let sftp = self
            .sftp()
            .map_err(|e| RaspinelError::transfer(&remote, e))?;
        transfer::download_file(sftp, &remote, local_path, progress)
    }
}

impl Transport for SshClient {
    fn close(&mut self) -> Result<()> {
        self.sftp = None;
        if let Err(e) = self.session.disconnect(None, "closed by client", None) {
            warn!("SSH disconnect failed: {}", e);
        }
        Ok(())
    }
}
