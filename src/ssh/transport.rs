// 传输层抽象：命令执行 + 文件传输
use crate::config::ConnectionConfig;
use crate::transfer::{Downloaded, TransferProgress, Uploaded};
use crate::utils::error::Result;
use std::path::Path;

/// Raw result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit: i32,
}

pub trait CommandTransport {
    /// Runs `command` through the remote shell and waits for it to finish.
    ///
    /// Fails with `Connection` when the channel cannot be opened or is lost.
    fn exec(&mut self, command: &str) -> Result<ExecOutput>;
}

pub trait FileTransport {
    /// Copies one local file to `remote_path`.
    fn upload(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        progress: &dyn TransferProgress,
    ) -> Result<Uploaded>;

    /// Copies one remote file to `local_path`.
    fn download(
        &mut self,
        remote_path: &str,
        local_path: &Path,
        progress: &dyn TransferProgress,
    ) -> Result<Downloaded>;
}

/// An established session offering both capabilities.
pub trait Transport: CommandTransport + FileTransport {
    fn close(&mut self) -> Result<()>;
}

/// Establishes a [`Transport`] for a resolved descriptor.
pub trait Connector {
    type Transport: Transport;

    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Transport>;
}
