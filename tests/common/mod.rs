// 内存中的假远程主机，供集成测试使用
#![allow(dead_code)]

use raspinel::ssh::{CommandTransport, Connector, ExecOutput, FileTransport, Transport};
use raspinel::transfer::{Downloaded, TransferProgress, Uploaded};
use raspinel::{ConnectionConfig, RaspinelError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

#[derive(Default)]
pub struct Remote {
    pub files: HashMap<String, Vec<u8>>,
    pub commands: Vec<String>,
    pub sessions_open: usize,
    pub seen_configs: Vec<ConnectionConfig>,
    pub fail_close: bool,
}

#[derive(Clone, Default)]
pub struct MemoryConnector(pub Rc<RefCell<Remote>>);

pub struct MemoryTransport(Rc<RefCell<Remote>>);

impl Connector for MemoryConnector {
    type Transport = MemoryTransport;

    fn connect(&self, config: &ConnectionConfig) -> Result<MemoryTransport> {
        let mut remote = self.0.borrow_mut();
        remote.sessions_open += 1;
        remote.seen_configs.push(config.clone());
        Ok(MemoryTransport(Rc::clone(&self.0)))
    }
}

fn ok(stdout: String) -> ExecOutput {
    ExecOutput {
        stdout,
        stderr: String::new(),
        exit: 0,
    }
}

impl CommandTransport for MemoryTransport {
    fn exec(&mut self, command: &str) -> Result<ExecOutput> {
        let mut remote = self.0.borrow_mut();
        remote.commands.push(command.to_string());

        if let Some(arg) = command.strip_prefix("echo ") {
            return Ok(ok(format!("{}\n", arg.trim_matches('\''))));
        }
        if let Some(path) = command.strip_prefix("md5sum ") {
            let path = path.trim_matches('\'');
            return Ok(match remote.files.get(path) {
                Some(data) => ok(format!("{:x}  {}\n", md5::compute(data), path)),
                None => ExecOutput {
                    stdout: String::new(),
                    stderr: format!("md5sum: {path}: No such file or directory\n"),
                    exit: 1,
                },
            });
        }
        if let Some(code) = command.strip_prefix("exit ") {
            return Ok(ExecOutput {
                exit: code.trim().parse().unwrap_or(1),
                ..ExecOutput::default()
            });
        }
        Ok(ExecOutput {
            stdout: String::new(),
            stderr: format!("bash: {command}: command not found\n"),
            exit: 127,
        })
    }
}

impl FileTransport for MemoryTransport {
    fn upload(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        progress: &dyn TransferProgress,
    ) -> Result<Uploaded> {
        let data = std::fs::read(local_path)
            .map_err(|e| RaspinelError::transfer(local_path.display().to_string(), e))?;
        let bytes = data.len() as u64;
        progress.start(bytes);
        progress.update(bytes);
        progress.finish();
        self.0.borrow_mut().files.insert(remote_path.to_string(), data);
        Ok(Uploaded {
            remote_path: remote_path.to_string(),
            bytes,
        })
    }

    fn download(
        &mut self,
        remote_path: &str,
        local_path: &Path,
        progress: &dyn TransferProgress,
    ) -> Result<Downloaded> {
        let data = self
            .0
            .borrow()
            .files
            .get(remote_path)
            .cloned()
            .ok_or_else(|| RaspinelError::transfer(remote_path, "No such file"))?;
        let bytes = data.len() as u64;
        progress.start(bytes);
        std::fs::write(local_path, &data)
            .map_err(|e| RaspinelError::transfer(local_path.display().to_string(), e))?;
        progress.update(bytes);
        progress.finish();
        Ok(Downloaded {
            local_path: local_path.to_path_buf(),
            bytes,
        })
    }
}

impl Transport for MemoryTransport {
    fn close(&mut self) -> Result<()> {
        let mut remote = self.0.borrow_mut();
        remote.sessions_open -= 1;
        if remote.fail_close {
            return Err(RaspinelError::connection("socket already gone"));
        }
        Ok(())
    }
}
