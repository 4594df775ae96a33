// 远程主机信息、进程与 screen 管理
use super::Client;
use crate::info::{self, Info, Usage};
use crate::process::{self, ProcessEntry, Screen, ScreenId};
use crate::ssh::Connector;
use crate::utils::error::{RaspinelError, Result};
use crate::utils::file::parse_md5sum_line;
use crate::utils::shell::quote;
use chrono::{Local, NaiveDateTime};

impl<C: Connector> Client<C> {
    // 执行固定命令，要求退出码为 0
    fn run_checked(&mut self, command: &str) -> Result<String> {
        Ok(self.run(command)?.check(&[0])?.out)
    }

    /// Hostname, port, temperature, CPU, memory, uptime and storage.
    pub fn info(&mut self) -> Result<Info> {
        Ok(Info {
            hostname: self.config.hostname.clone(),
            port: self.config.port,
            temperature: self.temperature()?,
            cpu: self.cpu()?,
            memory: self.memory()?,
            boot_time: self.boot_time()?,
            queried_at: Local::now().naive_local(),
            storage: self.storage()?,
        })
    }

    pub fn temperature(&mut self) -> Result<f64> {
        info::parse_temperature(&self.run_checked(info::TEMPERATURE_CMD)?)
    }

    pub fn cpu(&mut self) -> Result<Vec<f64>> {
        info::parse_cpu(&self.run_checked(info::CPU_CMD)?)
    }

    pub fn memory(&mut self) -> Result<Usage> {
        info::parse_memory(&self.run_checked(info::MEMORY_CMD)?)
    }

    /// Cached until the next (re)connection.
    pub fn boot_time(&mut self) -> Result<NaiveDateTime> {
        if let Some(boot_time) = self.boot_time {
            if self.is_connected() {
                return Ok(boot_time);
            }
        }
        let boot_time = info::parse_boot_time(&self.run_checked(info::UPTIME_CMD)?)?;
        self.boot_time = Some(boot_time);
        Ok(boot_time)
    }

    pub fn storage(&mut self) -> Result<Usage> {
        info::parse_storage(&self.run_checked(info::STORAGE_CMD)?)
    }

    pub fn ps(&mut self) -> Result<Vec<ProcessEntry>> {
        process::parse_ps(&self.run_checked(process::PS_CMD)?)
    }

    /// First pid reported by `pidof`, `None` when nothing matches.
    pub fn pid(&mut self, name: &str) -> Result<Option<u32>> {
        let resp = self.cmd("pidof {}", &[name])?.check(&[0, 1])?;
        if resp.exit == 1 {
            return Ok(None);
        }
        resp.out
            .split_whitespace()
            .next()
            .and_then(|pid| pid.parse().ok())
            .map(Some)
            .ok_or_else(|| RaspinelError::parse("pidof", resp.out.clone()))
    }

    /// Kills a process (or the screen session with that pid).
    ///
    /// Returns whether the pid is gone afterwards.
    pub fn kill_by_pid(&mut self, pid: u32) -> Result<bool> {
        if let Some(screen) = self.get_screen(pid)? {
            return self.kill_screen(screen);
        }
        self.cmd("kill -9 {}", &[pid.to_string()])?.check(&[0])?;
        Ok(self.ps()?.iter().all(|entry| entry.pid != pid))
    }

    pub fn kill_by_name(&mut self, name: &str) -> Result<bool> {
        match self.pid(name)? {
            Some(pid) => self.kill_by_pid(pid),
            None => Err(RaspinelError::NotFound {
                what: format!("process {name:?}"),
            }),
        }
    }

    /// The remote drops the connection while rebooting; that is not an error.
    pub fn reboot(&mut self) -> Result<()> {
        log::info!("Rebooting {}", self.config);
        match self.run("sudo reboot") {
            Ok(resp) => resp.check(&[0]).map(|_| ()),
            Err(RaspinelError::Connection { .. }) | Err(RaspinelError::ExitCode(-1)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn screens(&mut self) -> Result<Vec<Screen>> {
        // 没有会话时 screen -ls 返回 1
        let resp = self.run(process::SCREEN_LIST_CMD)?.check(&[0, 1])?;
        Ok(process::parse_screens(&resp.out))
    }

    pub fn get_screen(&mut self, id: impl Into<ScreenId>) -> Result<Option<Screen>> {
        let id = id.into();
        Ok(self.screens()?.into_iter().find(|screen| id.matches(screen)))
    }

    /// Starts `command` in a new detached session called `name`.
    pub fn create_screen(&mut self, command: &str, name: &str) -> Result<()> {
        if self.screens()?.iter().any(|screen| screen.name == name) {
            return Err(RaspinelError::AlreadyExists {
                what: format!("screen {name:?}"),
            });
        }
        self.cmd("screen -dmS {} bash -c {}", &[name, command])?
            .check(&[0])?;
        Ok(())
    }

    /// Returns `false` when `screen` refused to quit.
    pub fn kill_screen(&mut self, id: impl Into<ScreenId>) -> Result<bool> {
        let screen = self.require_screen(id.into())?;
        let resp = self.cmd("screen -X -S {} quit", &[screen.to_string()])?;
        Ok(resp.success())
    }

    pub fn rename_screen(&mut self, id: impl Into<ScreenId>, name: &str) -> Result<()> {
        let screen = self.require_screen(id.into())?;
        self.cmd("screen -S {} -X sessionname {}", &[screen.to_string(), name.to_string()])?
            .check(&[0])?;
        Ok(())
    }

    fn require_screen(&mut self, id: ScreenId) -> Result<Screen> {
        let label = id.to_string();
        self.get_screen(id)?.ok_or_else(|| RaspinelError::NotFound {
            what: format!("screen {label:?}"),
        })
    }

    /// md5 of a remote file; a leading `~/` is expanded by the remote shell.
    pub fn remote_md5(&mut self, remote_path: &str) -> Result<String> {
        let command = match remote_path.strip_prefix("~/") {
            Some(rest) => format!("md5sum ~/{}", quote(rest)),
            None => format!("md5sum {}", quote(remote_path)),
        };
        let out = self.run_checked(&command)?;
        parse_md5sum_line(&out)
            .map(str::to_string)
            .ok_or_else(|| RaspinelError::parse("md5sum", out.clone()))
    }
}
