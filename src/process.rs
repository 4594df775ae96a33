// 远程进程与 screen 会话
use crate::utils::error::{RaspinelError, Result};
use chrono::{NaiveDateTime, Timelike};
use regex::Regex;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

pub const PS_CMD: &str = "ps -ely";
pub const SCREEN_LIST_CMD: &str = "screen -ls";

const SCREEN_START_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

fn screen_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\t(?P<pid>\d{1,8})\.(?P<name>.+)\t\((?P<start>\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2})\)\t\((?P<state>.+)\)$",
        )
        .expect("valid regex")
    })
}

/// One row of `ps -ely`.
#[derive(Debug, Clone)]
pub struct ProcessEntry {
    pub state: String,
    pub uid: u32,
    pub pid: u32,
    pub ppid: u32,
    pub cpu: String,
    pub priority: String,
    pub nice: String,
    pub rss: u64,
    pub size: u64,
    pub wchan: String,
    pub tty: String,
    pub time: String,
    pub cmd: String,
}

impl PartialEq for ProcessEntry {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
    }
}

impl Eq for ProcessEntry {}

impl Hash for ProcessEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
    }
}

impl ProcessEntry {
    pub fn from_line(line: &str) -> Result<Self> {
        let bad = || RaspinelError::parse("ps entry", line);
        let fields = split_fields(line.trim(), 13).ok_or_else(bad)?;
        let int = |idx: usize| fields[idx].parse::<u64>().map_err(|_| bad());
        let id = |idx: usize| fields[idx].parse::<u32>().map_err(|_| bad());

        Ok(ProcessEntry {
            state: fields[0].to_string(),
            uid: id(1)?,
            pid: id(2)?,
            ppid: id(3)?,
            cpu: fields[4].to_string(),
            priority: fields[5].to_string(),
            nice: fields[6].to_string(),
            rss: int(7)?,
            size: int(8)?,
            wchan: fields[9].to_string(),
            tty: fields[10].to_string(),
            time: fields[11].to_string(),
            cmd: fields[12].to_string(),
        })
    }
}

/// Parses the whole `ps -ely` output, header included.
pub fn parse_ps(out: &str) -> Result<Vec<ProcessEntry>> {
    out.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(ProcessEntry::from_line)
        .collect()
}

// 按空白切出 n-1 列，剩余部分作为最后一列（命令可能含空格）
fn split_fields(line: &str, n: usize) -> Option<Vec<&str>> {
    let mut fields = Vec::with_capacity(n);
    let mut rest = line;
    while fields.len() < n - 1 {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            return None;
        }
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        fields.push(&trimmed[..end]);
        rest = &trimmed[end..];
    }
    let last = rest.trim();
    if last.is_empty() {
        return None;
    }
    fields.push(last);
    Some(fields)
}

/// A detached or attached `screen` session.
#[derive(Debug, Clone)]
pub struct Screen {
    pub pid: u32,
    pub name: String,
    /// Start time, truncated to the minute.
    pub start: NaiveDateTime,
    pub state: String,
}

impl PartialEq for Screen {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
    }
}

impl Eq for Screen {}

impl Hash for Screen {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pid, self.name)
    }
}

/// Lines that do not look like a session are skipped.
pub fn parse_screens(out: &str) -> Vec<Screen> {
    out.lines()
        .filter_map(|line| {
            let caps = screen_re().captures(line)?;
            let start = NaiveDateTime::parse_from_str(&caps["start"], SCREEN_START_FORMAT).ok()?;
            Some(Screen {
                pid: caps["pid"].parse().ok()?,
                name: caps["name"].to_string(),
                start: start.with_second(0).unwrap_or(start),
                state: caps["state"].to_string(),
            })
        })
        .collect()
}

/// How a caller names a screen session.
#[derive(Debug, Clone)]
pub enum ScreenId {
    Pid(u32),
    /// Either the bare name or the `pid.name` form.
    Name(String),
    Screen(Screen),
}

impl ScreenId {
    pub fn matches(&self, screen: &Screen) -> bool {
        match self {
            ScreenId::Pid(pid) => screen.pid == *pid,
            ScreenId::Name(name) => *name == screen.name || *name == screen.to_string(),
            ScreenId::Screen(s) => s == screen,
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenId::Pid(pid) => write!(f, "{pid}"),
            ScreenId::Name(name) => f.write_str(name),
            ScreenId::Screen(screen) => write!(f, "{screen}"),
        }
    }
}

impl From<u32> for ScreenId {
    fn from(pid: u32) -> Self {
        ScreenId::Pid(pid)
    }
}

impl From<&str> for ScreenId {
    fn from(name: &str) -> Self {
        ScreenId::Name(name.to_string())
    }
}

impl From<String> for ScreenId {
    fn from(name: String) -> Self {
        ScreenId::Name(name)
    }
}

impl From<Screen> for ScreenId {
    fn from(screen: Screen) -> Self {
        ScreenId::Screen(screen)
    }
}

impl From<&Screen> for ScreenId {
    fn from(screen: &Screen) -> Self {
        ScreenId::Screen(screen.clone())
    }
}
