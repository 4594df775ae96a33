//! Parsers for the fixed introspection commands run by `Client::info`.

use crate::utils::error::{RaspinelError, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

pub const TEMPERATURE_CMD: &str = "vcgencmd measure_temp";
pub const CPU_CMD: &str = "mpstat -P ALL 1 1";
pub const MEMORY_CMD: &str = "free | grep 'Mem:'";
pub const UPTIME_CMD: &str = "uptime -s";
pub const STORAGE_CMD: &str = "df";

const BOOT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
// df 的 1K 块换算为 GB
const GB: f64 = 1_000_000.0;

fn temperature_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^temp=(\d+(?:\.\d+)?)'C$").expect("valid regex"))
}

fn color_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-9]{1,2}(?:;[0-9]{1,2})?m").expect("valid regex"))
}

/// Summary of the remote host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub hostname: String,
    pub port: u16,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Per-CPU usage in `[0, 1]`.
    pub cpu: Vec<f64>,
    pub memory: Usage,
    pub boot_time: NaiveDateTime,
    #[serde(skip)]
    pub queried_at: NaiveDateTime,
    pub storage: Usage,
}

/// `(used, total)` in KiB for memory and 1K-blocks for storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub used: u64,
    pub total: u64,
}

pub fn parse_temperature(out: &str) -> Result<f64> {
    temperature_re()
        .captures(out.trim())
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(|| RaspinelError::parse("temperature", out))
}

/// Reads the per-CPU summary rows of `mpstat -P ALL`, usage = 1 - idle.
///
/// Summary rows start with a localized label ending in `:` (`Average:`,
/// `Moyenne:` ...) followed by the CPU number. Interval rows start with a
/// time stamp and are skipped.
pub fn parse_cpu(out: &str) -> Result<Vec<f64>> {
    let cleaned = color_re().replace_all(out, "");
    let mut usages = Vec::new();

    for line in cleaned.lines() {
        let mut columns = line.split_whitespace();
        match columns.next() {
            Some(label) if is_summary_label(label) => {}
            _ => continue,
        }
        // 只取编号 CPU 的行，跳过表头和 all
        match columns.next() {
            Some(cpu) if !cpu.is_empty() && cpu.chars().all(|c| c.is_ascii_digit()) => {}
            _ => continue,
        }
        let idle = line
            .split_whitespace()
            .last()
            .and_then(|v| v.replace(',', ".").parse::<f64>().ok())
            .ok_or_else(|| RaspinelError::parse("cpu", line))?;
        usages.push(1.0 - idle / 100.0);
    }

    if usages.is_empty() {
        return Err(RaspinelError::parse("cpu", out));
    }
    Ok(usages)
}

// `Average:` 是标签，`12:00:01` 是时间
fn is_summary_label(token: &str) -> bool {
    token.len() > 1
        && token.ends_with(':')
        && !token.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Parses the `Mem:` row of `free`: used = total - free.
pub fn parse_memory(out: &str) -> Result<Usage> {
    let columns: Vec<&str> = out.split_whitespace().collect();
    let parse = |idx: usize| -> Option<u64> { columns.get(idx)?.parse().ok() };

    match (columns.first(), parse(1), parse(3)) {
        (Some(&"Mem:"), Some(total), Some(free)) => Ok(Usage {
            used: total.saturating_sub(free),
            total,
        }),
        _ => Err(RaspinelError::parse("memory", out)),
    }
}

pub fn parse_boot_time(out: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(out.trim(), BOOT_TIME_FORMAT)
        .map_err(|_| RaspinelError::parse("uptime", out))
}

/// Sums size and used columns of every `/dev/...`-style filesystem in `df`.
pub fn parse_storage(out: &str) -> Result<Usage> {
    let mut usage = Usage { used: 0, total: 0 };

    for line in out.lines().skip(1).filter(|l| !l.trim().is_empty()) {
        let columns: Vec<&str> = line.split_whitespace().collect();
        let (Some(name), Some(size), Some(used)) = (columns.first(), columns.get(1), columns.get(2))
        else {
            return Err(RaspinelError::parse("storage", line));
        };
        if !name.starts_with('/') {
            continue;
        }
        let (Ok(size), Ok(used)) = (size.parse::<u64>(), used.parse::<u64>()) else {
            return Err(RaspinelError::parse("storage", line));
        };
        usage.total += size;
        usage.used += used;
    }

    Ok(usage)
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius:.1}°C")
}

pub fn format_cpu(cpus: &[f64]) -> String {
    if cpus.is_empty() {
        return "0%".to_string();
    }
    let per_cpu = cpus
        .iter()
        .map(|perc| format!("{:.2}%", perc * 100.0))
        .collect::<Vec<_>>()
        .join("  ");
    let average = cpus.iter().sum::<f64>() * 100.0 / cpus.len() as f64;
    format!("{per_cpu}  ({average:.2}%)")
}

pub fn format_memory(memory: Usage) -> String {
    if memory.total == 0 {
        return "0MB / 0MB (0.00%)".to_string();
    }
    format!(
        "{:.0}MB / {:.0}MB ({:.2}%)",
        memory.used as f64 / 1024.0,
        memory.total as f64 / 1024.0,
        memory.used as f64 * 100.0 / memory.total as f64
    )
}

pub fn format_storage(storage: Usage) -> String {
    if storage.used == 0 && storage.total == 0 {
        return "0.00GB / 0.00GB (0.00%)".to_string();
    }
    let total = storage.total.max(storage.used);
    format!(
        "{:.2}GB / {:.2}GB ({:.2}%)",
        storage.used as f64 / GB,
        total as f64 / GB,
        storage.used as f64 * 100.0 / total as f64
    )
}

/// `Nd HH:MM:SS` since boot; a boot time in the future yields zero.
pub fn format_uptime(boot_time: NaiveDateTime, now: NaiveDateTime) -> String {
    let seconds = (now - boot_time).num_seconds().max(0);
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    let (days, hours) = (hours / 24, hours % 24);
    format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "hostname    : {}", self.hostname)?;
        writeln!(f, "port        : {}", self.port)?;
        writeln!(f, "temperature : {}", format_temperature(self.temperature))?;
        writeln!(f, "cpu         : {}", format_cpu(&self.cpu))?;
        writeln!(f, "memory      : {}", format_memory(self.memory))?;
        writeln!(f, "uptime      : {}", format_uptime(self.boot_time, self.queried_at))?;
        write!(f, "storage     : {}", format_storage(self.storage))
    }
}
