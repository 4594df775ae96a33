// 配置管理
//
// 优先级（逐字段）：显式参数 > 环境变量 > .raspinel.yml > 默认值
use crate::utils::error::{RaspinelError, Result};
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = ".raspinel.yml";
pub const ENV_PREFIX: &str = "RASPINEL_";
pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_USERNAME: &str = "pi";
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Resolved connection descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: DEFAULT_PORT,
            username: DEFAULT_USERNAME.to_string(),
            password: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Resolves against the real home / install / working directories and
    /// the process environment.
    pub fn resolve() -> Result<Self> {
        Self::resolve_from(&ConfigSources::system()?, &Overrides::default())
    }

    pub fn resolve_from(sources: &ConfigSources, overrides: &Overrides) -> Result<Self> {
        let file = match sources.first_existing_file() {
            Some(path) => {
                debug!("Using config file {}", path.display());
                FileConfig::load(path)?
            }
            None => {
                debug!("No {} found, using environment only", CONFIG_FILE_NAME);
                FileConfig::default()
            }
        };
        let env = EnvConfig::from_map(&sources.env)?;

        // 空白主机名视为未设置，不遮蔽后面的来源
        let hostname = non_blank(overrides.hostname.clone())
            .or(non_blank(env.hostname))
            .or(non_blank(file.hostname))
            .ok_or_else(|| RaspinelError::missing_host(&sources.files))?;

        let port = overrides
            .port
            .or(env.port)
            .or(file.port)
            .unwrap_or(DEFAULT_PORT);

        let username = overrides
            .username
            .clone()
            .or(env.username)
            .or(file.username)
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string());

        let password = overrides.password.clone().or(env.password).or(file.password);

        let timeout_ms = overrides
            .timeout_ms
            .or(env.timeout_ms)
            .or(file.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Ok(ConnectionConfig {
            hostname,
            port,
            username,
            password,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

// 避免在日志中泄露密码
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.hostname, self.port)
    }
}

/// Explicit values, e.g. from CLI flags. They beat every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Where the resolver looks: candidate files in search order and an
/// environment map.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub files: Vec<PathBuf>,
    pub env: HashMap<String, String>,
}

impl ConfigSources {
    pub fn new(files: Vec<PathBuf>, env: HashMap<String, String>) -> Self {
        Self { files, env }
    }

    /// Fails with `MalformedConfig` when a `RASPINEL_*` value is not UTF-8.
    pub fn system() -> Result<Self> {
        let mut files = Vec::new();
        if let Some(home) = home::home_dir() {
            files.push(home.join(CONFIG_FILE_NAME));
        }
        if let Some(install_dir) = install_dir() {
            files.push(install_dir.join(CONFIG_FILE_NAME));
        }
        if let Ok(cwd) = std::env::current_dir() {
            files.push(cwd.join(CONFIG_FILE_NAME));
        }

        let env = prefixed_env(std::env::vars_os())?;

        Ok(Self { files, env })
    }

    pub fn first_existing_file(&self) -> Option<&Path> {
        self.files.iter().map(PathBuf::as_path).find(|p| p.is_file())
    }
}

// 只保留 RASPINEL_* 变量，其余变量即使不是 UTF-8 也不影响
fn prefixed_env(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> Result<HashMap<String, String>> {
    let mut env = HashMap::new();
    for (key, value) in vars {
        let Some(key) = key.to_str().filter(|k| k.starts_with(ENV_PREFIX)) else {
            continue;
        };
        let value = value
            .into_string()
            .map_err(|_| RaspinelError::malformed(key, "value is not valid UTF-8"))?;
        env.insert(key.to_string(), value);
    }
    Ok(env)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn install_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.parent().map(Path::to_path_buf)
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    hostname: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<u64>,
    // 未知键忽略，只记录日志
    #[serde(flatten)]
    extra: HashMap<String, serde_yaml::Value>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RaspinelError::malformed(&origin, e))?;
        Self::parse(&content, &origin)
    }

    fn parse(content: &str, origin: &str) -> Result<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| RaspinelError::malformed(origin, e))?;

        let config: FileConfig = match value {
            serde_yaml::Value::Null => FileConfig::default(),
            serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value)
                .map_err(|e| RaspinelError::malformed(origin, e))?,
            _ => return Err(RaspinelError::malformed(origin, "config must be key-value")),
        };

        for key in config.extra.keys() {
            debug!("Ignoring unknown key {:?} in {}", key, origin);
        }
        Ok(config)
    }
}

#[derive(Debug, Default)]
struct EnvConfig {
    hostname: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    timeout_ms: Option<u64>,
}

impl EnvConfig {
    fn from_map(env: &HashMap<String, String>) -> Result<Self> {
        let get = |field: &str| {
            env.get(&format!("{ENV_PREFIX}{field}"))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        Ok(EnvConfig {
            hostname: get("HOSTNAME"),
            port: get("PORT").map(|v| parse_env_number("PORT", &v)).transpose()?,
            username: get("USERNAME"),
            password: get("PASSWORD"),
            timeout_ms: get("TIMEOUT")
                .map(|v| parse_env_number("TIMEOUT", &v))
                .transpose()?,
        })
    }
}

fn parse_env_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        RaspinelError::malformed(
            format!("{ENV_PREFIX}{field}"),
            format!("must be a number, got {value:?}"),
        )
    })
}
