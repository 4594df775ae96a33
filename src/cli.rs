// 命令行参数解析
use crate::config::Overrides;
use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(name = "raspinel")]
#[command(about = "Allows communication using ssh to get information, upload or download files or run commands")]
#[command(version)]
pub struct Cli {
    /// Show some information about the remote
    #[arg(short, long)]
    pub info: bool,

    /// Download a file from the remote
    #[arg(short, long, num_args = 2, value_names = ["SRC", "DEST"])]
    pub download: Option<Vec<String>>,

    /// Upload a file to the remote using sftp
    #[arg(short, long, num_args = 2, value_names = ["SRC", "DEST"])]
    pub upload: Option<Vec<String>>,

    /// Compare md5 checksums after a transfer
    #[arg(long)]
    pub verify: bool,

    /// Print --info as JSON
    #[arg(long)]
    pub json: bool,

    /// Remote hostname (overrides RASPINEL_HOSTNAME and .raspinel.yml)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// SSH port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// SSH username
    #[arg(short = 'U', long)]
    pub username: Option<String>,

    /// Connection timeout in milliseconds
    #[arg(short, long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Prompt for the SSH password
    #[arg(short = 'P', long)]
    pub ask_password: bool,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Command to execute on the remote
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub commands: Vec<String>,
}

impl Cli {
    /// Without any action the desktop GUI would start.
    pub fn has_action(&self) -> bool {
        self.info || self.download.is_some() || self.upload.is_some() || !self.commands.is_empty()
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            hostname: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: None,
            timeout_ms: self.timeout,
        }
    }
}
