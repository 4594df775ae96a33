use crate::ssh::ExecOutput;
use crate::utils::error::{RaspinelError, Result};

/// Output of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The command line as sent, after substitution.
    pub cmd: String,
    pub out: String,
    pub err: String,
    pub exit: i32,
}

impl Response {
    pub(crate) fn from_exec(cmd: String, output: ExecOutput) -> Self {
        Response {
            cmd,
            out: output.stdout.trim_matches('\n').to_string(),
            err: output.stderr.trim_matches('\n').to_string(),
            exit: output.exit,
        }
    }

    /// Returns `self` when `exit` is one of `exits`, `ExitCode` otherwise.
    pub fn check(self, exits: &[i32]) -> Result<Self> {
        if exits.contains(&self.exit) {
            Ok(self)
        } else {
            Err(RaspinelError::ExitCode(self.exit))
        }
    }

    pub fn success(&self) -> bool {
        self.exit == 0
    }
}
