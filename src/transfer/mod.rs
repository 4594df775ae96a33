// 传输模块入口
pub mod download;
pub mod progress;
pub mod upload;

pub use download::download_file;
pub use progress::{NoProgress, ProgressTracker, TransferProgress};
pub use upload::upload_file;

use std::io::{self, Read, Write};
use std::path::PathBuf;

pub const CHUNK_SIZE: usize = 64 * 1024;

/// Where an upload landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploaded {
    pub remote_path: String,
    pub bytes: u64,
}

/// Where a download landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub local_path: PathBuf,
    pub bytes: u64,
}

/// Expands a leading `~` (and a bare `.`) against the remote home directory.
pub fn resolve_remote_path(remote_home: &str, remote_path: &str) -> String {
    let home = remote_home.trim_end_matches('/');
    if remote_path == "~" || remote_path == "." || remote_path == "./" {
        home.to_string()
    } else if let Some(rest) = remote_path.strip_prefix("~/") {
        format!("{}/{}", home, rest)
    } else {
        remote_path.to_string()
    }
}

/// Appends `file_name` when `dir` names a directory.
pub fn join_remote(dir: &str, file_name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), file_name)
}

/// 分块复制，每块写完后更新进度
pub(crate) fn copy_chunked<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    progress: &dyn TransferProgress,
) -> io::Result<u64> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buffer[..bytes_read])?;
        total += bytes_read as u64;
        progress.update(total);
    }

    writer.flush()?;
    Ok(total)
}
