// 下载功能
use crate::transfer::{copy_chunked, Downloaded, TransferProgress};
use crate::utils::error::{RaspinelError, Result};
use crate::utils::file::ensure_parent_dir;
use log::info;
use ssh2::Sftp;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Downloads one remote file. `remote_path` must already be resolved.
///
/// A local destination that is an existing directory receives the remote file
/// name; missing parent directories are created. A partial local file is left
/// behind on failure.
pub fn download_file(
    sftp: &Sftp,
    remote_path: &str,
    local_path: &Path,
    progress: &dyn TransferProgress,
) -> Result<Downloaded> {
    let stat = sftp
        .stat(Path::new(remote_path))
        .map_err(|e| RaspinelError::transfer(remote_path, e))?;
    if stat.is_dir() {
        return Err(RaspinelError::transfer(remote_path, "is a directory"));
    }
    let file_size = stat.size.unwrap_or(0);

    let mut remote_file = sftp
        .open(Path::new(remote_path))
        .map_err(|e| RaspinelError::transfer(remote_path, e))?;

    let target = target_file_path(local_path, remote_path)?;
    let target_display = target.display().to_string();
    info!("Downloading {} -> {} ({} bytes)", remote_path, target_display, file_size);

    ensure_parent_dir(&target).map_err(|e| RaspinelError::transfer(&target_display, e))?;
    let mut local_file =
        File::create(&target).map_err(|e| RaspinelError::transfer(&target_display, e))?;

    progress.start(file_size);
    match copy_chunked(&mut remote_file, &mut local_file, progress) {
        Ok(bytes) => {
            progress.finish();
            Ok(Downloaded {
                local_path: target,
                bytes,
            })
        }
        Err(e) => {
            progress.finish_with_error(&e.to_string());
            Err(RaspinelError::transfer(remote_path, e))
        }
    }
}

// 获取本地目标文件路径
pub(crate) fn target_file_path(local_path: &Path, remote_path: &str) -> Result<PathBuf> {
    if local_path.is_dir() {
        let file_name = Path::new(remote_path)
            .file_name()
            .ok_or_else(|| RaspinelError::transfer(remote_path, "cannot determine file name"))?;
        Ok(local_path.join(file_name))
    } else {
        Ok(local_path.to_path_buf())
    }
}
