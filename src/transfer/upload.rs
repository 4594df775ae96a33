// 上传功能
use crate::transfer::{copy_chunked, join_remote, TransferProgress, Uploaded};
use crate::utils::error::{RaspinelError, Result};
use log::info;
use ssh2::Sftp;
use std::fs::File;
use std::path::Path;

/// Uploads one local file. `remote_path` must already be resolved (no `~`).
///
/// When `remote_path` is an existing directory the local file name is kept.
pub fn upload_file(
    sftp: &Sftp,
    local_path: &Path,
    remote_path: &str,
    progress: &dyn TransferProgress,
) -> Result<Uploaded> {
    let local_display = local_path.display().to_string();
    let mut local_file =
        File::open(local_path).map_err(|e| RaspinelError::transfer(&local_display, e))?;
    let metadata = local_file
        .metadata()
        .map_err(|e| RaspinelError::transfer(&local_display, e))?;
    if !metadata.is_file() {
        return Err(RaspinelError::transfer(&local_display, "not a regular file"));
    }

    let target = target_file_path(sftp, remote_path, local_path)?;
    info!("Uploading {} -> {} ({} bytes)", local_display, target, metadata.len());

    let mut remote_file = sftp
        .create(Path::new(&target))
        .map_err(|e| RaspinelError::transfer(&target, e))?;

    progress.start(metadata.len());
    match copy_chunked(&mut local_file, &mut remote_file, progress) {
        Ok(bytes) => {
            progress.finish();
            Ok(Uploaded {
                remote_path: target,
                bytes,
            })
        }
        Err(e) => {
            progress.finish_with_error(&e.to_string());
            Err(RaspinelError::transfer(&target, e))
        }
    }
}

fn target_file_path(sftp: &Sftp, remote_path: &str, local_file: &Path) -> Result<String> {
    match sftp.stat(Path::new(remote_path)) {
        Ok(stat) if stat.is_dir() => {
            let file_name = local_file
                .file_name()
                .ok_or_else(|| {
                    RaspinelError::transfer(local_file.display().to_string(), "cannot determine file name")
                })?
                .to_string_lossy();
            Ok(join_remote(remote_path, &file_name))
        }
        // 文件已存在则覆盖，不存在则新建
        _ => Ok(remote_path.to_string()),
    }
}
