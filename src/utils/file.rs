use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// 本地文件的 md5（十六进制小写），用于和远程 `md5sum` 对比
pub fn calculate_md5<P: AsRef<Path>>(file_path: P) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(file_path)?);
    let mut hasher = md5::Context::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.consume(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.compute()))
}

pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> std::io::Result<()> {
    match file_path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// `md5sum` 输出的第一列
pub fn parse_md5sum_line(output: &str) -> Option<&str> {
    let digest = output.split_whitespace().next()?;
    (digest.len() == 32 && digest.chars().all(|c| c.is_ascii_hexdigit())).then_some(digest)
}
