// 进度显示
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Receives byte counts while a single file is copied.
pub trait TransferProgress {
    /// Called once the total size is known.
    fn start(&self, total: u64);
    /// Bytes transferred so far.
    fn update(&self, transferred: u64);
    fn finish(&self);
    fn finish_with_error(&self, error: &str);
}

/// 不显示进度（库调用的默认值）
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn start(&self, _total: u64) {}
    fn update(&self, _transferred: u64) {}
    fn finish(&self) {}
    fn finish_with_error(&self, _error: &str) {}
}

pub struct ProgressTracker {
    progress_bar: ProgressBar,
    transferred_bytes: AtomicU64,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(description: &str) -> Self {
        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        progress_bar.set_style(style);
        progress_bar.set_message(description.to_string());

        Self {
            progress_bar,
            transferred_bytes: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl TransferProgress for ProgressTracker {
    fn start(&self, total: u64) {
        self.progress_bar.set_length(total);
        self.progress_bar.reset_elapsed();
    }

    fn update(&self, transferred: u64) {
        self.transferred_bytes.store(transferred, Ordering::Relaxed);
        self.progress_bar.set_position(transferred);
    }

    fn finish(&self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let total = self.transferred_bytes.load(Ordering::Relaxed);
        let avg_speed = if elapsed > 0.0 {
            (total as f64 / elapsed) as u64
        } else {
            total
        };
        self.progress_bar
            .finish_with_message(format!("done (avg speed: {})", format_speed(avg_speed)));
    }

    fn finish_with_error(&self, error: &str) {
        self.progress_bar
            .abandon_with_message(format!("Transfer failed: {}", error));
    }
}

// 格式化速度显示
fn format_speed(bytes_per_sec: u64) -> String {
    const KB: f64 = 1024.0;
    let speed = bytes_per_sec as f64;
    if speed < KB {
        format!("{} B/s", bytes_per_sec)
    } else if speed < KB * KB {
        format!("{:.2} KB/s", speed / KB)
    } else if speed < KB * KB * KB {
        format!("{:.2} MB/s", speed / (KB * KB))
    } else {
        format!("{:.2} GB/s", speed / (KB * KB * KB))
    }
}
