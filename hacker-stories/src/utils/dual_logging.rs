use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use crate::utils::app_paths::AppPaths;
use crate::utils::logging::LogEntry;

/// Setting this echoes every log line to stderr
pub const DEBUG_ENV_VAR: &str = "HACKER_STORIES_DEBUG";

/// Global dual logger instance
static DUAL_LOGGER: OnceLock<Option<DualLogger>> = OnceLock::new();

/// File half of the dual logging setup; the ring buffer half lives in
/// [`crate::utils::logging`]
pub struct DualLogger {
    log_file: Mutex<File>,
    log_path: PathBuf,
    echo_stderr: bool,
}

impl DualLogger {
    /// Open a timestamped log file in `log_dir` and point `latest.log` at it
    pub fn new(log_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(log_dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("hacker-stories_{}.log", timestamp));
        let latest_path = log_dir.join("latest.log");

        #[cfg(unix)]
        {
            // On Unix, use symlink (doesn't require elevated privileges)
            let _ = std::fs::remove_file(&latest_path);
            let _ = std::os::unix::fs::symlink(&log_path, &latest_path);
        }

        #[cfg(not(unix))]
        {
            let pointer_content = format!("Current log file: {}\n", log_path.display());
            let _ = std::fs::write(&latest_path, pointer_content);
        }

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        Ok(Self {
            log_file: Mutex::new(log_file),
            log_path,
            echo_stderr: std::env::var(DEBUG_ENV_VAR).is_ok(),
        })
    }

    /// Append an entry to the log file
    pub fn write_entry(&self, entry: &LogEntry) {
        if let Ok(mut file) = self.log_file.lock() {
            let log_line = format!(
                "[{}] {} [{}] {}\n",
                entry.timestamp, entry.level, entry.target, entry.message
            );
            let _ = file.write_all(log_line.as_bytes());
            let _ = file.flush(); // Important for crash debugging!
        }

        if self.echo_stderr {
            eprintln!("{}", entry.format_for_display());
        }
    }

    /// Get the log file path
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Force flush the log file
    pub fn flush(&self) {
        if let Ok(mut file) = self.log_file.lock() {
            let _ = file.flush();
        }
    }
}

fn default_log_dir() -> PathBuf {
    AppPaths::log_dir().unwrap_or_else(|_| std::env::temp_dir().join("hacker-stories"))
}

/// Initialize the global dual logger. Returns `None` if no log file could be
/// opened, in which case logs only reach the ring buffer.
pub fn init_dual_logger() -> Option<&'static DualLogger> {
    DUAL_LOGGER
        .get_or_init(|| DualLogger::new(&default_log_dir()).ok())
        .as_ref()
}

/// Get the global dual logger
pub fn get_dual_logger() -> Option<&'static DualLogger> {
    DUAL_LOGGER.get().and_then(Option::as_ref)
}
