use log::{LevelFilter, Metadata, Record, SetLoggerError};
use once_cell::sync::OnceCell;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "wpg_engine.log";

#[derive(Debug)]
struct FileLogger {
    log_file: PathBuf,
    level: LevelFilter,
}

static LOGGER: OnceCell<FileLogger> = OnceCell::new();

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_entry = format_entry(record);
            if let Ok(mut file) = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_file)
            {
                let _ = file.write_all(log_entry.as_bytes());
            }
        }
    }

    fn flush(&self) {}
}

fn format_entry(record: &Record) -> String {
    format!(
        "{} {} {} - {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.target(),
        record.args()
    )
}

/// Installs the file logger. Only the first call in a process takes effect.
pub fn init(log_dir: &Path, level: LevelFilter) -> Result<(), SetLoggerError> {
    if let Err(e) = create_dir_all(log_dir) {
        eprintln!("Could not create log directory {}: {e}", log_dir.display());
    }

    let logger = LOGGER.get_or_init(|| FileLogger {
        log_file: log_dir.join(LOG_FILE_NAME),
        level,
    });

    log::set_logger(logger).map(|()| log::set_max_level(logger.level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_enabled_records_only() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path(), LevelFilter::Info).unwrap();

        log::info!("briefing generated");
        log::debug!("hidden detail");
        log::logger().flush();

        let contents = std::fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
        assert!(contents.contains("INFO"));
        assert!(contents.contains("briefing generated"));
        assert!(!contents.contains("hidden detail"));

        // A second logger cannot be installed.
        assert!(init(dir.path(), LevelFilter::Debug).is_err());
    }
}
