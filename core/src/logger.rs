//! File-backed logger for the `log` facade
//!
//! Keeps the most recent entries in memory and appends every entry to a log
//! file. The CLI installs it once at startup with [`init`].

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

const RING_CAPACITY: usize = 1000;

pub struct LogEntry {
    pub timestamp: String,
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] [{}] [{}] {}",
            self.timestamp, self.level, self.target, self.message
        )
    }
}

struct Sink {
    ring_buffer: VecDeque<LogEntry>,
    file: Option<File>,
}

pub struct FileLogger {
    level: LevelFilter,
    mirror_stderr: bool,
    sink: Mutex<Sink>,
}

static LOGGER: OnceLock<FileLogger> = OnceLock::new();

impl FileLogger {
    fn new(level: LevelFilter, file_path: Option<PathBuf>, mirror_stderr: bool) -> Self {
        let file = file_path.and_then(|path| {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            OpenOptions::new().create(true).append(true).open(path).ok()
        });

        Self {
            level,
            mirror_stderr,
            sink: Mutex::new(Sink {
                ring_buffer: VecDeque::with_capacity(RING_CAPACITY),
                file,
            }),
        }
    }

    fn recent(&self, n: usize) -> Vec<String> {
        let sink = self.sink.lock();
        sink.ring_buffer
            .iter()
            .rev()
            .take(n)
            .map(|e| e.to_string())
            .collect()
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        };

        if self.mirror_stderr {
            eprintln!("{}", entry);
        }

        let mut sink = self.sink.lock();
        if let Some(file) = sink.file.as_mut() {
            let _ = writeln!(file, "{}", entry);
        }
        if sink.ring_buffer.len() >= RING_CAPACITY {
            sink.ring_buffer.pop_front();
        }
        sink.ring_buffer.push_back(entry);
    }

    fn flush(&self) {
        if let Some(file) = self.sink.lock().file.as_mut() {
            let _ = file.flush();
        }
    }
}

/// Install the logger. Calling it a second time is a no-op.
pub fn init(level: LevelFilter, file_path: Option<PathBuf>, mirror_stderr: bool) {
    let logger = LOGGER.get_or_init(|| FileLogger::new(level, file_path, mirror_stderr));
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

/// Default log file location: `<data_dir>/tidyagent/tidyagent.log`
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("tidyagent").join("tidyagent.log"))
}

/// Most recent log lines, newest first
pub fn get_recent_logs(n: usize) -> Vec<String> {
    LOGGER.get().map(|l| l.recent(n)).unwrap_or_default()
}
