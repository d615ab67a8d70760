//! Console and session-log output.
//!
//! Every write to the console, to the tracing sink, and to any session log
//! goes through one process-wide lock so lines from concurrent workers never
//! interleave. Nothing may emit a tracing event while holding the lock.

use chrono::Local;
use parking_lot::{Mutex, MutexGuard};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;

static OUTPUT_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Current local wall-clock time as `HH:MM:SS`.
pub fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Print a timestamped line to stdout.
pub fn console(message: impl AsRef<str>) {
    let line = format!("[{}] {}", timestamp(), message.as_ref());
    let _guard = OUTPUT_LOCK.lock();
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{line}");
    let _ = out.flush();
}

/// Print a block of text to stdout without a timestamp (tables, prompts).
pub fn console_raw(text: impl AsRef<str>) {
    let _guard = OUTPUT_LOCK.lock();
    let mut out = io::stdout().lock();
    let _ = write!(out, "{}", text.as_ref());
    let _ = out.flush();
}

/// Append-only, human-readable log shared by every job of one disc session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line. Failures are swallowed: a broken log
    /// must never stop the pipeline.
    pub fn append_line(&self, message: impl AsRef<str>) {
        let line = format!("[{}] {}\n", timestamp(), message.as_ref());
        let _guard = OUTPUT_LOCK.lock();
        let _ = self
            .open_unlocked()
            .and_then(|mut file| file.write_all(line.as_bytes()));
    }

    /// Open the log in append mode for a child process to write into.
    pub fn open_append(&self) -> io::Result<File> {
        let _guard = OUTPUT_LOCK.lock();
        self.open_unlocked()
    }

    fn open_unlocked(&self) -> io::Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&self.path)
    }
}

/// `MakeWriter` for `tracing-subscriber` that writes to stderr under the
/// shared output lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LockedStderr;

/// Writer handed out by [`LockedStderr`]; holds the lock until dropped.
pub struct LockedStderrWriter {
    _guard: MutexGuard<'static, ()>,
    inner: io::Stderr,
}

impl Write for LockedStderrWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<'a> MakeWriter<'a> for LockedStderr {
    type Writer = LockedStderrWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LockedStderrWriter {
            _guard: OUTPUT_LOCK.lock(),
            inner: io::stderr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.as_bytes()[2], b':');
        assert_eq!(ts.as_bytes()[5], b':');
    }

    #[test]
    fn test_append_line_creates_parent_and_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let log = SessionLog::new(tmp.path().join("DISC").join("log.txt"));

        log.append_line("RIP START t01");
        log.append_line("RIP DONE t01");

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] RIP START t01"));
        assert!(lines[1].ends_with("] RIP DONE t01"));
    }

    #[test]
    fn test_concurrent_appends_keep_lines_whole() {
        let tmp = tempfile::tempdir().unwrap();
        let log = SessionLog::new(tmp.path().join("log.txt"));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        log.append_line(format!("worker {worker} line {i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 400);
        assert!(lines
            .iter()
            .all(|l| l.starts_with('[') && l.contains("] worker ")));
    }

    #[test]
    fn test_open_append_preserves_existing_content() {
        let tmp = tempfile::tempdir().unwrap();
        let log = SessionLog::new(tmp.path().join("log.txt"));
        log.append_line("first");

        let mut file = log.open_append().unwrap();
        file.write_all(b"child output\n").unwrap();
        drop(file);

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("first"));
        assert!(content.ends_with("child output\n"));
    }
}
