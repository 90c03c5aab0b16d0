//! Bounded, thread-safe sink for diagnostic messages.
//!
//! Messages logged before a file is bound are queued (oldest dropped once the
//! queue is full) and written out as soon as a file is available.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::warn;
use parking_lot::Mutex;

pub const DEFAULT_MAX_QUEUED_MESSAGE_COUNT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum LogResult {
    FailedToOpenFileForWrite = -1,
    Ok = 0,
    Enqueued = 1,
}

impl LogResult {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn succeeded(self) -> bool {
        self.code() >= 0
    }

    pub fn failed(self) -> bool {
        !self.succeeded()
    }
}

#[derive(Debug)]
struct Inner {
    path: Option<PathBuf>,
    file: Option<File>,
    queued: VecDeque<String>,
    max_queued: usize,
    dropped: usize,
}

impl Inner {
    fn enqueue(&mut self, message: &str) {
        if self.max_queued == 0 {
            self.dropped += 1;
            return;
        }
        while self.queued.len() >= self.max_queued {
            self.queued.pop_front();
            self.dropped += 1;
        }
        self.queued.push_back(message.to_string());
    }

    fn open(&mut self) -> bool {
        if self.file.is_some() {
            return true;
        }
        let Some(path) = &self.path else {
            return false;
        };
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                self.file = Some(file);
                true
            }
            Err(err) => {
                warn!("cannot open log file {}: {}", path.display(), err);
                false
            }
        }
    }

    fn write_line(&mut self, message: &str) -> bool {
        let Some(file) = self.file.as_mut() else {
            return false;
        };
        let result = if message.ends_with('\n') {
            file.write_all(message.as_bytes())
        } else {
            file.write_all(message.as_bytes())
                .and_then(|_| file.write_all(b"\n"))
        };
        result.and_then(|_| file.flush()).is_ok()
    }

    fn flush(&mut self) -> LogResult {
        if self.queued.is_empty() {
            return LogResult::Ok;
        }
        if !self.open() {
            return LogResult::FailedToOpenFileForWrite;
        }
        if self.dropped > 0 {
            warn!("{} log messages were dropped before the log file was opened", self.dropped);
        }
        while let Some(message) = self.queued.pop_front() {
            if !self.write_line(&message) {
                self.queued.push_front(message);
                return LogResult::FailedToOpenFileForWrite;
            }
        }
        LogResult::Ok
    }
}

#[derive(Debug)]
pub struct LogListener {
    inner: Mutex<Inner>,
}

impl LogListener {
    pub fn new() -> Self {
        Self::with_max_queued(DEFAULT_MAX_QUEUED_MESSAGE_COUNT)
    }

    pub fn with_max_queued(max_queued: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                path: None,
                file: None,
                queued: VecDeque::new(),
                max_queued,
                dropped: 0,
            }),
        }
    }

    /// Binds the listener to `path` (opened in append mode) and writes out
    /// everything queued so far.
    pub fn initialize(&self, path: impl AsRef<Path>) -> LogResult {
        let mut inner = self.inner.lock();
        inner.path = Some(path.as_ref().to_path_buf());
        inner.file = None;
        if !inner.open() {
            return LogResult::FailedToOpenFileForWrite;
        }
        inner.flush()
    }

    pub fn log(&self, message: &str) -> LogResult {
        let mut inner = self.inner.lock();
        if inner.path.is_none() {
            inner.enqueue(message);
            return LogResult::Enqueued;
        }
        if !inner.open() {
            inner.enqueue(message);
            return LogResult::FailedToOpenFileForWrite;
        }
        let flushed = inner.flush();
        if flushed.failed() {
            inner.enqueue(message);
            return flushed;
        }
        if inner.write_line(message) {
            LogResult::Ok
        } else {
            inner.enqueue(message);
            LogResult::FailedToOpenFileForWrite
        }
    }

    pub fn flush(&self) -> LogResult {
        let mut inner = self.inner.lock();
        if inner.path.is_none() {
            return if inner.queued.is_empty() {
                LogResult::Ok
            } else {
                LogResult::Enqueued
            };
        }
        inner.flush()
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.inner.lock().path.clone()
    }

    pub fn max_queued_message_count(&self) -> usize {
        self.inner.lock().max_queued
    }

    pub fn queued_message_count(&self) -> usize {
        self.inner.lock().queued.len()
    }

    pub fn dropped_message_count(&self) -> usize {
        self.inner.lock().dropped
    }
}

impl Default for LogListener {
    fn default() -> Self {
        Self::new()
    }
}
