// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Append-only run log
//!
//! One plain-text line per lifecycle event, prefixed with a local timestamp
//! and a level. Every entry is also forwarded to the `log` facade so it shows
//! up on stderr when `env_logger` is initialised.

use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Severity of a run log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Pad so messages line up in the file
        write!(f, "{:<5}", self.as_str())
    }
}

/// Append-only log of one batch run
#[derive(Debug)]
pub struct RunLog {
    file: Option<File>,
    path: Option<PathBuf>,
    entries: Vec<String>,
}

impl RunLog {
    /// Open (or create) a log file in append mode
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            file: Some(file),
            path: Some(path.to_path_buf()),
            entries: Vec::new(),
        })
    }

    /// Log that keeps entries in memory only
    pub fn in_memory() -> Self {
        Self {
            file: None,
            path: None,
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Entries written during this run, oldest first
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn info(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        self.record(LogLevel::Info, message.as_ref())
    }

    pub fn warn(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        self.record(LogLevel::Warn, message.as_ref())
    }

    pub fn error(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        self.record(LogLevel::Error, message.as_ref())
    }

    pub fn fatal(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        self.record(LogLevel::Fatal, message.as_ref())
    }

    /// Append one entry. The line is flushed before returning.
    pub fn record(&mut self, level: LogLevel, message: &str) -> io::Result<()> {
        let line = format_entry(Local::now(), level, message);

        match level {
            LogLevel::Info => log::info!("{}", message),
            LogLevel::Warn => log::warn!("{}", message),
            LogLevel::Error | LogLevel::Fatal => log::error!("{}", message),
        }

        if let Some(file) = self.file.as_mut() {
            writeln!(file, "{}", line)?;
            file.flush()?;
        }
        self.entries.push(line);
        Ok(())
    }
}

/// Format a single log line
pub fn format_entry(timestamp: DateTime<Local>, level: LogLevel, message: &str) -> String {
    format!("{} {} {}", timestamp.format("%Y-%m-%d %H:%M:%S"), level, message)
}
