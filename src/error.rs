// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fatal batch errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole batch run.
///
/// A job exceeding its time budget is not an error; see
/// [`JobOutcome::TimedOut`](crate::batch::JobOutcome::TimedOut).
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to walk object directory {root:?}: {source}")]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Object root is not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("Render script not found: {0:?}")]
    MissingScript(PathBuf),

    #[error("Failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Render of {object:?} failed with {}: `{command}`", describe_exit(.code))]
    JobFailed {
        object: PathBuf,
        command: String,
        code: Option<i32>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Run log error: {0}")]
    Log(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BatchError>;

/// Human-readable child exit, `None` meaning killed by a signal
pub fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}
