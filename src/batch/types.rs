// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch result types

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

use super::launcher::JobOutcome;

// Durations are stored as float seconds
fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Ok(Duration::from_secs_f64(secs))
}

/// Final state of one render job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Completed,
    Failed,
    TimedOut,
    /// The process could not be started
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::TimedOut => "timed out",
            JobStatus::Error => "error",
        }
    }
}

impl From<JobOutcome> for JobStatus {
    fn from(outcome: JobOutcome) -> Self {
        match outcome {
            JobOutcome::Completed => JobStatus::Completed,
            JobOutcome::Failed { .. } => JobStatus::Failed,
            JobOutcome::TimedOut => JobStatus::TimedOut,
        }
    }
}

/// Record of one attempted job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub index: usize,
    pub object: PathBuf,
    /// Folder the render script writes this object's views into
    pub output_dir: PathBuf,
    pub command: String,
    pub status: JobStatus,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a batch run, complete or aborted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub timestamp: String,
    pub object_root: PathBuf,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub discovered: usize,
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    pub timed_out: usize,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub duration: Duration,
    /// Reason the run stopped early, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
    pub jobs: Vec<JobRecord>,
}

impl BatchSummary {
    pub fn new(object_root: PathBuf, output_dir: PathBuf, dry_run: bool) -> Self {
        Self {
            timestamp: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            object_root,
            output_dir,
            dry_run,
            discovered: 0,
            attempted: 0,
            completed: 0,
            failed: 0,
            timed_out: 0,
            duration: Duration::ZERO,
            aborted: None,
            jobs: Vec::new(),
        }
    }

    pub fn add_job(&mut self, record: JobRecord) {
        self.attempted += 1;
        match record.status {
            JobStatus::Completed => self.completed += 1,
            JobStatus::TimedOut => self.timed_out += 1,
            JobStatus::Failed | JobStatus::Error => self.failed += 1,
        }
        self.jobs.push(record);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Objects discovered but never attempted
    pub fn not_attempted(&self) -> usize {
        self.discovered.saturating_sub(self.attempted)
    }

    pub fn success_rate(&self) -> f32 {
        if self.attempted == 0 {
            0.0
        } else {
            (self.completed as f32 / self.attempted as f32) * 100.0
        }
    }
}
