// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch driver - renders every discovered object, one child process at a time

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

use super::config::{BatchConfig, LimitMode};
use super::discovery::MeshDiscovery;
use super::job::RenderJob;
use super::launcher::{JobOutcome, Launcher};
use super::reporter::BatchReporter;
use super::types::{BatchSummary, JobRecord, JobStatus};
use crate::error::{describe_exit, BatchError, Result};
use crate::runlog::RunLog;

/// Number of objects a run will attempt out of `discovered`
pub fn planned_jobs(discovered: usize, max_objects: Option<usize>, mode: LimitMode) -> usize {
    match (max_objects, mode) {
        (None, _) => discovered,
        (Some(max), LimitMode::Exact) => discovered.min(max),
        (Some(max), LimitMode::Inclusive) => discovered.min(max.saturating_add(1)),
    }
}

/// Sequential batch driver
pub struct BatchDriver<L: Launcher> {
    config: BatchConfig,
    launcher: L,
    log: RunLog,
    summary: BatchSummary,
}

impl<L: Launcher> BatchDriver<L> {
    pub fn new(config: BatchConfig, launcher: L, log: RunLog) -> Self {
        let summary = BatchSummary::new(
            config.object_root.clone(),
            config.output_dir.clone(),
            config.dry_run,
        );
        Self {
            config,
            launcher,
            log,
            summary,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// Progress so far; still meaningful after a run aborted
    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    /// Run the whole batch.
    ///
    /// Timeouts are logged and skipped. Any other failure stops the run and
    /// is returned; no job is retried.
    pub fn run(&mut self) -> Result<BatchSummary> {
        let start = Instant::now();
        let result = self.run_jobs();
        self.summary.duration = start.elapsed();

        match result {
            Ok(()) => {
                self.log.info(format!(
                    "Batch finished: {} attempted, {} completed, {} timed out in {:.1}s",
                    self.summary.attempted,
                    self.summary.completed,
                    self.summary.timed_out,
                    self.summary.duration.as_secs_f64()
                ))?;
                Ok(self.summary.clone())
            }
            Err(e) => {
                self.summary.aborted = Some(e.to_string());
                // The log itself may be what failed
                if let Err(log_err) = self.log.fatal(format!("Aborting batch: {}", e)) {
                    log::error!("Aborting batch: {} (run log write failed: {})", e, log_err);
                }
                Err(e)
            }
        }
    }

    fn run_jobs(&mut self) -> Result<()> {
        self.config.validate()?;

        self.log.info(format!(
            "Batch started: objects {:?}, output {:?}, {} views x {} lights, {}s per view{}",
            self.config.object_root,
            self.config.output_dir,
            self.config.views,
            self.config.lights_per_view,
            self.config.view_timeout_secs,
            if self.config.dry_run { " (dry run)" } else { "" }
        ))?;

        let objects = MeshDiscovery::discover(&self.config.object_root, self.config.extension())?;
        self.summary.discovered = objects.len();
        self.log.info(format!(
            "Found {} .{} files under {:?}",
            objects.len(),
            self.config.extension(),
            self.config.object_root
        ))?;

        if !self.config.render_script.exists() {
            return Err(BatchError::MissingScript(self.config.render_script.clone()));
        }

        let planned = planned_jobs(objects.len(), self.config.max_objects, self.config.limit_mode);
        if planned < objects.len() {
            self.log.info(format!(
                "Object limit reached: rendering {} of {}",
                planned,
                objects.len()
            ))?;
        }

        let pb = self.progress_bar(planned);
        for (index, object) in objects.into_iter().take(planned).enumerate() {
            let result = self.run_job(index, planned, object, &pb);
            pb.inc(1);
            if let Err(e) = result {
                pb.abandon();
                return Err(e);
            }
        }
        pb.finish_and_clear();

        Ok(())
    }

    fn run_job(&mut self, index: usize, planned: usize, object: PathBuf, pb: &ProgressBar) -> Result<()> {
        let job = RenderJob::from_config(index, object, &self.config);
        let command = job.command(&self.config.blender_path, &self.config.render_script);
        let command_line = command.to_string();
        let timeout = job.timeout();

        pb.set_message(job.model_identifier());
        self.log.info(format!(
            "[{}/{}] Rendering {:?} (timeout {}s)",
            index + 1,
            planned,
            job.object,
            timeout.as_secs()
        ))?;
        log::debug!("Command: {}", command_line);

        let started = Instant::now();
        let outcome = self.launcher.launch(&command, timeout);
        let duration = started.elapsed();

        let mut record = JobRecord {
            index,
            object: job.object.clone(),
            output_dir: job.expected_output_dir(),
            command: command_line.clone(),
            status: JobStatus::Error,
            duration,
            exit_code: None,
            error: None,
        };
        if let Ok(outcome) = &outcome {
            record.status = JobStatus::from(*outcome);
        }

        let failure = match outcome {
            Ok(JobOutcome::Completed) => {
                self.log.info(format!(
                    "Finished {:?} in {:.1}s, output in {:?}",
                    job.object,
                    duration.as_secs_f64(),
                    record.output_dir
                ))?;
                None
            }
            Ok(JobOutcome::TimedOut) => {
                record.error = Some(format!("exceeded {}s", timeout.as_secs()));
                self.log.warn(format!(
                    "Timed out after {}s, skipping {:?}",
                    timeout.as_secs(),
                    job.object
                ))?;
                None
            }
            Ok(JobOutcome::Failed { code }) => {
                record.exit_code = code;
                record.error = Some(describe_exit(&code));
                self.log.error(format!(
                    "Render failed with {}: {}",
                    describe_exit(&code),
                    command_line
                ))?;
                Some(BatchError::JobFailed {
                    object: job.object.clone(),
                    command: command_line,
                    code,
                })
            }
            Err(source) => {
                record.error = Some(source.to_string());
                self.log.error(format!("Could not start {}: {}", command_line, source))?;
                Some(BatchError::Launch {
                    command: command_line,
                    source,
                })
            }
        };

        if self.config.verbose {
            let line = BatchReporter::format_job(&record);
            if pb.is_hidden() {
                println!("{}", line);
            } else {
                pb.println(line);
            }
        }
        self.summary.add_job(record);

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}
