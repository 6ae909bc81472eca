// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Child process execution with a wall-clock timeout

use colored::Colorize;
use std::io;
use std::process::Stdio;
use std::thread;
use std::time::{Duration, Instant};

use super::job::RenderCommand;

/// How a single child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Exited with status 0
    Completed,
    /// Exited with a non-zero status, or was killed by a signal (`code` is `None`)
    Failed { code: Option<i32> },
    /// Still running when the time budget ran out; it was killed
    TimedOut,
}

/// Runs render commands
pub trait Launcher {
    /// Run `command` to completion or until `timeout` elapses.
    ///
    /// An `Err` means the process could not be started or waited on.
    fn launch(&mut self, command: &RenderCommand, timeout: Duration) -> io::Result<JobOutcome>;
}

/// Launches real child processes
#[derive(Debug, Clone)]
pub struct SystemLauncher {
    poll_interval: Duration,
    quiet: bool,
}

impl SystemLauncher {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            quiet: false,
        }
    }

    /// Discard the child's stdout/stderr instead of inheriting them
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for SystemLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher for SystemLauncher {
    fn launch(&mut self, command: &RenderCommand, timeout: Duration) -> io::Result<JobOutcome> {
        let mut process = command.to_command();
        process.stdin(Stdio::null());
        if self.quiet {
            process.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let mut child = process.spawn()?;
        // A budget too large to represent as an instant means no deadline
        let deadline = Instant::now().checked_add(timeout);

        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(if status.success() {
                    JobOutcome::Completed
                } else {
                    JobOutcome::Failed {
                        code: status.code(),
                    }
                });
            }

            let Some(deadline) = deadline else {
                thread::sleep(self.poll_interval);
                continue;
            };

            match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) if !remaining.is_zero() => {
                    thread::sleep(remaining.min(self.poll_interval));
                }
                _ => {
                    // Only the direct child is stopped; anything it spawned is left alone
                    if let Err(e) = child.kill() {
                        log::warn!("Failed to kill timed out process {}: {}", child.id(), e);
                    }
                    if let Err(e) = child.wait() {
                        log::warn!("Failed to reap timed out process {}: {}", child.id(), e);
                    }
                    return Ok(JobOutcome::TimedOut);
                }
            }
        }
    }
}

/// Prints commands instead of running them
#[derive(Debug, Default)]
pub struct DryRunLauncher {
    echo: bool,
    commands: Vec<String>,
}

impl DryRunLauncher {
    pub fn new(echo: bool) -> Self {
        Self {
            echo,
            commands: Vec::new(),
        }
    }

    /// Commands seen so far, in order
    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

impl Launcher for DryRunLauncher {
    fn launch(&mut self, command: &RenderCommand, timeout: Duration) -> io::Result<JobOutcome> {
        let line = command.to_string();
        if self.echo {
            println!(
                "{} {} {}",
                "dry-run:".yellow().bold(),
                line,
                format!("(timeout {}s)", timeout.as_secs()).bright_black()
            );
        }
        self.commands.push(line);
        Ok(JobOutcome::Completed)
    }
}
