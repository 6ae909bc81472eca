// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch report generator

use anyhow::Result;
use colored::Colorize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::types::{BatchSummary, JobRecord, JobStatus};

/// Batch reporter
pub struct BatchReporter;

impl BatchReporter {
    /// Write JSON report
    pub fn write_json(summary: &BatchSummary, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(summary)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Write Markdown report
    pub fn write_markdown(summary: &BatchSummary, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, Self::markdown(summary))?;
        Ok(())
    }

    pub fn markdown(summary: &BatchSummary) -> String {
        let mut md = String::new();

        md.push_str("# Photometric Stereo Render Batch\n\n");
        md.push_str(&format!("**Generated:** {}\n\n", summary.timestamp));
        if summary.dry_run {
            md.push_str("_Dry run: no renders were started._\n\n");
        }
        md.push_str("---\n\n");

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Objects:** `{}`\n", summary.object_root.display()));
        md.push_str(&format!("- **Output:** `{}`\n", summary.output_dir.display()));
        md.push_str(&format!("- **Discovered:** {}\n", summary.discovered));
        md.push_str(&format!("- **Attempted:** {}\n", summary.attempted));
        md.push_str(&format!(
            "- **Completed:** {} ({:.1}%)\n",
            summary.completed,
            summary.success_rate()
        ));
        md.push_str(&format!("- **Timed out:** {}\n", summary.timed_out));
        md.push_str(&format!("- **Failed:** {}\n", summary.failed));
        md.push_str(&format!("- **Duration:** {:.2}s\n", summary.duration.as_secs_f64()));
        if let Some(ref reason) = summary.aborted {
            md.push_str(&format!("- **Aborted:** {}\n", reason));
        }
        md.push_str("\n---\n\n");

        let problems: Vec<_> = summary
            .jobs
            .iter()
            .filter(|j| j.status != JobStatus::Completed)
            .collect();

        if !problems.is_empty() {
            md.push_str("## Problems\n\n");
            for job in problems {
                md.push_str(&format!("- `{}`: {}\n", job.object.display(), job.status.as_str()));
                if let Some(ref err) = job.error {
                    md.push_str(&format!("  - Detail: {}\n", err));
                }
                md.push_str(&format!("  - Output: `{}`\n", job.output_dir.display()));
                md.push_str(&format!("  - Command: `{}`\n", job.command));
            }
            md.push('\n');
        }

        let rendered: Vec<_> = summary
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::Completed)
            .collect();

        if !rendered.is_empty() {
            md.push_str(if summary.dry_run {
                "## Planned Output Folders\n\n"
            } else {
                "## Output Folders\n\n"
            });
            for job in rendered {
                md.push_str(&format!("- `{}`\n", job.output_dir.display()));
            }
            md.push('\n');
        }

        md
    }

    /// One colored line per job
    pub fn format_job(job: &JobRecord) -> String {
        let icon = match job.status {
            JobStatus::Completed => "✓".green(),
            JobStatus::TimedOut => "⏱".yellow(),
            JobStatus::Failed | JobStatus::Error => "✗".red(),
        };
        let mut line = format!(
            "  {} {} {}",
            icon,
            job.object.display().to_string().cyan(),
            format!("({})", Self::format_duration(job.duration)).bright_black()
        );
        if let Some(ref err) = job.error {
            line.push_str(&format!(" - {}", err));
        }
        line
    }

    /// Print terminal summary
    pub fn print_summary(summary: &BatchSummary) {
        println!("\n{}", "═".repeat(80).white());
        println!("{}", "Render Batch".bold());
        println!("{}", "═".repeat(80).white());
        println!("  {} {}", "Timestamp:".white(), summary.timestamp.cyan());
        println!("  {} {}", "Discovered:".white(), summary.discovered.to_string().cyan());
        println!("  {} {}", "Attempted:".white(), summary.attempted.to_string().cyan());
        println!(
            "  {} {} ({:.1}%)",
            "Completed:".white(),
            summary.completed.to_string().green(),
            summary.success_rate()
        );
        println!(
            "  {} {}",
            "Timed out:".white(),
            if summary.timed_out > 0 {
                summary.timed_out.to_string().yellow()
            } else {
                summary.timed_out.to_string().green()
            }
        );
        println!(
            "  {} {}",
            "Failed:".white(),
            if summary.failed > 0 {
                summary.failed.to_string().red()
            } else {
                summary.failed.to_string().green()
            }
        );
        println!(
            "  {} {}",
            "Duration:".white(),
            Self::format_duration(summary.duration)
        );

        if let Some(ref reason) = summary.aborted {
            println!("\n  {} {}", "Aborted:".red().bold(), reason);
        }

        let timed_out: Vec<_> = summary
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::TimedOut)
            .collect();
        if !timed_out.is_empty() {
            println!("\n{}", "Timed out objects".yellow().bold());
            for job in timed_out {
                println!("  {}", job.object.display());
            }
        }

        println!("{}", "═".repeat(80).white());
    }

    /// Report a fatal error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "Error:".red().bold(), message);
    }

    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let secs = duration.as_secs_f64();
        if secs < 1.0 {
            format!("{:.0}ms", secs * 1_000.0)
        } else if secs < 120.0 {
            format!("{:.2}s", secs)
        } else {
            let total = duration.as_secs();
            format!("{}m{:02}s", total / 60, total % 60)
        }
    }
}
