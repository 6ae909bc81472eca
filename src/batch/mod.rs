// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch rendering of photometric-stereo data through headless Blender

pub mod config;
pub mod discovery;
pub mod driver;
pub mod job;
pub mod launcher;
pub mod reporter;
pub mod types;

pub use config::{default_blender_path, BatchConfig, LimitMode, RenderOptions, DEFAULT_CONFIG_FILE};
pub use discovery::MeshDiscovery;
pub use driver::{planned_jobs, BatchDriver};
pub use job::{RenderCommand, RenderJob};
pub use launcher::{DryRunLauncher, JobOutcome, Launcher, SystemLauncher};
pub use reporter::BatchReporter;
pub use types::{BatchSummary, JobRecord, JobStatus};
