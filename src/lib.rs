// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! psbatch
//!
//! Drives headless Blender over a directory of meshes to produce
//! photometric-stereo training data. Each object gets one child process that
//! renders every view and light sample; the driver only handles discovery,
//! timeouts, failure policy and logging.

pub mod batch;
pub mod error;
pub mod runlog;

pub use batch::{
    BatchConfig, BatchDriver, BatchReporter, BatchSummary, DryRunLauncher, JobOutcome, Launcher,
    LimitMode, MeshDiscovery, RenderCommand, RenderJob, SystemLauncher,
};
pub use error::BatchError;
pub use runlog::RunLog;
