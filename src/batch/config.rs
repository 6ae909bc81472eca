// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch configuration system

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::BatchError;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "render_batch.toml";

/// How the maximum object count is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitMode {
    /// Attempt at most `max_objects` objects
    #[default]
    Exact,
    /// Stop after the object whose zero-based index equals `max_objects`,
    /// so one extra object is attempted
    Inclusive,
}

/// Tuning flags forwarded to the render script when set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Scaling factor applied to the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// Scaling applied to depth output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_scale: Option<f32>,
    /// Bits per channel, 8 or 16
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_depth: Option<u8>,
    /// Width and height of rendered images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u32>,
}

/// Batch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Directory holding one subdirectory per object
    pub object_root: PathBuf,
    /// Root of the rendered dataset
    pub output_dir: PathBuf,
    /// Blender executable
    pub blender_path: String,
    /// Script run inside Blender for every object
    pub render_script: PathBuf,
    /// Mesh file extension, without the dot
    pub mesh_extension: String,
    /// Camera rotations per object
    pub views: u32,
    /// Light directions sampled per view
    pub lights_per_view: u32,
    /// Maximum number of objects, `None` for no limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_objects: Option<usize>,
    pub limit_mode: LimitMode,
    /// Time budget per view, in seconds
    pub view_timeout_secs: u64,
    /// Append-only run log
    pub log_file: PathBuf,
    /// Print commands instead of running them
    pub dry_run: bool,
    /// Show a progress bar
    pub progress: bool,
    /// Verbose output
    pub verbose: bool,
    pub render: RenderOptions,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            object_root: PathBuf::from("objects"),
            output_dir: std::env::temp_dir(),
            blender_path: default_blender_path(),
            render_script: PathBuf::from("render_blender.py"),
            mesh_extension: "obj".to_string(),
            views: 1,
            lights_per_view: 1,
            max_objects: None,
            limit_mode: LimitMode::Exact,
            view_timeout_secs: 300,
            log_file: PathBuf::from("render_batch.log"),
            dry_run: false,
            progress: false,
            verbose: false,
            render: RenderOptions::default(),
        }
    }
}

/// Platform default location of the Blender executable
pub fn default_blender_path() -> String {
    if cfg!(windows) {
        r"C:\Program Files\Blender Foundation\blender\blender.exe".to_string()
    } else {
        // Expected on PATH (snap, package manager or an alias)
        "blender".to_string()
    }
}

impl BatchConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: BatchConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `path`, or `render_batch.toml` when present, then apply
    /// overrides from the environment `lookup`
    pub fn load(path: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };

        config.apply_env_overrides(lookup);
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(blender) = lookup("BLENDER_PATH") {
            self.blender_path = blender;
        }

        if let Some(timeout) = lookup("PSBATCH_VIEW_TIMEOUT") {
            match timeout.trim().parse() {
                Ok(secs) => self.view_timeout_secs = secs,
                Err(_) => log::warn!("Ignoring PSBATCH_VIEW_TIMEOUT={:?}", timeout),
            }
        }

        if let Some(log_file) = lookup("PSBATCH_LOG_FILE") {
            self.log_file = PathBuf::from(log_file);
        }

        if let Some(output_dir) = lookup("PSBATCH_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(output_dir);
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Reject values the render script or the driver cannot work with
    pub fn validate(&self) -> std::result::Result<(), BatchError> {
        if self.views == 0 {
            return Err(BatchError::Config("views must be at least 1".into()));
        }
        if self.lights_per_view == 0 {
            return Err(BatchError::Config("lights per view must be at least 1".into()));
        }
        if self.view_timeout_secs == 0 {
            return Err(BatchError::Config("view timeout must be a positive number of seconds".into()));
        }
        if self.mesh_extension.trim_start_matches('.').is_empty() {
            return Err(BatchError::Config("mesh extension is empty".into()));
        }
        if self.blender_path.trim().is_empty() {
            return Err(BatchError::Config("Blender executable path is empty".into()));
        }
        if let Some(depth) = self.render.color_depth {
            if depth != 8 && depth != 16 {
                return Err(BatchError::Config(format!(
                    "color depth must be 8 or 16, got {}",
                    depth
                )));
            }
        }
        if let Some(scale) = self.render.scale {
            if !(scale > 0.0) {
                return Err(BatchError::Config(format!("scale must be positive, got {}", scale)));
            }
        }
        if let Some(depth_scale) = self.render.depth_scale {
            if !(depth_scale > 0.0) {
                return Err(BatchError::Config(format!(
                    "depth scale must be positive, got {}",
                    depth_scale
                )));
            }
        }
        if self.render.resolution == Some(0) {
            return Err(BatchError::Config("resolution must be positive".into()));
        }
        Ok(())
    }

    /// Mesh extension without a leading dot
    pub fn extension(&self) -> &str {
        self.mesh_extension.trim_start_matches('.')
    }

    pub fn view_budget(&self) -> Duration {
        Duration::from_secs(self.view_timeout_secs)
    }
}
