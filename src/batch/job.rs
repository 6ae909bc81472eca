// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Render jobs and the Blender command line they turn into

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use super::config::{BatchConfig, RenderOptions};

/// One object to render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    /// Position in discovery order
    pub index: usize,
    pub object: PathBuf,
    pub output_dir: PathBuf,
    pub views: u32,
    pub lights_per_view: u32,
    /// Time budget per view
    pub view_budget: Duration,
    pub render: RenderOptions,
}

impl RenderJob {
    pub fn from_config(index: usize, object: impl Into<PathBuf>, config: &BatchConfig) -> Self {
        Self {
            index,
            object: object.into(),
            output_dir: config.output_dir.clone(),
            views: config.views,
            lights_per_view: config.lights_per_view,
            view_budget: config.view_budget(),
            render: config.render.clone(),
        }
    }

    /// Wall-clock limit for the whole job
    pub fn timeout(&self) -> Duration {
        self.view_budget.saturating_mul(self.views)
    }

    /// Name of the directory holding the mesh; the render script names its
    /// output folder after it
    pub fn model_identifier(&self) -> String {
        self.object
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Folder the render script writes this object's images into
    pub fn expected_output_dir(&self) -> PathBuf {
        self.output_dir.join(self.model_identifier())
    }

    /// Build the headless Blender invocation for this job
    pub fn command(&self, blender: &str, script: &Path) -> RenderCommand {
        let mut cmd = RenderCommand::new(blender);

        // Background mode, run the script, then hand the rest to the script
        cmd.arg("-b").arg("-P").arg(script).arg("--");

        cmd.arg("-obj").arg(&self.object);
        cmd.arg("-output_folder").arg(&self.output_dir);
        cmd.arg("--views").arg(self.views.to_string());
        cmd.arg("-num_of_lights").arg(self.lights_per_view.to_string());

        if let Some(scale) = self.render.scale {
            cmd.arg("--scale").arg(scale.to_string());
        }
        if let Some(depth_scale) = self.render.depth_scale {
            cmd.arg("--depth_scale").arg(depth_scale.to_string());
        }
        if let Some(color_depth) = self.render.color_depth {
            cmd.arg("--color_depth").arg(color_depth.to_string());
        }
        if let Some(resolution) = self.render.resolution {
            cmd.arg("-resolution").arg(resolution.to_string());
        }

        cmd
    }
}

/// Program plus a list of discrete arguments. Never goes through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl RenderCommand {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Convert into a `std::process::Command` ready to spawn
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for RenderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Quote an argument for display only
fn quote(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if s.is_empty() {
        "\"\"".to_string()
    } else if s.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s.into_owned()
    }
}
