// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end batch runs against a stand-in Blender executable

#![cfg(unix)]

use psbatch::batch::{BatchConfig, BatchDriver, JobStatus, LimitMode, SystemLauncher};
use psbatch::{BatchError, RunLog};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Mimics the render script's contract: records each invocation, fails for
/// objects whose path mentions "fail", hangs for "hang", otherwise creates
/// the first view folder.
const FAKE_BLENDER: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -obj) obj="$2"; shift ;;
    -output_folder) out="$2"; shift ;;
    --views) views="$2"; shift ;;
  esac
  shift
done
mkdir -p "$out"
echo "$obj" >> "$out/invocations.txt"
case "$obj" in
  *fail*) exit 4 ;;
  *hang*) exec sleep 30 ;;
esac
name=$(basename "$(dirname "$obj")")
mkdir -p "$out/$name/obj_rotation0"
echo "$views" > "$out/$name/views.txt"
exit 0
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(objects: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("objects");
        fs::create_dir_all(&root).unwrap();
        for name in objects {
            let obj_dir = root.join(name);
            fs::create_dir_all(&obj_dir).unwrap();
            fs::write(obj_dir.join("model.obj"), "v 0 0 0\n").unwrap();
        }

        let blender = dir.path().join("fake-blender");
        fs::write(&blender, FAKE_BLENDER).unwrap();
        fs::set_permissions(&blender, fs::Permissions::from_mode(0o755)).unwrap();

        fs::write(dir.path().join("render_blender.py"), "# stand-in\n").unwrap();

        Self { dir }
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("objects")
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join("run.log")
    }

    fn config(&self) -> BatchConfig {
        let mut config = BatchConfig::default();
        config.object_root = self.root();
        config.output_dir = self.output();
        config.blender_path = self.dir.path().join("fake-blender").display().to_string();
        config.render_script = self.dir.path().join("render_blender.py");
        config.log_file = self.log_path();
        config.views = 1;
        config.view_timeout_secs = 1;
        config
    }

    fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.output().join("invocations.txt"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn driver(config: BatchConfig) -> BatchDriver<SystemLauncher> {
    let log = RunLog::open(&config.log_file).unwrap();
    let launcher = SystemLauncher::new()
        .quiet(true)
        .with_poll_interval(Duration::from_millis(20));
    BatchDriver::new(config, launcher, log)
}

fn ends_with_object(line: &str, name: &str) -> bool {
    Path::new(line).ends_with(Path::new(name).join("model.obj"))
}

#[test]
fn test_renders_every_object_at_depth_one() {
    let ws = Workspace::new(&["chair", "lamp", "table"]);
    // Neither of these should be picked up
    fs::write(ws.root().join("loose.obj"), "v 0 0 0\n").unwrap();
    fs::create_dir_all(ws.root().join("lamp").join("parts")).unwrap();
    fs::write(ws.root().join("lamp").join("parts").join("bulb.obj"), "v 0 0 0\n").unwrap();

    let mut config = ws.config();
    config.views = 6;
    let summary = driver(config).run().unwrap();

    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.completed, 3);

    let calls = ws.invocations();
    assert_eq!(calls.len(), 3);
    assert!(ends_with_object(&calls[0], "chair"));
    assert!(ends_with_object(&calls[1], "lamp"));
    assert!(ends_with_object(&calls[2], "table"));

    for name in ["chair", "lamp", "table"] {
        assert!(ws.output().join(name).join("obj_rotation0").is_dir());
        let views = fs::read_to_string(ws.output().join(name).join("views.txt")).unwrap();
        assert_eq!(views.trim(), "6");
    }

    let log = ws.log_lines();
    assert_eq!(log.iter().filter(|l| l.contains("Rendering")).count(), 3);
    assert!(log.last().unwrap().contains("Batch finished"));
}

#[test]
fn test_timeout_skips_to_next_object() {
    let ws = Workspace::new(&["a_box", "b_hang", "c_cone"]);

    let summary = driver(ws.config()).run().unwrap();

    assert_eq!(ws.invocations().len(), 3);
    assert_eq!(summary.timed_out, 1);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.jobs[1].status, JobStatus::TimedOut);
    assert!(ws.output().join("c_cone").join("obj_rotation0").is_dir());
    assert!(ws
        .log_lines()
        .iter()
        .any(|l| l.contains("WARN") && l.contains("Timed out") && l.contains("b_hang")));
}

#[test]
fn test_failure_aborts_remaining_objects() {
    let ws = Workspace::new(&["a_box", "b_fail", "c_cone"]);

    let mut driver = driver(ws.config());
    let err = driver.run().unwrap_err();

    match err {
        BatchError::JobFailed { object, code, .. } => {
            assert_eq!(code, Some(4));
            assert!(object.ends_with("b_fail/model.obj"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(ws.invocations().len(), 2);
    assert!(!ws.output().join("c_cone").exists());

    let log = ws.log_lines();
    assert!(log.iter().any(|l| l.contains("ERROR") && l.contains("-obj")));
    assert!(log.last().unwrap().contains("FATAL"));
}

#[test]
fn test_missing_script_starts_nothing() {
    let ws = Workspace::new(&["a_box", "b_ball"]);
    let mut config = ws.config();
    config.render_script = ws.dir.path().join("missing.py");

    let err = driver(config).run().unwrap_err();

    assert!(matches!(err, BatchError::MissingScript(_)));
    assert!(ws.invocations().is_empty());
    assert!(ws.log_lines().iter().any(|l| l.contains("FATAL") && l.contains("missing.py")));
}

#[test]
fn test_object_limit() {
    let ws = Workspace::new(&["a", "b", "c", "d", "e"]);

    let mut config = ws.config();
    config.max_objects = Some(2);
    driver(config.clone()).run().unwrap();
    assert_eq!(ws.invocations().len(), 2);

    fs::remove_file(ws.output().join("invocations.txt")).unwrap();
    config.limit_mode = LimitMode::Inclusive;
    driver(config).run().unwrap();
    assert_eq!(ws.invocations().len(), 3);
}

#[test]
fn test_paths_with_spaces() {
    let ws = Workspace::new(&["old chair"]);

    let summary = driver(ws.config()).run().unwrap();

    assert_eq!(summary.completed, 1);
    assert!(ws.output().join("old chair").join("obj_rotation0").is_dir());
}

#[test]
fn test_log_is_appended_across_runs() {
    let ws = Workspace::new(&["a"]);

    driver(ws.config()).run().unwrap();
    let first = ws.log_lines().len();
    driver(ws.config()).run().unwrap();

    assert_eq!(ws.log_lines().len(), first * 2);
}

#[test]
fn test_oversized_budget_runs_without_deadline() {
    let ws = Workspace::new(&["a_box", "b_ball"]);
    let mut config = ws.config();
    config.views = 4;
    config.view_timeout_secs = u64::MAX / 2;

    let summary = driver(config).run().unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.timed_out, 0);
    assert_eq!(ws.invocations().len(), 2);
    assert_eq!(summary.jobs[1].output_dir, ws.output().join("b_ball"));
}
