// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Discovery and command-building benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use psbatch::batch::{BatchConfig, MeshDiscovery, RenderJob};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn build_tree(objects: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    for i in 0..objects {
        let obj_dir = dir.path().join(format!("object_{:05}", i));
        fs::create_dir_all(&obj_dir).unwrap();
        fs::write(obj_dir.join("model.obj"), "v 0 0 0\n").unwrap();
        fs::write(obj_dir.join("model.mtl"), "newmtl a\n").unwrap();
    }
    dir
}

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");

    for count in [100, 1_000] {
        let tree = build_tree(count);
        group.bench_with_input(BenchmarkId::new("objects", count), tree.path(), |b, root| {
            b.iter(|| MeshDiscovery::discover(black_box(root), "obj").unwrap());
        });
    }

    group.finish();
}

fn bench_commands(c: &mut Criterion) {
    let mut config = BatchConfig::default();
    config.views = 12;
    config.lights_per_view = 8;
    config.render.resolution = Some(512);

    let objects: Vec<PathBuf> = (0..1_000)
        .map(|i| PathBuf::from(format!("/data/objects/object_{:05}/model.obj", i)))
        .collect();

    c.bench_function("build_commands", |b| {
        b.iter(|| {
            for (i, object) in objects.iter().enumerate() {
                let job = RenderJob::from_config(i, object, &config);
                black_box(job.command("blender", Path::new("render_blender.py")));
            }
        });
    });
}

criterion_group!(benches, bench_discovery, bench_commands);
criterion_main!(benches);
