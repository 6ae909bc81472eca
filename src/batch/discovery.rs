// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh discovery
//!
//! Objects are laid out one per directory under a root:
//!
//! ```text
//! root/
//!   chair_01/model.obj
//!   lamp_07/model.obj
//! ```
//!
//! Only files exactly one directory below the root are considered. Meshes
//! sitting in the root itself or nested deeper are never picked up.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{BatchError, Result};

/// Mesh discovery system
pub struct MeshDiscovery;

impl MeshDiscovery {
    /// Collect every mesh with the given extension one level below `root`.
    ///
    /// Entries are sorted by file name at each level so runs over the same
    /// tree always visit objects in the same order.
    pub fn discover(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
        // walkdir::Error cannot be built from io::Error, so let the walker report it
        let metadata = match std::fs::metadata(root) {
            Ok(m) => m,
            Err(_) => return Err(Self::walk_error(root)),
        };
        if !metadata.is_dir() {
            return Err(BatchError::NotADirectory(root.to_path_buf()));
        }

        let extension = extension.trim_start_matches('.');
        let mut objects = Vec::new();

        for entry in WalkDir::new(root)
            .min_depth(2)
            .max_depth(2)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| BatchError::Discovery {
                root: root.to_path_buf(),
                source,
            })?;

            if entry.file_type().is_file() && Self::has_extension(entry.path(), extension) {
                objects.push(entry.path().to_path_buf());
            }
        }

        Ok(objects)
    }

    fn has_extension(path: &Path, extension: &str) -> bool {
        path.extension().is_some_and(|ext| ext == extension)
    }

    fn walk_error(root: &Path) -> BatchError {
        match WalkDir::new(root).into_iter().find_map(|e| e.err()) {
            Some(source) => BatchError::Discovery {
                root: root.to_path_buf(),
                source,
            },
            None => BatchError::NotADirectory(root.to_path_buf()),
        }
    }
}
