// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media path resolution relative to a project file.
//!
//! Project files store media paths either absolute or relative to the
//! directory the project file lives in. Resolution is purely lexical: no
//! file is touched, and a resolved path may point nowhere.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against the directory containing `project_file`.
///
/// Absolute paths are returned unchanged. Relative paths are joined onto
/// the project file's directory and normalized (`.` dropped, `..` folded).
/// If the project file itself was given relatively, the current working
/// directory anchors the result.
pub fn resolve(path: &str, project_file: &Path) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return candidate.to_path_buf();
    }

    let base = project_file.parent().unwrap_or_else(|| Path::new(""));
    let joined = base.join(candidate);
    let anchored = if joined.is_absolute() {
        joined
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(joined),
            Err(_) => joined,
        }
    };

    normalize(&anchored)
}

/// Fold `.` and `..` components without consulting the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                // `..` above the root stays at the root; above a relative start it is kept
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
