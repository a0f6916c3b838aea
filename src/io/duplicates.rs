// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Placeholder frame replacement.
//!
//! When Blender renders with duplicate skipping enabled, frames identical
//! to their predecessor are written as empty placeholder files. This
//! module walks a numbered frame sequence and fills every placeholder with
//! the last real frame before it.

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// A placeholder and the frame that should take its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub placeholder: PathBuf,
    pub source: PathBuf,
}

fn index_pattern() -> Result<Regex> {
    // last run of digits in the path
    Regex::new(r"(\d+)(\D*)$").context("Invalid frame index pattern")
}

/// Path of the frame after `path`, keeping the zero padding of its index.
fn increment_with(pattern: &Regex, path: &Path) -> Result<PathBuf> {
    let text = path.to_string_lossy();
    let caps = pattern
        .captures(&text)
        .ok_or_else(|| anyhow!("No frame index found in {}", path.display()))?;
    let digits = caps.get(1).ok_or_else(|| anyhow!("No frame index in {}", path.display()))?;
    let index: u64 = digits
        .as_str()
        .parse()
        .with_context(|| format!("Frame index out of range in {}", path.display()))?;

    let width = digits.as_str().len();
    let next = format!("{:0width$}", index + 1, width = width);
    let mut out = String::with_capacity(text.len() + 1);
    out.push_str(&text[..digits.start()]);
    out.push_str(&next);
    out.push_str(&text[digits.end()..]);
    Ok(PathBuf::from(out))
}

/// Collect the placeholders in the sequence starting at `start`.
///
/// The walk stops at the first missing frame. Placeholders with no real
/// frame before them are reported and skipped.
pub fn find_replacements(start: &Path) -> Result<Vec<Replacement>> {
    if !start.is_file() {
        bail!("Could not find input file: {}", start.display());
    }

    let pattern = index_pattern()?;
    let mut replacements = Vec::new();
    let mut last_valid: Option<PathBuf> = None;
    let mut current = start.to_path_buf();

    while current.is_file() {
        let size = std::fs::metadata(&current)
            .with_context(|| format!("Failed to stat {}", current.display()))?
            .len();
        if size == 0 {
            match &last_valid {
                Some(source) => replacements.push(Replacement {
                    placeholder: current.clone(),
                    source: source.clone(),
                }),
                None => log::warn!(
                    "Cannot replace {}: no valid preceding frame",
                    current.display()
                ),
            }
        } else {
            last_valid = Some(current.clone());
        }
        current = increment_with(&pattern, &current)?;
    }

    Ok(replacements)
}

/// Replace each placeholder with a copy (or symlink) of its source frame.
pub fn apply(replacements: &[Replacement], symlink: bool) -> Result<()> {
    for r in replacements {
        std::fs::remove_file(&r.placeholder)
            .with_context(|| format!("Failed to remove placeholder {}", r.placeholder.display()))?;
        if symlink {
            link(&r.source, &r.placeholder)?;
        } else {
            std::fs::copy(&r.source, &r.placeholder).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    r.source.display(),
                    r.placeholder.display()
                )
            })?;
        }
    }
    log::info!("Replaced {} placeholder frames", replacements.len());
    Ok(())
}

/// Find and fill all placeholders of the sequence starting at `start`.
pub fn replace_placeholders(start: &Path, symlink: bool) -> Result<usize> {
    let replacements = find_replacements(start)?;
    if replacements.is_empty() {
        log::info!("0 placeholders found. Nothing to do.");
        return Ok(0);
    }
    apply(&replacements, symlink)?;
    Ok(replacements.len())
}

#[cfg(unix)]
fn link(source: &Path, target: &Path) -> Result<()> {
    std::os::unix::fs::symlink(source, target)
        .with_context(|| format!("Failed to link {}", target.display()))
}

#[cfg(windows)]
fn link(source: &Path, target: &Path) -> Result<()> {
    std::os::windows::fs::symlink_file(source, target)
        .with_context(|| format!("Failed to link {}", target.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_frames(dir: &Path, sizes: &[usize]) {
        for (i, size) in sizes.iter().enumerate() {
            let path = dir.join(format!("{:04}.png", i + 1));
            fs::write(path, vec![b'x'; *size]).unwrap();
        }
    }

    fn increment_path(path: &Path) -> Result<PathBuf> {
        increment_with(&index_pattern()?, path)
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    #[test]
    fn test_increment_keeps_padding() {
        assert_eq!(
            increment_path(Path::new("/out/0009.png")).unwrap(),
            PathBuf::from("/out/0010.png")
        );
        assert_eq!(
            increment_path(Path::new("/render2/frame_99.png")).unwrap(),
            PathBuf::from("/render2/frame_100.png")
        );
        assert!(increment_path(Path::new("/out/frame.png")).is_err());
    }

    #[test]
    fn test_replaces_with_last_valid_frame() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), &[3, 0, 0, 5, 0]);

        let start = dir.path().join("0001.png");
        let found = find_replacements(&start).unwrap();
        let pairs: Vec<(String, String)> = found
            .iter()
            .map(|r| (file_name(&r.placeholder), file_name(&r.source)))
            .collect();
        let expected: Vec<(String, String)> = [
            ("0002.png", "0001.png"),
            ("0003.png", "0001.png"),
            ("0005.png", "0004.png"),
        ]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
        assert_eq!(pairs, expected);

        assert_eq!(replace_placeholders(&start, false).unwrap(), 3);
        assert_eq!(fs::read(dir.path().join("0003.png")).unwrap(), b"xxx");
        assert_eq!(fs::read(dir.path().join("0005.png")).unwrap(), b"xxxxx");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_replacement() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), &[3, 0]);

        let start = dir.path().join("0001.png");
        assert_eq!(replace_placeholders(&start, true).unwrap(), 1);

        let placeholder = dir.path().join("0002.png");
        let meta = fs::symlink_metadata(&placeholder).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(fs::read_link(&placeholder).unwrap(), start);
        assert_eq!(fs::read(&placeholder).unwrap(), b"xxx");
    }

    #[test]
    fn test_leading_placeholder_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), &[0, 2, 0]);

        let found = find_replacements(&dir.path().join("0001.png")).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].placeholder.ends_with("0003.png"));
    }

    #[test]
    fn test_missing_start_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_replacements(&dir.path().join("0001.png")).is_err());
    }
}
