// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application settings.
//!
//! Settings come from a JSON file; every field is optional and falls back
//! to a built-in default. The file is looked up in this order:
//!
//! 1. `--config <file>` on the command line
//! 2. `PHOTOSTORY_CONFIG` environment variable
//! 3. `<platform config dir>/photostory/settings.json`
//!
//! A missing file means defaults. A file that exists but does not parse
//! is an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a settings file.
pub const CONFIG_ENV: &str = "PHOTOSTORY_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backgrounds the renderer knows how to build.
    pub backgrounds: Vec<String>,
    /// Background selected for new projects.
    pub default_background: String,
    /// Blender executable.
    pub blender: String,
    /// Python interpreter, used when an external duplicate script is configured.
    pub python: String,
    /// Optional external duplicate-frame script; the built-in replacement runs when unset.
    pub duplicates_script: Option<PathBuf>,
    /// Fill duplicate frames with symbolic links instead of copies.
    pub symlink_duplicates: bool,
    /// ffmpeg executable.
    pub ffmpeg: String,
    /// x264 constant rate factor for the final video.
    pub crf: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backgrounds: vec!["White".to_string(), "Wood".to_string()],
            default_background: "White".to_string(),
            blender: "blender".to_string(),
            python: "python3".to_string(),
            duplicates_script: None,
            symlink_duplicates: false,
            ffmpeg: "ffmpeg".to_string(),
            crf: 32,
        }
    }
}

impl Settings {
    /// Load settings using the lookup order above.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match settings_path(cli_path, env_path) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from one file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings {}", path.display()))?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings.validated())
    }

    // An empty background list would leave nothing to select.
    fn validated(mut self) -> Self {
        if self.backgrounds.is_empty() {
            log::warn!("Settings list no backgrounds, using defaults");
            self.backgrounds = Self::default().backgrounds;
        }
        if !self.backgrounds.contains(&self.default_background) {
            self.default_background = self.backgrounds[0].clone();
        }
        self
    }
}

fn settings_path(cli_path: Option<&Path>, env_path: Option<PathBuf>) -> Option<PathBuf> {
    cli_path
        .map(Path::to_path_buf)
        .or(env_path)
        .or_else(|| dirs_next::config_dir().map(|d| d.join("photostory").join("settings.json")))
}
