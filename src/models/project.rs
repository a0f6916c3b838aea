// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state management.
//!
//! A project is the background selection plus the ordered slides. It
//! serializes to the JSON document the renderer reads:
//!
//! ```json
//! { "version": "0.1", "background": "White", "slides": [ ... ] }
//! ```

use super::collection::SlideCollection;
use super::slide::{SlideContent, SlideEntry, SlideKind};
use crate::error::{ProjectError, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Format version written to every project file.
pub const FORMAT_VERSION: &str = "0.1";

/// Complete project data for serialization.
#[derive(Debug, Clone)]
pub struct ProjectDocument {
    background: String,
    background_choices: Vec<String>,
    /// Seconds per slide handed to the renderer; omitted from the file when unset.
    pub default_slide_duration: Option<f64>,
    pub slides: SlideCollection,
}

impl ProjectDocument {
    /// Create an empty project with no slides.
    ///
    /// `background` falls back to the first choice when it is not one of
    /// `background_choices`.
    pub fn new(background_choices: Vec<String>, background: &str) -> Self {
        let background = if background_choices.iter().any(|c| c == background) {
            background.to_string()
        } else {
            background_choices.first().cloned().unwrap_or_default()
        };
        Self {
            background,
            background_choices,
            default_slide_duration: None,
            slides: SlideCollection::new(),
        }
    }

    /// Create a project holding the single empty media slide a new story starts with.
    pub fn with_default_slide(background_choices: Vec<String>, background: &str) -> Self {
        let mut project = Self::new(background_choices, background);
        let entry = project.slides.create_entry(SlideKind::MediaComposition);
        project.slides.insert(entry);
        project.slides.drain_events();
        project
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn background_choices(&self) -> &[String] {
        &self.background_choices
    }

    /// Select a background. Unknown names leave the selection unchanged.
    pub fn set_background(&mut self, background: &str) -> bool {
        if self.background_choices.iter().any(|c| c == background) {
            self.background = background.to_string();
            true
        } else {
            false
        }
    }

    /// True while the project is still the untouched single empty slide.
    pub fn is_pristine(&self) -> bool {
        let mut slides = self.slides.iter();
        match (slides.next(), slides.next()) {
            (Some(only), None) => only.kind() == SlideKind::MediaComposition && only.is_empty(),
            _ => false,
        }
    }

    /// Serialize the whole project into its JSON document.
    pub fn serialize(&self) -> Result<Value> {
        let slides = self
            .slides
            .iter()
            .map(SlideEntry::serialize)
            .collect::<Result<Vec<_>>>()?;
        Ok(self.wrap(slides))
    }

    /// Like [`ProjectDocument::serialize`], with media paths of loaded
    /// slides resolved against their project file.
    ///
    /// This is the document handed to the renderer, which may read it from
    /// a temporary file far away from the original project.
    pub fn render_document(&self) -> Result<Value> {
        let slides = self
            .slides
            .iter()
            .map(|entry| {
                let mut value = entry.serialize()?;
                if let (SlideContent::Media(_), Some(obj)) = (entry.content(), value.as_object_mut()) {
                    let (foreground, background) = entry.resolved_media();
                    obj.insert("foreground_paths".to_string(), Value::from(foreground));
                    obj.insert("background_paths".to_string(), Value::from(background));
                }
                Ok(value)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.wrap(slides))
    }

    /// Load a project document, appending its slides after the existing ones.
    ///
    /// The load is all-or-nothing: every slide is built first and the
    /// collection only changes once all of them succeed. Returns the number
    /// of slides added.
    pub fn deserialize(&mut self, doc: &Value, source_file: &Path) -> Result<usize> {
        let root = doc
            .as_object()
            .ok_or_else(|| ProjectError::InvalidDocument("top level is not an object".to_string()))?;

        match root.get("version").and_then(Value::as_str) {
            Some(FORMAT_VERSION) => {}
            Some(other) => log::warn!(
                "Project {} has format version {}, expected {}",
                source_file.display(),
                other,
                FORMAT_VERSION
            ),
            None => log::warn!("Project {} has no format version", source_file.display()),
        }

        let slide_docs: &[Value] = match root.get("slides") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => &[],
            Some(_) => {
                return Err(ProjectError::InvalidDocument(
                    "\"slides\" is not an array".to_string(),
                ))
            }
        };

        let mut loaded = Vec::with_capacity(slide_docs.len());
        for slide_doc in slide_docs {
            loaded.push(self.slides.create_from_document(slide_doc, source_file)?);
        }

        if let Some(background) = root.get("background").and_then(Value::as_str) {
            if !self.set_background(background) {
                log::warn!("Ignoring unknown background '{}'", background);
            }
        }
        if let Some(duration) = root.get("default_slide_duration").and_then(parse_duration) {
            self.default_slide_duration = Some(duration);
        }

        let added = loaded.len();
        for entry in loaded {
            self.slides.insert(entry);
        }
        log::info!("Loaded {} slides from {}", added, source_file.display());
        Ok(added)
    }

    fn wrap(&self, slides: Vec<Value>) -> Value {
        let mut root = Map::new();
        root.insert("version".to_string(), Value::from(FORMAT_VERSION));
        root.insert("background".to_string(), Value::from(self.background.as_str()));
        if let Some(duration) = self.default_slide_duration {
            root.insert("default_slide_duration".to_string(), Value::from(duration));
        }
        root.insert("slides".to_string(), Value::Array(slides));
        Value::Object(root)
    }
}

/// Read a slide duration in seconds, as a number or a numeric string.
///
/// Only finite positive values are accepted; anything else would not
/// survive a write back to JSON.
fn parse_duration(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(duration) if duration.is_finite() && duration > 0.0 => Some(duration),
        _ => {
            log::warn!("Ignoring invalid default_slide_duration {}", value);
            None
        }
    }
}
