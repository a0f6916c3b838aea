// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Slide data structures.
//!
//! A slide is either a media composition (foreground and background media
//! lists) or a waypoint list (GPS coordinates as free text). Each variant
//! knows how to write itself into a project document and how to populate
//! itself from one.

use crate::error::{ProjectError, Result};
use crate::util::paths;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Discriminator literal for media composition slides.
pub const PHOTO_SLIDE: &str = "photo_slide";
/// Discriminator literal for waypoint list slides.
pub const GPS_SLIDE: &str = "gps_slide";

/// Stable handle for a slide inside a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlideId(pub(crate) u64);

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlideKind {
    #[default]
    MediaComposition,
    WaypointList,
}

impl SlideKind {
    /// The `type` literal written to project files.
    pub fn type_literal(self) -> &'static str {
        match self {
            SlideKind::MediaComposition => PHOTO_SLIDE,
            SlideKind::WaypointList => GPS_SLIDE,
        }
    }

    /// Pick the slide kind named by a slide document's `type` field.
    pub fn from_document(doc: &Value) -> Result<Self> {
        match doc.get("type").and_then(Value::as_str) {
            Some(PHOTO_SLIDE) => Ok(SlideKind::MediaComposition),
            Some(GPS_SLIDE) => Ok(SlideKind::WaypointList),
            Some(other) => Err(ProjectError::UnknownSlideType {
                found: Some(other.to_string()),
            }),
            None => Err(ProjectError::UnknownSlideType { found: None }),
        }
    }
}

/// Foreground and background media shown together on one slide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaComposition {
    pub foreground_paths: Vec<String>,
    pub background_paths: Vec<String>,
}

/// GPS waypoints, each kept as the literal text the user entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaypointList {
    pub coordinates: Vec<String>,
}

/// Variant payload of a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideContent {
    Media(MediaComposition),
    Waypoints(WaypointList),
}

impl SlideContent {
    fn empty(kind: SlideKind) -> Self {
        match kind {
            SlideKind::MediaComposition => SlideContent::Media(MediaComposition::default()),
            SlideKind::WaypointList => SlideContent::Waypoints(WaypointList::default()),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            SlideContent::Media(media) => {
                media.foreground_paths.is_empty() && media.background_paths.is_empty()
            }
            SlideContent::Waypoints(waypoints) => waypoints.coordinates.is_empty(),
        }
    }
}

// On-disk shape of each variant. Serialization order follows field order.
#[derive(Serialize)]
struct PhotoSlideOut<'a> {
    #[serde(rename = "type")]
    slide_type: &'static str,
    name: &'a str,
    foreground_paths: &'a [String],
    background_paths: &'a [String],
}

#[derive(Serialize)]
struct GpsSlideOut<'a> {
    #[serde(rename = "type")]
    slide_type: &'static str,
    name: &'a str,
    gps_coordinates: &'a [String],
}

#[derive(Deserialize)]
struct PhotoSlideIn {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    foreground_paths: Option<Vec<String>>,
    #[serde(default)]
    background_paths: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct GpsSlideIn {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    gps_coordinates: Option<Vec<String>>,
}

/// One slide of the story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideEntry {
    id: SlideId,
    /// Label shown to the user. Cosmetic, never used as identity.
    pub name: String,
    content: SlideContent,
    /// Project file this slide was loaded from, for resolving relative paths.
    source: Option<PathBuf>,
}

impl SlideEntry {
    pub(crate) fn new(id: SlideId, kind: SlideKind, name: String) -> Self {
        Self {
            id,
            name,
            content: SlideContent::empty(kind),
            source: None,
        }
    }

    /// Stable handle of this slide within its collection.
    pub fn id(&self) -> SlideId {
        self.id
    }

    /// Which slide variant this is.
    pub fn kind(&self) -> SlideKind {
        match self.content {
            SlideContent::Media(_) => SlideKind::MediaComposition,
            SlideContent::Waypoints(_) => SlideKind::WaypointList,
        }
    }

    /// Variant-specific content.
    pub fn content(&self) -> &SlideContent {
        &self.content
    }

    /// Mutable variant-specific content; the variant itself cannot change.
    pub fn content_mut(&mut self) -> &mut SlideContent {
        &mut self.content
    }

    /// Project file the slide was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// True when the slide holds no paths or coordinates.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Append a foreground media path. Ignored on waypoint slides.
    pub fn add_foreground_path(&mut self, path: impl Into<String>) -> bool {
        match &mut self.content {
            SlideContent::Media(media) => {
                media.foreground_paths.push(path.into());
                true
            }
            SlideContent::Waypoints(_) => false,
        }
    }

    /// Append a background media path. Ignored on waypoint slides.
    pub fn add_background_path(&mut self, path: impl Into<String>) -> bool {
        match &mut self.content {
            SlideContent::Media(media) => {
                media.background_paths.push(path.into());
                true
            }
            SlideContent::Waypoints(_) => false,
        }
    }

    /// Append a coordinate line. Ignored on media slides.
    pub fn add_coordinate(&mut self, text: impl Into<String>) -> bool {
        match &mut self.content {
            SlideContent::Waypoints(waypoints) => {
                waypoints.coordinates.push(text.into());
                true
            }
            SlideContent::Media(_) => false,
        }
    }

    /// Serialize this slide into its project document form.
    pub fn serialize(&self) -> Result<Value> {
        let value = match &self.content {
            SlideContent::Media(media) => serde_json::to_value(PhotoSlideOut {
                slide_type: PHOTO_SLIDE,
                name: &self.name,
                foreground_paths: &media.foreground_paths,
                background_paths: &media.background_paths,
            })?,
            SlideContent::Waypoints(waypoints) => serde_json::to_value(GpsSlideOut {
                slide_type: GPS_SLIDE,
                name: &self.name,
                gps_coordinates: &waypoints.coordinates,
            })?,
        };
        Ok(value)
    }

    /// Populate an empty slide from a slide document.
    ///
    /// Paths are kept exactly as written; `project_file` is remembered so
    /// readers can resolve them later with [`SlideEntry::resolved_media`].
    /// Unknown fields are ignored, missing ones read as empty. A `type`
    /// naming another variant is rejected.
    pub fn deserialize(&mut self, doc: &Value, project_file: &Path) -> Result<()> {
        if !self.content.is_empty() {
            log::error!("Refusing to load into non-empty slide '{}'", self.name);
            return Err(ProjectError::NonEmptyTarget {
                name: self.name.clone(),
            });
        }
        if !doc.is_object() {
            return Err(ProjectError::InvalidDocument(
                "slide entry is not an object".to_string(),
            ));
        }
        let expected = self.kind().type_literal();
        if let Some(found) = doc.get("type") {
            if found.as_str() != Some(expected) {
                return Err(ProjectError::InvalidDocument(format!(
                    "slide type {} does not match {}",
                    found, expected
                )));
            }
        }

        match &mut self.content {
            SlideContent::Media(media) => {
                let parsed = PhotoSlideIn::deserialize(doc)?;
                self.name = parsed.name.unwrap_or_default();
                media.foreground_paths = parsed.foreground_paths.unwrap_or_default();
                media.background_paths = parsed.background_paths.unwrap_or_default();
            }
            SlideContent::Waypoints(waypoints) => {
                let parsed = GpsSlideIn::deserialize(doc)?;
                self.name = parsed.name.unwrap_or_default();
                waypoints.coordinates = parsed.gps_coordinates.unwrap_or_default();
            }
        }
        self.source = Some(project_file.to_path_buf());
        Ok(())
    }

    /// Media paths resolved against the project file the slide came from.
    ///
    /// Returns `(foreground, background)`; slides never loaded from a file
    /// keep their paths as entered. Waypoint slides yield two empty lists.
    pub fn resolved_media(&self) -> (Vec<String>, Vec<String>) {
        let SlideContent::Media(media) = &self.content else {
            return (Vec::new(), Vec::new());
        };
        let resolve_all = |list: &[String]| -> Vec<String> {
            match &self.source {
                Some(source) => list
                    .iter()
                    .map(|p| paths::resolve(p, source).to_string_lossy().into_owned())
                    .collect(),
                None => list.to_vec(),
            }
        };
        (
            resolve_all(&media.foreground_paths),
            resolve_all(&media.background_paths),
        )
    }
}
