// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project file import and export.
//!
//! Project files are pretty-printed JSON. Import appends the file's slides
//! to the open project; see [`import_json`].

use crate::models::project::ProjectDocument;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Export the project to a JSON file.
pub fn export_json(project: &ProjectDocument, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&project.serialize()?)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write project file {}", path.display()))?;
    log::info!("Exported {} slides to {}", project.slides.count(), path.display());
    Ok(())
}

/// Import a JSON project file into `project`.
///
/// If the project is still the untouched single empty slide it starts
/// with, that placeholder is dropped before the imported slides are
/// appended. Returns the number of slides added.
pub fn import_json(project: &mut ProjectDocument, path: &Path) -> Result<usize> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read project file {}", path.display()))?;
    let doc: serde_json::Value = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse project file {}", path.display()))?;

    let placeholder = if project.is_pristine() {
        project.slides.iter().next().map(|e| e.id())
    } else {
        None
    };

    let added = project
        .deserialize(&doc, path)
        .with_context(|| format!("Failed to load project file {}", path.display()))?;

    if let Some(id) = placeholder {
        project.slides.remove(id)?;
    }
    Ok(added)
}

/// Write the render document to a temporary file.
///
/// The file is deleted when the returned handle drops, so keep it alive
/// until whatever reads it has finished.
pub fn write_temp(project: &ProjectDocument) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("photostory-")
        .suffix(".json")
        .tempfile()
        .context("Could not create temporary project file")?;
    let json = serde_json::to_string_pretty(&project.render_document()?)?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    log::debug!("Wrote temporary project file {}", file.path().display());
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slide::{SlideContent, SlideKind};

    fn choices() -> Vec<String> {
        vec!["White".to_string(), "Wood".to_string()]
    }

    #[test]
    fn test_export_import_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.json");

        let mut project = ProjectDocument::new(choices(), "Wood");
        let mut entry = project.slides.create_entry(SlideKind::MediaComposition);
        entry.add_foreground_path("imgs/a.png");
        project.slides.insert(entry);
        export_json(&project, &path).unwrap();

        let mut loaded = ProjectDocument::with_default_slide(choices(), "White");
        assert_eq!(import_json(&mut loaded, &path).unwrap(), 1);
        assert_eq!(loaded.slides.count(), 1);
        assert_eq!(loaded.background(), "Wood");

        let entry = loaded.slides.iter().next().unwrap();
        assert_eq!(entry.source(), Some(path.as_path()));
        let (fg, _) = entry.resolved_media();
        assert_eq!(fg, vec![dir.path().join("imgs/a.png").to_string_lossy().into_owned()]);
    }

    #[test]
    fn test_import_appends_to_edited_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.json");
        std::fs::write(
            &path,
            r#"{"version":"0.1","background":"White","slides":[{"type":"gps_slide","name":"r","gps_coordinates":["1, 2"]}]}"#,
        )
        .unwrap();

        let mut project = ProjectDocument::with_default_slide(choices(), "White");
        let id = project.slides.iter().next().unwrap().id();
        project.slides.get_mut(id).unwrap().add_foreground_path("x.png");

        import_json(&mut project, &path).unwrap();
        assert_eq!(project.slides.count(), 2);
        let last = project.slides.iter().last().unwrap();
        assert!(matches!(last.content(), SlideContent::Waypoints(w) if w.coordinates == ["1, 2"]));
    }

    #[test]
    fn test_failed_import_keeps_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"slides":[{"type":"bogus_slide"}]}"#).unwrap();

        let mut project = ProjectDocument::with_default_slide(choices(), "White");
        assert!(import_json(&mut project, &path).is_err());
        assert!(project.is_pristine());
    }

    #[test]
    fn test_import_missing_file() {
        let mut project = ProjectDocument::new(choices(), "White");
        let err = import_json(&mut project, Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read project file"));
    }

    #[test]
    fn test_write_temp_contains_render_document() {
        let project = ProjectDocument::with_default_slide(choices(), "White");
        let file = write_temp(&project).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["version"], "0.1");
        assert_eq!(value["slides"].as_array().unwrap().len(), 1);
    }
}
