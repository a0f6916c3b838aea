// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It owns the project, routes panel actions to the
//! slide collection and runs renders on a background thread.

use crate::config::Settings;
use crate::io::render::{BlenderSession, Renderer};
use crate::io::serialization;
use crate::models::{
    collection::CollectionEvent,
    project::ProjectDocument,
    slide::{SlideContent, SlideEntry, SlideId, SlideKind},
};
use crate::ui::{slide_panel, toolbar};
use crate::ui::slide_panel::{SlideAction, Zone};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};

/// Project state captured for undo.
#[derive(Clone)]
struct Snapshot {
    slides: Vec<SlideEntry>,
    background: String,
}

/// History system for undo/redo functionality.
struct History {
    /// Undo stack (past states)
    undo_stack: Vec<Snapshot>,
    /// Redo stack (future states after undo)
    redo_stack: Vec<Snapshot>,
    /// Maximum history size
    max_size: usize,
}

impl History {
    fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: 50,
        }
    }

    /// Save current state before making a change
    fn push(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Main application state.
pub struct PhotostoryApp {
    settings: Settings,
    renderer: Renderer,

    /// The story being edited
    project: ProjectDocument,

    /// File the project was last imported from or exported to
    current_file: Option<PathBuf>,

    /// Unsaved changes since the last import/export
    dirty: bool,

    /// Selected coordinate row per waypoint slide
    selected_rows: HashMap<SlideId, usize>,

    /// Target of the last text edit, so typing collapses into one undo step
    last_text_edit: Option<(SlideId, Option<usize>)>,

    history: History,

    /// Blender windows opened on the project
    sessions: Vec<BlenderSession>,

    /// Receiver for the background render job
    render_job: Option<Receiver<Result<PathBuf, String>>>,

    /// Status line message
    status: Option<String>,

    /// Window title last sent to the viewport
    title: String,
}

impl PhotostoryApp {
    /// Create the application with a fresh project.
    pub fn new(settings: Settings) -> Self {
        let project = new_project(&settings);
        let renderer = Renderer::new(&settings);
        Self {
            settings,
            renderer,
            project,
            current_file: None,
            dirty: false,
            selected_rows: HashMap::new(),
            last_text_edit: None,
            history: History::new(),
            sessions: Vec::new(),
            render_job: None,
            status: None,
            title: String::new(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            slides: self.project.slides.snapshot(),
            background: self.project.background().to_string(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.project.slides.restore(snapshot.slides);
        self.project.set_background(&snapshot.background);
        self.selected_rows.retain(|id, _| self.project.slides.get(*id).is_some());
        self.dirty = true;
    }

    /// Save the project to history before making a change
    fn save_to_history(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
        self.last_text_edit = None;
    }

    fn undo(&mut self) {
        let current = self.snapshot();
        if let Some(previous) = self.history.undo(current) {
            self.restore(previous);
            self.last_text_edit = None;
            log::info!("Undo");
        }
    }

    fn redo(&mut self) {
        let current = self.snapshot();
        if let Some(next) = self.history.redo(current) {
            self.restore(next);
            self.last_text_edit = None;
            log::info!("Redo");
        }
    }

    fn new_story(&mut self) {
        self.project = new_project(&self.settings);
        self.current_file = None;
        self.dirty = false;
        self.selected_rows.clear();
        self.history.clear();
        log::info!("Started a new story");
    }

    fn add_slide(&mut self, kind: SlideKind) {
        self.save_to_history();
        let entry = self.project.slides.create_entry(kind);
        self.project.slides.insert(entry);
    }

    /// Import a project file, appending its slides.
    ///
    /// A failed import leaves the project and the undo history untouched.
    pub fn import_project(&mut self, path: &Path) {
        let before = self.snapshot();
        match serialization::import_json(&mut self.project, path) {
            Ok(added) => {
                self.history.push(before);
                self.last_text_edit = None;
                self.current_file = Some(path.to_path_buf());
                self.status = Some(format!("Imported {} slides from {}", added, path.display()));
            }
            Err(e) => {
                log::error!("Failed to import project: {:#}", e);
                self.status = Some(format!("Import failed: {}", e));
            }
        }
    }

    /// Switch the project background. Returns false when nothing changed.
    fn select_background(&mut self, choice: &str) -> bool {
        if choice == self.project.background() {
            return false;
        }
        let before = self.snapshot();
        if !self.project.set_background(choice) {
            log::warn!("Unknown background '{}'", choice);
            return false;
        }
        self.history.push(before);
        self.last_text_edit = None;
        self.dirty = true;
        true
    }

    fn export_project(&mut self, path: &Path) {
        match serialization::export_json(&self.project, path) {
            Ok(()) => {
                self.current_file = Some(path.to_path_buf());
                self.dirty = false;
                self.status = Some(format!("Exported to {}", path.display()));
            }
            Err(e) => {
                log::error!("Failed to export project: {:#}", e);
                self.status = Some(format!("Export failed: {}", e));
            }
        }
    }

    fn open_in_blender(&mut self) {
        match self.renderer.open_in_blender(&self.project) {
            Ok(session) => self.sessions.push(session),
            Err(e) => {
                log::error!("{:#}", e);
                self.status = Some(format!("Could not open Blender: {}", e));
            }
        }
    }

    /// Build the video on a background thread.
    fn start_compute(&mut self, output_dir: PathBuf) {
        let (sender, receiver) = channel();
        self.render_job = Some(receiver);
        self.status = Some(format!("Rendering into {}...", output_dir.display()));

        let project = self.project.clone();
        let renderer = self.renderer.clone();
        std::thread::spawn(move || {
            let result = renderer
                .compute(&project, &output_dir)
                .map_err(|e| format!("{:#}", e));
            let _ = sender.send(result);
        });
    }

    fn ask_compute(&mut self) {
        let Some(dir) = rfd::FileDialog::new()
            .set_title("Render destination")
            .pick_folder()
        else {
            return;
        };

        let non_empty = std::fs::read_dir(&dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
        if non_empty {
            let answer = rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Warning)
                .set_title("Directory not empty")
                .set_description("The destination directory is not empty. Do you want to continue?")
                .set_buttons(rfd::MessageButtons::YesNo)
                .show();
            if !matches!(answer, rfd::MessageDialogResult::Yes) {
                return;
            }
        }
        self.start_compute(dir);
    }

    /// Apply what a slide panel reported.
    fn apply_slide_action(&mut self, id: SlideId, action: SlideAction) {
        match action {
            SlideAction::None => return,
            SlideAction::SelectCoordinate(row) => {
                self.selected_rows.insert(id, row);
                return;
            }
            SlideAction::Rename(_) => self.save_text_edit(id, None),
            SlideAction::EditCoordinate { index, .. } => self.save_text_edit(id, Some(index)),
            _ => self.save_to_history(),
        }

        let result = match action {
            SlideAction::MoveLeft => self.project.slides.move_by(id, -1).map(|_| ()),
            SlideAction::MoveRight => self.project.slides.move_by(id, 1).map(|_| ()),
            SlideAction::Remove => {
                self.selected_rows.remove(&id);
                self.project.slides.remove(id).map(|_| ())
            }
            other => {
                let selected = self.selected_rows.get(&id).copied();
                match self.project.slides.get_mut(id) {
                    Some(entry) => {
                        let new_selection = edit_slide(entry, other, selected);
                        match new_selection {
                            Some(row) => {
                                self.selected_rows.insert(id, row);
                            }
                            None => {
                                self.selected_rows.remove(&id);
                            }
                        }
                        self.dirty = true;
                        Ok(())
                    }
                    None => Err(crate::error::ProjectError::NotFound(id)),
                }
            }
        };
        if let Err(e) = result {
            log::error!("Slide action failed: {}", e);
        }
    }

    // Consecutive keystrokes on the same field share one undo step.
    fn save_text_edit(&mut self, id: SlideId, row: Option<usize>) {
        if self.last_text_edit != Some((id, row)) {
            self.save_to_history();
            self.last_text_edit = Some((id, row));
        }
    }

    fn window_title(&self) -> String {
        let name = self
            .current_file
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        let marker = if self.dirty { " *" } else { "" };
        format!("Photostory - {}{}", name, marker)
    }
}

fn new_project(settings: &Settings) -> ProjectDocument {
    ProjectDocument::with_default_slide(settings.backgrounds.clone(), &settings.default_background)
}

/// Apply a content edit to a slide, returning the coordinate row to keep selected.
fn edit_slide(entry: &mut SlideEntry, action: SlideAction, selected: Option<usize>) -> Option<usize> {
    match action {
        SlideAction::Rename(name) => {
            entry.name = name;
            selected
        }
        SlideAction::AddMedia { zone, paths } => {
            for path in paths {
                match zone {
                    Zone::Foreground => entry.add_foreground_path(path),
                    Zone::Background => entry.add_background_path(path),
                };
            }
            selected
        }
        SlideAction::RemoveMedia { zone, index } => {
            if let SlideContent::Media(media) = entry.content_mut() {
                let list = match zone {
                    Zone::Foreground => &mut media.foreground_paths,
                    Zone::Background => &mut media.background_paths,
                };
                if index < list.len() {
                    list.remove(index);
                }
            }
            selected
        }
        SlideAction::AddCoordinate => {
            entry.add_coordinate(slide_panel::COORDINATE_TEMPLATE);
            selected
        }
        SlideAction::RemoveCoordinate(index) => {
            if let SlideContent::Waypoints(w) = entry.content_mut() {
                if index < w.coordinates.len() {
                    w.coordinates.remove(index);
                }
            }
            None
        }
        SlideAction::MoveCoordinate { index, delta } => {
            let SlideContent::Waypoints(w) = entry.content_mut() else {
                return selected;
            };
            match index.checked_add_signed(delta) {
                Some(to) if to < w.coordinates.len() && index < w.coordinates.len() => {
                    let item = w.coordinates.remove(index);
                    w.coordinates.insert(to, item);
                    Some(to)
                }
                _ => selected,
            }
        }
        SlideAction::EditCoordinate { index, text } => {
            if let SlideContent::Waypoints(w) = entry.content_mut() {
                if let Some(line) = w.coordinates.get_mut(index) {
                    *line = text;
                }
            }
            Some(index)
        }
        _ => selected,
    }
}

impl eframe::App for PhotostoryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for a finished render
        if let Some(ref receiver) = self.render_job {
            if let Ok(result) = receiver.try_recv() {
                self.render_job = None;
                match result {
                    Ok(video) => {
                        log::info!("Video written to {}", video.display());
                        self.status = Some(format!("Video written to {}", video.display()));
                    }
                    Err(e) => {
                        log::error!("Render failed: {}", e);
                        self.status = Some(format!("Render failed: {}", e));
                    }
                }
            }
        }
        if self.render_job.is_some() {
            ctx.request_repaint();
        }

        // Forget Blender windows that were closed
        self.sessions
            .retain_mut(|s| matches!(s.child.try_wait(), Ok(None)));

        for event in self.project.slides.drain_events() {
            log::debug!("Collection changed: {:?}", event);
            if let CollectionEvent::Removed(id) = event {
                self.selected_rows.remove(&id);
            }
            self.dirty = true;
        }
        let title = self.window_title();
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }

        let busy = self.render_job.is_some();

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New Story").clicked() {
                        self.new_story();
                        ui.close_menu();
                    }
                    if ui.button("Import JSON...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .set_file_name("slides.json")
                            .pick_file()
                        {
                            self.import_project(&path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Export JSON...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .set_file_name("slides.json")
                            .save_file()
                        {
                            self.export_project(&path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui
                        .add_enabled(self.history.can_undo(), egui::Button::new("Undo (Ctrl+Z)"))
                        .clicked()
                    {
                        self.undo();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(self.history.can_redo(), egui::Button::new("Redo (Ctrl+Shift+Z)"))
                        .clicked()
                    {
                        self.redo();
                        ui.close_menu();
                    }
                });

                ui.menu_button("Render", |ui| {
                    if ui.button("Open in Blender").clicked() {
                        self.open_in_blender();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(!busy, egui::Button::new("Compute Video..."))
                        .clicked()
                    {
                        self.ask_compute();
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, &self.project))
            .inner;
        match toolbar_action {
            toolbar::ToolbarAction::AddSlide(kind) => self.add_slide(kind),
            toolbar::ToolbarAction::SelectBackground(choice) => {
                self.select_background(&choice);
            }
            toolbar::ToolbarAction::None => {}
        }

        // Status line
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if busy {
                    ui.spinner();
                }
                let text = self.status.as_deref().unwrap_or("Ready");
                ui.label(egui::RichText::new(text).weak());
            });
        });

        // Keyboard shortcuts, only when no text field has focus
        if !ctx.wants_keyboard_input() {
            if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift) {
                self.undo();
            }
            if ctx.input(|i| {
                (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                    || (i.modifiers.command && i.key_pressed(egui::Key::Y))
            }) {
                self.redo();
            }
        }

        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });

        // Slide strip
        let mut pending: Option<(SlideId, SlideAction)> = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::horizontal().show(ui, |ui| {
                ui.horizontal_top(|ui| {
                    for entry in self.project.slides.iter() {
                        let selected = self.selected_rows.get(&entry.id()).copied();
                        let action = slide_panel::show(ui, entry, selected, &dropped);
                        if !matches!(action, SlideAction::None) && pending.is_none() {
                            pending = Some((entry.id(), action));
                        }
                    }
                });
            });
        });
        if let Some((id, action)) = pending {
            self.apply_slide_action(id, action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gps_entry() -> SlideEntry {
        let mut collection = crate::models::collection::SlideCollection::new();
        let mut entry = collection.create_entry(SlideKind::WaypointList);
        entry.add_coordinate("a");
        entry.add_coordinate("b");
        entry.add_coordinate("c");
        entry
    }

    fn coordinates(entry: &SlideEntry) -> Vec<String> {
        match entry.content() {
            SlideContent::Waypoints(w) => w.coordinates.clone(),
            SlideContent::Media(_) => Vec::new(),
        }
    }

    #[test]
    fn test_move_coordinate_follows_selection() {
        let mut entry = gps_entry();
        let selected = edit_slide(&mut entry, SlideAction::MoveCoordinate { index: 0, delta: 1 }, Some(0));
        assert_eq!(coordinates(&entry), vec!["b", "a", "c"]);
        assert_eq!(selected, Some(1));

        let selected = edit_slide(&mut entry, SlideAction::MoveCoordinate { index: 2, delta: 1 }, Some(2));
        assert_eq!(coordinates(&entry), vec!["b", "a", "c"]);
        assert_eq!(selected, Some(2));
    }

    #[test]
    fn test_remove_and_edit_coordinate() {
        let mut entry = gps_entry();
        assert_eq!(edit_slide(&mut entry, SlideAction::RemoveCoordinate(1), Some(1)), None);
        assert_eq!(coordinates(&entry), vec!["a", "c"]);

        edit_slide(
            &mut entry,
            SlideAction::EditCoordinate { index: 1, text: "48.1, 11.5".to_string() },
            None,
        );
        assert_eq!(coordinates(&entry), vec!["a", "48.1, 11.5"]);

        edit_slide(&mut entry, SlideAction::AddCoordinate, None);
        assert_eq!(coordinates(&entry).last().unwrap(), slide_panel::COORDINATE_TEMPLATE);
    }

    #[test]
    fn test_media_edits() {
        let mut collection = crate::models::collection::SlideCollection::new();
        let mut entry = collection.create_entry(SlideKind::MediaComposition);
        edit_slide(
            &mut entry,
            SlideAction::AddMedia {
                zone: Zone::Background,
                paths: vec!["a.png".to_string(), "b.png".to_string()],
            },
            None,
        );
        edit_slide(&mut entry, SlideAction::RemoveMedia { zone: Zone::Background, index: 0 }, None);

        let SlideContent::Media(media) = entry.content() else {
            panic!("expected media slide");
        };
        assert!(media.foreground_paths.is_empty());
        assert_eq!(media.background_paths, vec!["b.png"]);
    }

    #[test]
    fn test_failed_import_records_no_undo_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = PhotostoryApp::new(Settings::default());

        app.import_project(&dir.path().join("missing.json"));
        assert!(!app.history.can_undo());
        assert_eq!(app.project.slides.count(), 1);

        let path = dir.path().join("story.json");
        std::fs::write(&path, r#"{"slides": [{"type": "gps_slide", "name": "Route"}]}"#).unwrap();
        app.import_project(&path);
        assert!(app.history.can_undo());
        assert_eq!(app.current_file.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_select_background_records_only_changes() {
        let mut app = PhotostoryApp::new(Settings::default());
        assert_eq!(app.project.background(), "White");

        assert!(!app.select_background("White"));
        assert!(!app.select_background("Marble"));
        assert!(!app.history.can_undo());
        assert!(!app.dirty);

        assert!(app.select_background("Wood"));
        assert_eq!(app.project.background(), "Wood");
        assert!(app.history.can_undo());

        app.undo();
        assert_eq!(app.project.background(), "White");
        assert!(!app.history.can_undo());
    }

    #[test]
    fn test_history_limit_and_redo() {
        let snapshot = |bg: &str| Snapshot {
            slides: Vec::new(),
            background: bg.to_string(),
        };
        let mut history = History::new();
        for i in 0..60 {
            history.push(snapshot(&i.to_string()));
        }
        assert_eq!(history.undo_stack.len(), 50);

        let previous = history.undo(snapshot("now")).unwrap();
        assert_eq!(previous.background, "59");
        assert!(history.can_redo());
        assert_eq!(history.redo(snapshot("59")).unwrap().background, "now");
    }
}
