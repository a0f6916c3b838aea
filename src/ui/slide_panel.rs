// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Panel for a single slide.
//!
//! Media slides show a foreground and a background drop zone; waypoint
//! slides show an editable coordinate list. The panel never mutates the
//! slide itself, it reports what the user asked for.

use crate::io::media;
use crate::models::slide::{SlideContent, SlideEntry};
use std::path::PathBuf;

/// Width of a slide panel in the strip.
const PANEL_WIDTH: f32 = 260.0;

/// Text a new coordinate line starts with.
pub const COORDINATE_TEMPLATE: &str = "<Lat>, <Long>";

/// Which media list of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Foreground,
    Background,
}

/// Result of slide panel interaction.
pub enum SlideAction {
    None,
    MoveLeft,
    MoveRight,
    Remove,
    Rename(String),
    AddMedia { zone: Zone, paths: Vec<String> },
    RemoveMedia { zone: Zone, index: usize },
    AddCoordinate,
    RemoveCoordinate(usize),
    MoveCoordinate { index: usize, delta: isize },
    EditCoordinate { index: usize, text: String },
    SelectCoordinate(usize),
}

/// Display one slide panel.
///
/// `dropped` holds the files released over the window this frame; they go
/// to whichever drop zone is under the pointer.
pub fn show(
    ui: &mut egui::Ui,
    entry: &SlideEntry,
    selected_row: Option<usize>,
    dropped: &[PathBuf],
) -> SlideAction {
    let mut action = SlideAction::None;

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(PANEL_WIDTH);
        ui.vertical(|ui| {
            // Header: name and strip controls
            ui.horizontal(|ui| {
                if ui.small_button("◀").on_hover_text("Move left").clicked() {
                    action = SlideAction::MoveLeft;
                }
                let mut name = entry.name.clone();
                let mut response = ui.add(egui::TextEdit::singleline(&mut name).desired_width(140.0));
                if let Some(source) = entry.source() {
                    response = response.on_hover_text(format!("Loaded from {}", source.display()));
                }
                if response.changed() {
                    action = SlideAction::Rename(name);
                }
                if ui.small_button("▶").on_hover_text("Move right").clicked() {
                    action = SlideAction::MoveRight;
                }
                if ui.small_button("✖").on_hover_text("Remove slide").clicked() {
                    action = SlideAction::Remove;
                }
            });
            ui.separator();

            let body = match entry.content() {
                SlideContent::Media(m) => {
                    let fg = drop_zone(ui, "Foreground", Zone::Foreground, &m.foreground_paths, dropped);
                    ui.add_space(6.0);
                    let bg = drop_zone(ui, "Background", Zone::Background, &m.background_paths, dropped);
                    if matches!(fg, SlideAction::None) { bg } else { fg }
                }
                SlideContent::Waypoints(w) => coordinate_list(ui, &w.coordinates, selected_row),
            };
            if matches!(action, SlideAction::None) {
                action = body;
            }
        });
    });

    action
}

fn drop_zone(
    ui: &mut egui::Ui,
    title: &str,
    zone: Zone,
    paths: &[String],
    dropped: &[PathBuf],
) -> SlideAction {
    let mut action = SlideAction::None;
    let dragging = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());

    let response = egui::Frame::canvas(ui.style())
        .inner_margin(6.0)
        .show(ui, |ui| {
            ui.set_min_size(egui::vec2(PANEL_WIDTH - 16.0, 90.0));
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(title).strong());
                if ui.small_button("+").on_hover_text("Add files...").clicked() {
                    if let Some(picked) = rfd::FileDialog::new()
                        .add_filter("Media", media::SUPPORTED_EXTENSIONS)
                        .pick_files()
                    {
                        let paths = media::filter_supported(picked.iter().map(PathBuf::as_path));
                        if !paths.is_empty() {
                            action = SlideAction::AddMedia { zone, paths };
                        }
                    }
                }
            });

            if paths.is_empty() {
                ui.label(
                    egui::RichText::new("Drag & drop images or videos here")
                        .italics()
                        .weak(),
                );
            }
            for (index, path) in paths.iter().enumerate() {
                ui.horizontal(|ui| {
                    if ui.small_button("−").clicked() {
                        action = SlideAction::RemoveMedia { zone, index };
                    }
                    ui.add(egui::Label::new(file_label(path)).truncate())
                        .on_hover_text(path);
                });
            }
        })
        .response;

    let hovered = ui.rect_contains_pointer(response.rect);
    if dragging && hovered {
        ui.painter().rect_stroke(
            response.rect,
            4.0,
            egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE),
        );
    }
    if hovered && !dropped.is_empty() {
        let paths = media::filter_supported(dropped.iter().map(PathBuf::as_path));
        if !paths.is_empty() {
            action = SlideAction::AddMedia { zone, paths };
        }
    }

    action
}

fn coordinate_list(ui: &mut egui::Ui, coordinates: &[String], selected_row: Option<usize>) -> SlideAction {
    let mut action = SlideAction::None;

    ui.label(egui::RichText::new("GPS coordinates").strong());
    for (index, text) in coordinates.iter().enumerate() {
        ui.horizontal(|ui| {
            let selected = selected_row == Some(index);
            if ui.selectable_label(selected, format!("{:>2}", index + 1)).clicked() {
                action = SlideAction::SelectCoordinate(index);
            }
            let mut buffer = text.clone();
            let response = ui.add(egui::TextEdit::singleline(&mut buffer).desired_width(190.0));
            if response.gained_focus() {
                action = SlideAction::SelectCoordinate(index);
            }
            if response.changed() {
                action = SlideAction::EditCoordinate { index, text: buffer };
            }
        });
    }

    ui.horizontal(|ui| {
        if ui.button("+").on_hover_text("Add coordinate").clicked() {
            action = SlideAction::AddCoordinate;
        }
        if let Some(index) = selected_row.filter(|i| *i < coordinates.len()) {
            if ui.button("−").on_hover_text("Remove selected").clicked() {
                action = SlideAction::RemoveCoordinate(index);
            }
            if ui.button("⬆").clicked() {
                action = SlideAction::MoveCoordinate { index, delta: -1 };
            }
            if ui.button("⬇").clicked() {
                action = SlideAction::MoveCoordinate { index, delta: 1 };
            }
        }
    });

    action
}

/// Last path component, for compact listing.
fn file_label(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
