// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with slide creation and global settings.

use crate::models::{project::ProjectDocument, slide::SlideKind};

/// Result of toolbar interaction.
pub enum ToolbarAction {
    None,
    AddSlide(SlideKind),
    SelectBackground(String),
}

/// Display the toolbar.
pub fn show(ui: &mut egui::Ui, project: &ProjectDocument) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui.button("🖼 Add photo slide").clicked() {
            action = ToolbarAction::AddSlide(SlideKind::MediaComposition);
        }
        if ui.button("🗺 Add GPS slide").clicked() {
            action = ToolbarAction::AddSlide(SlideKind::WaypointList);
        }

        ui.separator();

        egui::ComboBox::from_label("Background")
            .selected_text(project.background())
            .show_ui(ui, |ui| {
                for choice in project.background_choices() {
                    if ui
                        .selectable_label(choice == project.background(), choice)
                        .clicked()
                    {
                        action = ToolbarAction::SelectBackground(choice.clone());
                    }
                }
            });

        ui.separator();

        ui.label(
            egui::RichText::new(format!("{} slides", project.slides.count()))
                .italics()
                .weak(),
        );
    });

    action
}
