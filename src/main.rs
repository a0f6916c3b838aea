// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Photostory - slide editor for photo and GPS video montages
//!
//! A cross-platform desktop application for arranging photo/video and GPS
//! slides into a JSON project that Blender turns into a rendered video.

mod app;
mod config;
mod error;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::PhotostoryApp;
use clap::Parser;
use config::Settings;
use std::path::PathBuf;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "photostory", version, about)]
struct Cli {
    /// Settings file (overrides PHOTOSTORY_CONFIG and the platform default)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Project file to import at startup
    #[arg(value_name = "PROJECT")]
    project: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let mut app = PhotostoryApp::new(settings);
    if let Some(path) = cli.project.as_deref() {
        app.import_project(path);
    }

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 500.0])
            .with_drag_and_drop(true)
            .with_title("Photostory"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native("Photostory", options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
