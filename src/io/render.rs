// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Blender and ffmpeg orchestration.
//!
//! The project is handed to Blender's photostory importer through a
//! temporary JSON file. A full video build runs four steps, each of which
//! waits for its child process to exit:
//!
//! 1. build and save `generated_scene.blend` with duplicate placeholders
//! 2. render the animation into the output directory
//! 3. fill the placeholder frames
//! 4. encode the frames into `video.mp4`

use crate::config::Settings;
use crate::io::{duplicates, serialization};
use crate::models::project::ProjectDocument;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::process::{Child, Command};
use tempfile::NamedTempFile;

/// File name of the scene written by [`Renderer::compute`].
pub const SCENE_FILE: &str = "generated_scene.blend";
/// File name of the encoded video.
pub const VIDEO_FILE: &str = "video.mp4";
/// First frame Blender writes.
pub const FIRST_FRAME: &str = "0001.png";

/// An interactive Blender started on the project.
///
/// Holds the temporary project file so it outlives Blender's import.
pub struct BlenderSession {
    pub child: Child,
    _project_file: NamedTempFile,
}

/// Runs the external tools with the configured executables.
#[derive(Debug, Clone)]
pub struct Renderer {
    blender: String,
    python: String,
    ffmpeg: String,
    crf: u32,
    duplicates_script: Option<PathBuf>,
    symlink_duplicates: bool,
}

impl Renderer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            blender: settings.blender.clone(),
            python: settings.python.clone(),
            ffmpeg: settings.ffmpeg.clone(),
            crf: settings.crf,
            duplicates_script: settings.duplicates_script.clone(),
            symlink_duplicates: settings.symlink_duplicates,
        }
    }

    /// Open Blender with the project imported, without waiting for it.
    pub fn open_in_blender(&self, project: &ProjectDocument) -> Result<BlenderSession> {
        let file = serialization::write_temp(project)?;
        let expr = format!("import bpy; {}", photostory_op(file.path(), None, true, false));
        log::info!("Opening Blender");
        let child = Command::new(&self.blender)
            .arg("--python-expr")
            .arg(expr)
            .spawn()
            .with_context(|| format!("Failed to start '{}' (can you run it in a terminal?)", self.blender))?;
        Ok(BlenderSession {
            child,
            _project_file: file,
        })
    }

    /// Build the scene for `project` and save it as a .blend file.
    pub fn save_blend(
        &self,
        project: &ProjectDocument,
        blend_path: &Path,
        output_dir: Option<&Path>,
        setup_scene: bool,
        create_placeholders: bool,
    ) -> Result<()> {
        let file = serialization::write_temp(project)?;
        let args = save_blend_args(file.path(), blend_path, output_dir, setup_scene, create_placeholders);
        log::info!("Generating scene {}", blend_path.display());
        run(&self.blender, &args)?;
        log::info!("Saved blender file: {}", blend_path.display());
        Ok(())
    }

    /// Render the animation of a saved scene into `output_dir`.
    pub fn render_blend(&self, blend_path: &Path, output_dir: &Path) -> Result<()> {
        log::info!("Rendering {} into {}", blend_path.display(), output_dir.display());
        run(&self.blender, &render_args(blend_path, output_dir))
    }

    /// Fill duplicate placeholders among the rendered frames.
    pub fn replace_duplicates(&self, output_dir: &Path) -> Result<()> {
        let first = output_dir.join(FIRST_FRAME);
        match &self.duplicates_script {
            Some(script) => {
                let args = duplicates_script_args(script, &first, self.symlink_duplicates);
                run(&self.python, &args)
            }
            None => duplicates::replace_placeholders(&first, self.symlink_duplicates).map(|_| ()),
        }
    }

    /// Encode the rendered frames into a video. Never overwrites.
    pub fn encode_video(&self, output_dir: &Path) -> Result<PathBuf> {
        let video = output_dir.join(VIDEO_FILE);
        log::info!("Encoding {}", video.display());
        run(&self.ffmpeg, &ffmpeg_args(output_dir, self.crf))?;
        Ok(video)
    }

    /// Run the whole pipeline and return the path of the finished video.
    pub fn compute(&self, project: &ProjectDocument, output_dir: &Path) -> Result<PathBuf> {
        let blend_path = output_dir.join(SCENE_FILE);
        self.save_blend(project, &blend_path, Some(output_dir), true, true)?;
        self.render_blend(&blend_path, output_dir)?;
        self.replace_duplicates(output_dir)?;
        self.encode_video(output_dir)
    }
}

/// Python call that imports a project file into the current Blender scene.
pub fn photostory_op(
    json_path: &Path,
    output_dir: Option<&Path>,
    setup_scene: bool,
    create_placeholders: bool,
) -> String {
    let mut op = String::new();
    if let Some(dir) = output_dir {
        op.push_str(&format!(
            "bpy.context.scene.render.filepath={}; ",
            py_str(&dir_with_separator(dir))
        ));
    }
    op.push_str(&format!(
        "bpy.ops.import_scene.photostory(filepath={}, setup_scene={}, skip_duplicates={}); ",
        py_str(&json_path.to_string_lossy()),
        py_bool(setup_scene),
        py_bool(create_placeholders)
    ));
    op
}

fn save_blend_args(
    json_path: &Path,
    blend_path: &Path,
    output_dir: Option<&Path>,
    setup_scene: bool,
    create_placeholders: bool,
) -> Vec<String> {
    let script = format!(
        "import bpy; {}bpy.ops.wm.save_as_mainfile(filepath={}); bpy.ops.wm.quit_blender();",
        photostory_op(json_path, output_dir, setup_scene, create_placeholders),
        py_str(&blend_path.to_string_lossy())
    );
    vec!["--background".to_string(), "--python-expr".to_string(), script]
}

fn render_args(blend_path: &Path, output_dir: &Path) -> Vec<String> {
    vec![
        "--background".to_string(),
        blend_path.to_string_lossy().into_owned(),
        "--render-output".to_string(),
        dir_with_separator(output_dir),
        "--render-anim".to_string(),
    ]
}

fn ffmpeg_args(output_dir: &Path, crf: u32) -> Vec<String> {
    vec![
        "-i".to_string(),
        output_dir.join("%04d.png").to_string_lossy().into_owned(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-crf".to_string(),
        crf.to_string(),
        "-n".to_string(),
        output_dir.join(VIDEO_FILE).to_string_lossy().into_owned(),
    ]
}

/// Arguments for an external duplicate script, run silently.
fn duplicates_script_args(script: &Path, first_frame: &Path, symlink: bool) -> Vec<String> {
    let mut args = vec![
        script.to_string_lossy().into_owned(),
        "-i".to_string(),
        first_frame.to_string_lossy().into_owned(),
        "-s".to_string(),
    ];
    if symlink {
        args.push("-l".to_string());
    }
    args
}

fn dir_with_separator(dir: &Path) -> String {
    let mut s = dir.to_string_lossy().into_owned();
    if !s.ends_with(MAIN_SEPARATOR) {
        s.push(MAIN_SEPARATOR);
    }
    s
}

/// Single-quoted Python string literal.
fn py_str(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn py_bool(v: bool) -> &'static str {
    if v {
        "True"
    } else {
        "False"
    }
}

/// Run a program to completion, failing on a non-zero exit.
fn run(program: &str, args: &[String]) -> Result<()> {
    log::debug!("Running {} {:?}", program, args);
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to start '{}' (can you run it in a terminal?)", program))?;
    if !status.success() {
        bail!("'{}' exited with {}", program, status);
    }
    log::info!("'{}' done", program);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photostory_op_without_output() {
        let op = photostory_op(Path::new("/tmp/p.json"), None, true, false);
        assert_eq!(
            op,
            "bpy.ops.import_scene.photostory(filepath='/tmp/p.json', setup_scene=True, skip_duplicates=False); "
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_photostory_op_with_output() {
        let op = photostory_op(Path::new("/tmp/p.json"), Some(Path::new("/out")), true, true);
        assert!(op.starts_with("bpy.context.scene.render.filepath='/out/'; "));
        assert!(op.contains("skip_duplicates=True"));
    }

    #[test]
    fn test_python_strings_are_escaped() {
        assert_eq!(py_str("it's"), r"'it\'s'");
        assert_eq!(py_str(r"C:\x"), r"'C:\\x'");
    }

    #[cfg(unix)]
    #[test]
    fn test_save_blend_args() {
        let args = save_blend_args(
            Path::new("/tmp/p.json"),
            Path::new("/out/generated_scene.blend"),
            Some(Path::new("/out")),
            true,
            true,
        );
        assert_eq!(args[0], "--background");
        assert_eq!(args[1], "--python-expr");
        assert!(args[2].starts_with("import bpy; bpy.context.scene.render.filepath='/out/'; "));
        assert!(args[2].ends_with(
            "bpy.ops.wm.save_as_mainfile(filepath='/out/generated_scene.blend'); bpy.ops.wm.quit_blender();"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_render_and_encode_args() {
        assert_eq!(
            render_args(Path::new("/out/s.blend"), Path::new("/out")),
            vec!["--background", "/out/s.blend", "--render-output", "/out/", "--render-anim"]
        );
        assert_eq!(
            ffmpeg_args(Path::new("/out"), 32),
            vec!["-i", "/out/%04d.png", "-c:v", "libx264", "-crf", "32", "-n", "/out/video.mp4"]
        );
    }

    #[test]
    fn test_duplicates_script_args() {
        let script = Path::new("/opt/dup.py");
        let first = Path::new("/out/0001.png");
        assert_eq!(
            duplicates_script_args(script, first, false),
            vec!["/opt/dup.py", "-i", "/out/0001.png", "-s"]
        );
        assert_eq!(
            duplicates_script_args(script, first, true),
            vec!["/opt/dup.py", "-i", "/out/0001.png", "-s", "-l"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_replace_duplicates_links_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0001.png"), b"png").unwrap();
        std::fs::write(dir.path().join("0002.png"), b"").unwrap();

        let settings = Settings {
            symlink_duplicates: true,
            ..Settings::default()
        };
        Renderer::new(&settings).replace_duplicates(dir.path()).unwrap();

        let placeholder = dir.path().join("0002.png");
        let meta = std::fs::symlink_metadata(&placeholder).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(std::fs::read(&placeholder).unwrap(), b"png");
    }

    #[test]
    fn test_replace_duplicates_copies_by_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0001.png"), b"png").unwrap();
        std::fs::write(dir.path().join("0002.png"), b"").unwrap();

        Renderer::new(&Settings::default()).replace_duplicates(dir.path()).unwrap();

        let placeholder = dir.path().join("0002.png");
        let meta = std::fs::symlink_metadata(&placeholder).unwrap();
        assert!(!meta.file_type().is_symlink());
        assert_eq!(std::fs::read(&placeholder).unwrap(), b"png");
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let err = run("photostory-no-such-program", &[]).unwrap_err();
        assert!(err.to_string().contains("Failed to start"));
    }
}
