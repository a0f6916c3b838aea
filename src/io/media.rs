// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file filtering for drop zones.
//!
//! Slides accept any still image or video Blender can load. Dropped files
//! with other extensions are skipped before they reach a slide.

use std::path::Path;

/// Extensions accepted on media slides, lowercase and without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tiff", "tif", "bmp", "jp2", "j2c", "exr", "tga", // images
    "mp4", "avi", "mpg", "mpeg", "dvd", "vob", "mov", "ogg", "ogv", "dv", "mkv", // videos
];

/// Check whether a file looks like media a slide can hold.
pub fn is_supported_media(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Keep the supported paths, logging the ones that are dropped.
pub fn filter_supported<'a, I>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Path>,
{
    paths
        .into_iter()
        .filter_map(|path| {
            if is_supported_media(path) {
                Some(path.to_string_lossy().into_owned())
            } else {
                log::warn!("Unsupported file type: {}", path.display());
                None
            }
        })
        .collect()
}
