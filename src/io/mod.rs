// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for project files, media and external tools.

pub mod duplicates;
pub mod media;
pub mod render;
pub mod serialization;
