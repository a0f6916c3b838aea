// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the Photostory editor.

pub mod slide_panel;
pub mod toolbar;
