// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Slide data model.

pub mod collection;
pub mod project;
pub mod slide;
