//! Status and info formatting.
//!
//! # Output Format
//!
//! ## Project list
//!
//! ```text
//! Projects
//! 001 birds (3 classes)
//!     Classes: unsorted, finches, owls
//!     Root: /home/me/ImageSorterProjects/birds
//! ```
//!
//! ## Image info
//!
//! ```text
//! File: IMG_0042.jpg
//! Size: 4000 x 3000
//! Format: JPEG
//! Camera: Canon EOS R5
//! Shot: 2024:05:01 09:30:00
//! ```
//!
//! `Camera` and `Shot` only appear when the file carries them.
//!
//! ## Status lines
//!
//! ```text
//! Sent to 'owls': IMG_0042.jpg
//! No images in unsorted. Add images to begin.
//! ```
//!
//! # Architecture
//!
//! Each screen has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::controller::{Command, KeyMap, Status};
use crate::geometry::ViewMapping;
use crate::project::Project;
use crate::session::{CommitReport, CommitWarning, CurrentItem};
use crate::types::CropRect;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Home screen
// ============================================================================

pub fn format_project_list(projects: &[Project]) -> Vec<String> {
    if projects.is_empty() {
        return vec!["No projects yet. Create one with `new <name> [classes...]`.".to_string()];
    }
    let mut lines = vec!["Projects".to_string()];
    for (i, project) in projects.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            project.name,
            plural(project.classes.len(), "class", "classes")
        ));
        lines.push(format!("{}Classes: {}", indent(1), project.classes.join(", ")));
        lines.push(format!("{}Root: {}", indent(1), project.root.display()));
    }
    lines
}

pub fn print_project_list(projects: &[Project]) {
    print_lines(&format_project_list(projects));
}

// ============================================================================
// Sorting screen
// ============================================================================

/// Info panel for the current image.
pub fn format_image_info(item: &CurrentItem) -> Vec<String> {
    let size = item.size();
    let format = match item.image.format {
        Some(format) => format!("{format:?}").to_uppercase(),
        None => item
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_uppercase()))
            .unwrap_or_default(),
    };
    let mut lines = vec![
        format!("File: {}", item.file_name()),
        format!("Size: {} x {}", size.width, size.height),
        format!("Format: {format}"),
    ];
    if let Some(camera) = item.metadata.camera() {
        lines.push(format!("Camera: {camera}"));
    }
    if let Some(shot) = &item.metadata.captured_at {
        lines.push(format!("Shot: {shot}"));
    }
    lines
}

/// Hotkey legend, one binding per line.
pub fn format_key_legend(keymap: &KeyMap) -> Vec<String> {
    keymap
        .bindings()
        .iter()
        .map(|(key, command)| match command {
            Command::Commit(class) => format!("{key}: send to {class}"),
            Command::Next => format!("{key}: next"),
            Command::AddImages => format!("{key}: add images"),
        })
        .collect()
}

/// Current item, rename and pending crop as shown under the image.
pub fn format_sort_screen(item: &CurrentItem, mapping: Option<&ViewMapping>) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", item.file_name(), item.size())];
    lines.push(format!("{}Rename: {}", indent(1), item.rename));
    if let Some(rect) = &item.crop {
        lines.push(format!("{}Crop: {}", indent(1), rect));
    }
    if let Some(m) = mapping {
        lines.push(format!(
            "{}Display: {} at ({}, {}) in {}",
            indent(1),
            m.display,
            m.offset_x,
            m.offset_y,
            m.viewport
        ));
    }
    lines
}

pub fn print_sort_screen(item: &CurrentItem, mapping: Option<&ViewMapping>) {
    print_lines(&format_sort_screen(item, mapping));
}

// ============================================================================
// Status lines
// ============================================================================

pub fn format_empty_pool() -> String {
    "No images in unsorted. Add images to begin.".to_string()
}

pub fn format_commit(report: &CommitReport) -> String {
    let file = report
        .destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("Sent to '{}': {}", report.class, file)
}

pub fn format_commit_warning(warning: &CommitWarning) -> String {
    match warning {
        CommitWarning::CropDiscarded(rect) => format_discarded_crop(rect),
        CommitWarning::SourceNotRemoved { path, reason } => {
            format!("Original left in place: {} ({reason})", path.display())
        }
    }
}

fn format_discarded_crop(rect: &CropRect) -> String {
    format!("Ignored crop {rect}: too small")
}

pub fn format_import(count: usize) -> String {
    format!("Added {} to unsorted", plural(count, "image", "images"))
}

pub fn format_import_failure(source: &Path, reason: &str) -> String {
    format!("Could not add {}: {reason}", source.display())
}

pub fn format_status(status: &Status) -> String {
    match status {
        Status::Info(msg) => msg.clone(),
        Status::Warning(msg) => format!("warning: {msg}"),
        Status::Error(msg) => format!("error: {msg}"),
    }
}

pub fn print_status(statuses: &[Status]) {
    for status in statuses {
        println!("{}", format_status(status));
    }
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
