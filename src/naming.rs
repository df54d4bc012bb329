//! Filename and class-name rules.
//!
//! ## Collision-safe paths
//!
//! Nothing in this crate overwrites an existing image. Every file written
//! into a project folder (imports into `unsorted`, commits into a class) goes
//! through [`unique_path`], which appends `_1`, `_2`, … before the extension
//! until the name is free:
//!
//! - `cat.jpg` → `cat.jpg` (free)
//! - `cat.jpg` → `cat_1.jpg` (taken)
//! - `cat.jpg` → `cat_2.jpg` (`cat.jpg` and `cat_1.jpg` taken)
//!
//! The check is a plain existence test. That is sufficient for a single
//! operator driving one process; no other writer is assumed.
//!
//! ## Class names
//!
//! Class names double as folder names, so [`normalize_class_names`] trims,
//! de-duplicates and forces the reserved [`UNSORTED`] pool into the list.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Name of the import pool class and its folder.
pub const UNSORTED: &str = "unsorted";

/// Classes assigned to a new project when none are given.
pub const DEFAULT_CLASSES: &[&str] = &[UNSORTED, "class_1"];

/// Whether `name` is the reserved pool class, in any casing.
pub fn is_unsorted(name: &str) -> bool {
    name.eq_ignore_ascii_case(UNSORTED)
}

/// Return `path` if it is free, otherwise the first free `stem_N.ext`.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (1u64..)
        .map(|i| path.with_file_name(format!("{stem}_{i}{ext}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Normalize a user-entered class list.
///
/// - blank entries are dropped, the rest trimmed
/// - an empty list becomes [`DEFAULT_CLASSES`]
/// - any casing of `unsorted` is written as `unsorted` and kept once; if
///   absent it is prepended
/// - repeated names are dropped, first occurrence wins
///
/// `["Unsorted", "A", "unsorted", "a"]` → `["unsorted", "A", "a"]`
pub fn normalize_class_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut cleaned: Vec<String> = names
        .iter()
        .map(|n| n.as_ref().trim())
        .filter(|n| !n.is_empty())
        .map(|n| {
            if is_unsorted(n) {
                UNSORTED.to_string()
            } else {
                n.to_string()
            }
        })
        .collect();

    if cleaned.is_empty() {
        return DEFAULT_CLASSES.iter().map(|c| c.to_string()).collect();
    }
    if !cleaned.iter().any(|c| c == UNSORTED) {
        cleaned.insert(0, UNSORTED.to_string());
    }

    let mut seen = HashSet::new();
    cleaned
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

/// Pairs of classes that differ only in letter case. They are distinct in
/// the manifest but share one folder on case-insensitive filesystems.
pub fn case_insensitive_clashes(names: &[String]) -> Vec<(&str, &str)> {
    let mut clashes = Vec::new();
    for (i, a) in names.iter().enumerate() {
        for b in &names[i + 1..] {
            if a != b && a.eq_ignore_ascii_case(b) && !is_unsorted(a) {
                clashes.push((a.as_str(), b.as_str()));
            }
        }
    }
    clashes
}

/// Whether `name` can be used as a single folder name under the project
/// root: one normal path component, no separators, not `.` or `..`.
pub fn is_valid_folder_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Stem to write on commit: the trimmed rename, or `original` when the
/// rename is blank.
pub fn effective_stem<'a>(rename: &'a str, original: &'a str) -> &'a str {
    let trimmed = rename.trim();
    if trimmed.is_empty() { original } else { trimmed }
}

/// Lowercased extension of `path` with its leading dot, or `""`.
pub fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// File stem of `path` as an owned string, or `""`.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
