//! # Image Sorter
//!
//! Keyboard-driven triage of image batches into class folders. A project is
//! a directory with a `project.json` manifest and one folder per class;
//! images arrive in `unsorted` and leave it one at a time, optionally
//! renamed and cropped, into the class the operator picks.
//!
//! # Architecture
//!
//! ```text
//! input event ─► controller ─► session (sort engine) ─► project store
//!                    │               │                     (folders, manifest)
//!                    ▼               ▼
//!               crop selector    imaging backend
//!                    │           (decode, crop, resize, encode)
//!                    ▼
//!               geometry (viewport <-> image pixels)
//! ```
//!
//! Everything below the controller is plain data and functions, so the
//! whole workflow runs headlessly in tests with a mock codec.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Shared value types: `Size`, `Point`, `CropRect` |
//! | [`geometry`] | Fit-to-viewport scale, offsets, and coordinate mapping |
//! | [`crop`] | Press/drag/release crop selection state machine |
//! | [`naming`] | Collision-safe paths, class-name normalization, rename fallback |
//! | [`project`] | Project create/load/save/list, the unsorted pool, import |
//! | [`session`] | Current image, rename and crop, the commit transaction |
//! | [`controller`] | Key map, input events, status messages, render frame |
//! | [`imaging`] | Codec trait and the pure-Rust backend (`image` + `rexif`) |
//! | [`config`] | `config.toml` loading, merging, and validation |
//! | [`output`] | Text formatting for the terminal front end |
//!
//! # Design Decisions
//!
//! ## The Pool Is Recomputed, Not Cached
//!
//! "Next image" always means the first accepted file in `unsorted` by name,
//! listed fresh on every load. There is no cursor to go stale when files
//! are added or removed behind the program's back. Skipping therefore
//! returns the same image until something changes the folder.
//!
//! ## Commit Never Exposes a Partial File
//!
//! Output is encoded to `<destination>.tmp` and renamed into place, so the
//! destination path either does not exist or holds a complete image. The
//! source is deleted only afterwards; if that fails the image exists twice,
//! which is reported but never rolled back.
//!
//! ## Names Never Overwrite
//!
//! Both import and commit go through [`naming::unique_path`], which appends
//! `_1`, `_2`, ... before the extension until the name is free.

pub mod config;
pub mod controller;
pub mod crop;
pub mod geometry;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod project;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
