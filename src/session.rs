//! Sort engine: the current image and the commit transaction.
//!
//! A [`SortSession`] holds everything that used to live in widget state:
//! the decoded head of the pool, the working rename and the pending crop.
//! The project and the codec are passed into each call rather than owned,
//! so the session can be driven headlessly in tests.
//!
//! ## States
//!
//! ```text
//!            load_next (pool empty)
//! Unloaded ─────────────────────────► Empty
//!    │  ▲                               │
//!    │  └──────── load_next ◄───────────┘
//!    │ load_next (head decoded)
//!    ▼
//!  Loaded ──commit──► (Unloaded) ──load_next──► Loaded / Empty
//! ```
//!
//! "Next" always means the head of a freshly listed pool. Skipping leaves
//! the file in place, so the same image comes back unless the folder
//! changed underneath.
//!
//! ## Commit
//!
//! 1. crop the decoded image if the pending rectangle is at least
//!    `min_crop_px` on both sides (smaller ones are dropped with a warning)
//! 2. pick `{rename or stem}{lowercased ext}` in the class folder via
//!    [`unique_path`](crate::naming::unique_path)
//! 3. encode to `<dest>.tmp`, then rename onto `<dest>`
//! 4. delete the source; failure is reported but does not undo the commit
//! 5. load the next image

use crate::geometry::ViewMapping;
use crate::imaging::{
    BackendError, DecodedImage, ImageBackend, ImageMetadata, Quality, format_for_extension,
};
use crate::naming;
use crate::project::{self, Project, ProjectError};
use crate::types::{CropRect, Size};
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Crops narrower or shorter than this many pixels are treated as stray
/// clicks.
pub const MIN_CROP_PX: u32 = 10;

#[derive(Error, Debug)]
pub enum SortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error("No image loaded")]
    NoCurrentItem,
    #[error("Unknown class: {0}")]
    UnknownClass(String),
    #[error("{path}: {source}")]
    Imaging {
        path: PathBuf,
        source: BackendError,
    },
    #[error("Cannot write images with extension {0:?}")]
    UnsupportedExtension(String),
}

pub type Result<T> = std::result::Result<T, SortError>;

/// Commit tunables, usually taken from the `[sorting]` config section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortOptions {
    pub min_crop_px: u32,
    pub quality: Quality,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            min_crop_px: MIN_CROP_PX,
            quality: Quality::default(),
        }
    }
}

/// The image currently on screen.
#[derive(Debug, Clone)]
pub struct CurrentItem {
    pub path: PathBuf,
    pub image: DecodedImage,
    pub metadata: ImageMetadata,
    /// Working rename; blank means "keep the original stem".
    pub rename: String,
    pub crop: Option<CropRect>,
}

impl CurrentItem {
    pub fn size(&self) -> Size {
        self.image.size()
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn original_stem(&self) -> String {
        naming::file_stem(&self.path)
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Unloaded,
    /// The pool was empty at the last load.
    Empty,
    Loaded(Box<CurrentItem>),
}

/// Result of asking for the next image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(PathBuf),
    /// Nothing left to sort. A normal state, not a failure.
    Empty,
}

/// Non-fatal problems noticed during a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitWarning {
    /// A crop was pending but too small to apply.
    CropDiscarded(CropRect),
    /// The image was placed but the original could not be deleted.
    SourceNotRemoved { path: PathBuf, reason: String },
}

/// What a successful commit did.
#[derive(Debug)]
pub struct CommitReport {
    pub class: String,
    pub destination: PathBuf,
    pub cropped: Option<CropRect>,
    pub warnings: Vec<CommitWarning>,
    /// Loading the following image is a separate step; its failure does not
    /// undo the commit.
    pub next: Result<LoadOutcome>,
}

/// Session state for sorting one project.
#[derive(Debug, Default)]
pub struct SortSession {
    state: SessionState,
    options: SortOptions,
}

impl SortSession {
    pub fn new(options: SortOptions) -> Self {
        Self {
            state: SessionState::Unloaded,
            options,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn options(&self) -> SortOptions {
        self.options
    }

    pub fn current(&self) -> Option<&CurrentItem> {
        match &self.state {
            SessionState::Loaded(item) => Some(item),
            _ => None,
        }
    }

    fn current_mut(&mut self) -> Option<&mut CurrentItem> {
        match &mut self.state {
            SessionState::Loaded(item) => Some(item),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    /// Drop the current image and load the head of the pool.
    ///
    /// A decode failure leaves the session unloaded and is returned; the
    /// file stays in the pool until the operator deals with it.
    pub fn load_next(&mut self, project: &Project, backend: &impl ImageBackend) -> Result<LoadOutcome> {
        self.state = SessionState::Unloaded;

        let pool = project::pending_images(project)?;
        let Some(head) = pool.into_iter().next() else {
            log::debug!("pool is empty");
            self.state = SessionState::Empty;
            return Ok(LoadOutcome::Empty);
        };

        let image = backend.decode(&head).map_err(|source| SortError::Imaging {
            path: head.clone(),
            source,
        })?;
        let metadata = backend.read_metadata(&head).unwrap_or_else(|e| {
            log::warn!("no metadata for {}: {e}", head.display());
            ImageMetadata::default()
        });
        log::debug!("loaded {} ({})", head.display(), image.size());

        self.state = SessionState::Loaded(Box::new(CurrentItem {
            rename: naming::file_stem(&head),
            path: head.clone(),
            image,
            metadata,
            crop: None,
        }));
        Ok(LoadOutcome::Loaded(head))
    }

    /// Set the working rename. Returns `false` when nothing is loaded.
    pub fn set_rename(&mut self, text: &str) -> bool {
        match self.current_mut() {
            Some(item) => {
                item.rename = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Replace the pending crop. Returns `false` when nothing is loaded.
    ///
    /// The rectangle is stored normalized and clamped to the image bounds.
    pub fn set_crop(&mut self, rect: Option<CropRect>) -> bool {
        match self.current_mut() {
            Some(item) => {
                let size = item.size();
                item.crop = rect.map(|r| r.clamped_to(size));
                true
            }
            None => false,
        }
    }

    /// Viewport mapping for the current image, if any.
    pub fn mapping(&self, viewport: Size) -> Option<ViewMapping> {
        self.current()
            .map(|item| ViewMapping::new(item.size(), viewport))
    }

    /// The current image scaled for display in `viewport`.
    pub fn preview(
        &self,
        backend: &impl ImageBackend,
        viewport: Size,
    ) -> Option<(DynamicImage, ViewMapping)> {
        let item = self.current()?;
        let mapping = ViewMapping::new(item.size(), viewport);
        let pixels = if mapping.display == item.size() {
            item.image.pixels.clone()
        } else {
            let target = Size::new(mapping.display.width.max(1), mapping.display.height.max(1));
            backend.resize(&item.image.pixels, target)
        };
        Some((pixels, mapping))
    }

    /// Move the current image into `class`, applying rename and crop, then
    /// load the next image.
    pub fn commit(
        &mut self,
        project: &Project,
        backend: &impl ImageBackend,
        class: &str,
    ) -> Result<CommitReport> {
        let item = self.current().ok_or(SortError::NoCurrentItem)?;
        if !project.has_class(class) {
            return Err(SortError::UnknownClass(class.to_string()));
        }
        let dest_dir = project::ensure_class_folder(project, class)?;

        let mut warnings = Vec::new();
        let (cropped, applied) = match item.crop {
            Some(rect) if rect.is_usable(self.options.min_crop_px) => {
                (Some(backend.crop(&item.image.pixels, rect)), Some(rect))
            }
            Some(rect) => {
                log::warn!("ignoring {rect} crop below {}px", self.options.min_crop_px);
                warnings.push(CommitWarning::CropDiscarded(rect));
                (None, None)
            }
            None => (None, None),
        };
        let working = cropped.as_ref().unwrap_or(&item.image.pixels);

        let ext = naming::lowercase_extension(&item.path);
        let format =
            format_for_extension(&ext).ok_or_else(|| SortError::UnsupportedExtension(ext.clone()))?;
        let original_stem = item.original_stem();
        let stem = naming::effective_stem(&item.rename, &original_stem);
        let destination = naming::unique_path(&dest_dir.join(format!("{stem}{ext}")));

        write_atomically(backend, working, &destination, format, self.options.quality)
            .map_err(|e| match e {
                SortError::Imaging { source, .. } => SortError::Imaging {
                    path: item.path.clone(),
                    source,
                },
                other => other,
            })?;

        if let Err(e) = fs::remove_file(&item.path) {
            log::warn!(
                "{} placed at {} but original not removed: {e}",
                item.path.display(),
                destination.display()
            );
            warnings.push(CommitWarning::SourceNotRemoved {
                path: item.path.clone(),
                reason: e.to_string(),
            });
        }
        log::info!(
            "sorted {} -> {}",
            item.path.display(),
            destination.display()
        );

        self.state = SessionState::Unloaded;
        let next = self.load_next(project, backend);
        Ok(CommitReport {
            class: class.to_string(),
            destination,
            cropped: applied,
            warnings,
            next,
        })
    }
}

/// Path of the scratch file written before the final rename.
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Encode next to `destination` and rename into place, so the destination
/// either does not exist or holds a complete file.
fn write_atomically(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    destination: &Path,
    format: image::ImageFormat,
    quality: Quality,
) -> Result<()> {
    let tmp = temp_path_for(destination);
    if let Err(source) = backend.encode(image, &tmp, format, quality) {
        let _ = fs::remove_file(&tmp);
        return Err(SortError::Imaging {
            path: destination.to_path_buf(),
            source,
        });
    }
    if let Err(e) = fs::rename(&tmp, destination) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
