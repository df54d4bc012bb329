//! Project store: manifest persistence, class folders and the image pool.
//!
//! A project is a directory holding a `project.json` manifest and one folder
//! per class. The `unsorted` folder doubles as the import pool:
//!
//! ```text
//! ~/ImageSorterProjects/
//! └── birds/
//!     ├── project.json      # name, classes, settings
//!     ├── unsorted/         # pool: images awaiting a decision
//!     │   ├── IMG_0001.jpg
//!     │   └── IMG_0002.png
//!     ├── heron/
//!     └── egret/
//! ```
//!
//! The manifest's class list is the only authority on which folders are
//! classes; other directories under the root are ignored.
//!
//! The pool is never cached. [`pending_images`] lists the folder on every
//! call, so images dropped in by another program show up at the next load.

use crate::imaging::is_accepted_extension;
use crate::naming::{self, UNSORTED};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Manifest file name inside every project root.
pub const MANIFEST_FILENAME: &str = "project.json";

/// Schema version written to new manifests.
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Project already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error("No project found at {0}")]
    NotFound(PathBuf),
    #[error("Unknown class: {0}")]
    UnknownClass(String),
    #[error("Invalid project name: {0:?}")]
    InvalidName(String),
    #[error("Invalid class name: {0:?}")]
    InvalidClassName(String),
    #[error("Invalid manifest {path}: {source}")]
    InvalidManifest {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ProjectError>;

fn default_thumbnail_max_px() -> u32 {
    1024
}

fn default_version() -> u32 {
    MANIFEST_VERSION
}

/// Per-project settings stored in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Longest edge for thumbnails. Persisted, not yet used by sorting.
    #[serde(default = "default_thumbnail_max_px")]
    pub thumbnail_max_px: u32,
    /// Keys written by newer versions, carried through unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            thumbnail_max_px: default_thumbnail_max_px(),
            extra: serde_json::Map::new(),
        }
    }
}

/// On-disk shape of `project.json`.
#[derive(Debug, Serialize, Deserialize)]
struct ManifestFile {
    name: String,
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    created_at: String,
    classes: Vec<String>,
    /// Informational; the directory the manifest was read from wins.
    #[serde(default)]
    root: String,
    #[serde(default)]
    settings: ProjectSettings,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// A loaded project.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: String,
    pub root: PathBuf,
    /// Ordered class names; always contains `unsorted`.
    pub classes: Vec<String>,
    pub settings: ProjectSettings,
    /// Timestamp of the last save, as read from the manifest.
    pub created_at: String,
    extra: serde_json::Map<String, serde_json::Value>,
}

impl Project {
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILENAME)
    }

    pub fn class_dir(&self, class: &str) -> PathBuf {
        self.root.join(class)
    }

    pub fn unsorted_dir(&self) -> PathBuf {
        self.root.join(UNSORTED)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Classes other than `unsorted`, in manifest order. Digit keys `1..9`
    /// address this list.
    pub fn sortable_classes(&self) -> impl Iterator<Item = &str> {
        self.classes
            .iter()
            .map(String::as_str)
            .filter(|c| !naming::is_unsorted(c))
    }

    /// Class bound to digit `slot` (1-based); `None` when out of range.
    pub fn class_for_slot(&self, slot: usize) -> Option<&str> {
        slot.checked_sub(1)
            .and_then(|idx| self.sortable_classes().nth(idx))
    }
}

/// Root directory for a project called `name` under `projects_root`.
///
/// The name becomes a folder, so it must be a single path component.
pub fn project_root(projects_root: &Path, name: &str) -> Result<PathBuf> {
    let name = name.trim();
    if name.is_empty() || !naming::is_valid_folder_name(name) {
        return Err(ProjectError::InvalidName(name.to_string()));
    }
    Ok(projects_root.join(name))
}

/// Create a new project at `root`.
///
/// Class names are normalized (see [`naming::normalize_class_names`]).
/// Folders that already exist are reused; an existing manifest is an error.
pub fn create<S: AsRef<str>>(root: &Path, name: &str, class_names: &[S]) -> Result<Project> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProjectError::InvalidName(name.to_string()));
    }
    let manifest_path = root.join(MANIFEST_FILENAME);
    if manifest_path.exists() {
        return Err(ProjectError::AlreadyExists(root.to_path_buf()));
    }

    let classes = naming::normalize_class_names(class_names);
    check_class_names(&classes)?;

    let mut project = Project {
        name: name.to_string(),
        root: root.to_path_buf(),
        classes,
        settings: ProjectSettings::default(),
        created_at: String::new(),
        extra: serde_json::Map::new(),
    };

    fs::create_dir_all(root)?;
    for class in &project.classes {
        fs::create_dir_all(project.class_dir(class))?;
    }
    // Manifest last: a half-created tree without one is not a project.
    save(&mut project)?;

    log::info!(
        "created project '{}' at {} with classes {:?}",
        project.name,
        root.display(),
        project.classes
    );
    Ok(project)
}

/// Every class must be a single folder under the project root. Names that
/// only differ in case are allowed but warned about.
fn check_class_names(classes: &[String]) -> Result<()> {
    if let Some(bad) = classes.iter().find(|c| !naming::is_valid_folder_name(c)) {
        return Err(ProjectError::InvalidClassName(bad.clone()));
    }
    for (a, b) in naming::case_insensitive_clashes(classes) {
        log::warn!("classes '{a}' and '{b}' share a folder on case-insensitive filesystems");
    }
    Ok(())
}

/// Load the project whose manifest lives in `root`.
///
/// Class names are checked the same way as on create, so a hand-edited
/// manifest cannot point a class outside the project.
pub fn load(root: &Path) -> Result<Project> {
    let path = root.join(MANIFEST_FILENAME);
    if !path.is_file() {
        return Err(ProjectError::NotFound(root.to_path_buf()));
    }
    let content = fs::read_to_string(&path)?;
    let manifest: ManifestFile = serde_json::from_str(&content)
        .map_err(|source| ProjectError::InvalidManifest { path, source })?;
    check_class_names(&manifest.classes)?;

    Ok(Project {
        name: manifest.name,
        root: root.to_path_buf(),
        classes: manifest.classes,
        settings: manifest.settings,
        created_at: manifest.created_at,
        extra: manifest.extra,
    })
}

/// Write the manifest, replacing any previous one.
///
/// Stamps `created_at` with the current local time. The file is written
/// beside the manifest and renamed over it, so readers never see a
/// truncated manifest.
pub fn save(project: &mut Project) -> Result<()> {
    project.created_at = chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    let manifest = ManifestFile {
        name: project.name.clone(),
        version: MANIFEST_VERSION,
        created_at: project.created_at.clone(),
        classes: project.classes.clone(),
        root: project.root.display().to_string(),
        settings: project.settings.clone(),
        extra: project.extra.clone(),
    };
    let json = serde_json::to_string_pretty(&manifest)?;

    let path = project.manifest_path();
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, &path)?;
    Ok(())
}

/// Every immediate subdirectory of `projects_root` holding a readable
/// manifest, sorted by directory name. A missing root yields no projects;
/// unreadable manifests are skipped with a warning.
pub fn list_projects(projects_root: &Path) -> Result<Vec<Project>> {
    if !projects_root.is_dir() {
        return Ok(Vec::new());
    }
    let mut projects = Vec::new();
    for entry in WalkDir::new(projects_root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_dir() || !entry.path().join(MANIFEST_FILENAME).is_file() {
            continue;
        }
        match load(entry.path()) {
            Ok(project) => projects.push(project),
            Err(e) => log::warn!("skipping {}: {e}", entry.path().display()),
        }
    }
    Ok(projects)
}

/// Accepted image files directly inside `dir`, sorted by file name.
fn accepted_images_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        let accepted = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(is_accepted_extension);
        if entry.file_type().is_file() && accepted {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

/// The pool: accepted image files directly inside `unsorted`, sorted by
/// file name. Empty (not an error) when the folder does not exist.
pub fn pending_images(project: &Project) -> Result<Vec<PathBuf>> {
    let dir = project.unsorted_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let images = accepted_images_in(&dir)?;
    log::debug!("pool has {} image(s)", images.len());
    Ok(images)
}

/// Make sure the folder for `class` exists and return it.
pub fn ensure_class_folder(project: &Project, class: &str) -> Result<PathBuf> {
    if !project.has_class(class) {
        return Err(ProjectError::UnknownClass(class.to_string()));
    }
    let dir = project.class_dir(class);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Expand a selection for import: files are kept as given, directories
/// contribute their accepted images (not recursive, sorted by name).
pub fn collect_image_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        files.extend(accepted_images_in(path)?);
    }
    Ok(files)
}

/// What [`import_images`] managed to copy.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportReport {
    /// New pool paths, in input order.
    pub imported: Vec<PathBuf>,
    /// Sources that could not be copied, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

/// Copy `sources` into the pool, renaming on collision.
///
/// A source that cannot be copied is recorded in
/// [`ImportReport::failed`] and the rest are still imported. Only a pool
/// folder that cannot be created fails the whole call.
pub fn import_images(project: &Project, sources: &[PathBuf]) -> Result<ImportReport> {
    let pool = project.unsorted_dir();
    fs::create_dir_all(&pool)?;

    let mut report = ImportReport::default();
    for source in sources {
        let Some(file_name) = source.file_name() else {
            report
                .failed
                .push((source.clone(), "not a file".to_string()));
            continue;
        };
        let dest = naming::unique_path(&pool.join(file_name));
        match fs::copy(source, &dest) {
            Ok(_) => {
                log::info!("imported {} -> {}", source.display(), dest.display());
                report.imported.push(dest);
            }
            Err(e) => {
                log::warn!("could not import {}: {e}", source.display());
                // A failed copy can leave an empty destination behind.
                let _ = fs::remove_file(&dest);
                report.failed.push((source.clone(), e.to_string()));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn create_writes_manifest_and_folders() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("birds");
        let project = create(&root, "birds", &["heron", "egret"]).unwrap();

        assert_eq!(project.classes, ["unsorted", "heron", "egret"]);
        assert!(root.join(MANIFEST_FILENAME).is_file());
        for class in ["unsorted", "heron", "egret"] {
            assert!(root.join(class).is_dir(), "{class}");
        }
    }

    #[test]
    fn create_defaults_classes() {
        let tmp = TempDir::new().unwrap();
        let empty: [&str; 0] = [];
        let project = create(&tmp.path().join("p"), "p", &empty).unwrap();
        assert_eq!(project.classes, ["unsorted", "class_1"]);
    }

    #[test]
    fn create_twice_is_already_exists() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("p");
        create(&root, "p", &["a"]).unwrap();
        assert!(matches!(
            create(&root, "p", &["b"]),
            Err(ProjectError::AlreadyExists(_))
        ));
    }

    #[test]
    fn create_reuses_existing_folders() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("p");
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a").join("keep.jpg"), b"x").unwrap();

        create(&root, "p", &["a"]).unwrap();
        assert!(root.join("a").join("keep.jpg").exists());
    }

    #[test]
    fn create_rejects_blank_name_and_bad_classes() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            create(&tmp.path().join("p"), "  ", &["a"]),
            Err(ProjectError::InvalidName(_))
        ));
        assert!(matches!(
            create(&tmp.path().join("q"), "q", &["a/b"]),
            Err(ProjectError::InvalidClassName(_))
        ));
        assert!(!tmp.path().join("q").join(MANIFEST_FILENAME).exists());
    }

    #[test]
    fn project_root_validates_name() {
        let base = Path::new("/projects");
        assert_eq!(
            project_root(base, " birds ").unwrap(),
            PathBuf::from("/projects/birds")
        );
        assert!(project_root(base, "").is_err());
        assert!(project_root(base, "../escape").is_err());
    }

    #[test]
    fn load_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(load(tmp.path()), Err(ProjectError::NotFound(_))));
    }

    #[test]
    fn load_roundtrips_created_project() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("p");
        let created = create(&root, "p", &["x", "y"]).unwrap();
        let loaded = load(&root).unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.settings.thumbnail_max_px, 1024);
    }

    #[test]
    fn load_rejects_path_like_class() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("outside_root");
        let manifest = serde_json::json!({
            "name": "p",
            "classes": ["unsorted", outside.display().to_string()],
        });
        fs::write(tmp.path().join(MANIFEST_FILENAME), manifest.to_string()).unwrap();
        assert!(matches!(load(tmp.path()), Err(ProjectError::InvalidClassName(_))));

        let manifest = r#"{"name": "p", "classes": ["unsorted", "../up"]}"#;
        fs::write(tmp.path().join(MANIFEST_FILENAME), manifest).unwrap();
        assert!(matches!(load(tmp.path()), Err(ProjectError::InvalidClassName(c)) if c == "../up"));
    }

    #[test]
    fn load_defaults_missing_settings() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(MANIFEST_FILENAME),
            r#"{"name": "old", "classes": ["unsorted", "a"]}"#,
        )
        .unwrap();
        let project = load(tmp.path()).unwrap();
        assert_eq!(project.name, "old");
        assert_eq!(project.settings, ProjectSettings::default());
        assert_eq!(project.root, tmp.path());
    }

    #[test]
    fn load_invalid_json_names_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(MANIFEST_FILENAME), "{ nope").unwrap();
        let err = load(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidManifest { .. }));
        assert!(err.to_string().contains(MANIFEST_FILENAME));
    }

    #[test]
    fn save_preserves_unknown_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(MANIFEST_FILENAME),
            r#"{
                "name": "p", "version": 1, "classes": ["unsorted"],
                "owner": "sam",
                "settings": {"thumbnail_max_px": 512, "grid": true}
            }"#,
        )
        .unwrap();
        let mut project = load(tmp.path()).unwrap();
        save(&mut project).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(tmp.path().join(MANIFEST_FILENAME)).unwrap())
                .unwrap();
        assert_eq!(raw["owner"], "sam");
        assert_eq!(raw["settings"]["grid"], true);
        assert_eq!(raw["settings"]["thumbnail_max_px"], 512);
        assert_eq!(raw["version"], 1);
        assert!(!raw["created_at"].as_str().unwrap().is_empty());
        assert!(!tmp.path().join("project.json.tmp").exists());
    }

    #[test]
    fn list_projects_sorted_and_skips_invalid() {
        let tmp = TempDir::new().unwrap();
        create(&tmp.path().join("zeta"), "zeta", &["a"]).unwrap();
        create(&tmp.path().join("alpha"), "alpha", &["a"]).unwrap();
        fs::create_dir_all(tmp.path().join("no-manifest")).unwrap();
        fs::create_dir_all(tmp.path().join("broken")).unwrap();
        fs::write(tmp.path().join("broken").join(MANIFEST_FILENAME), "[]").unwrap();
        fs::write(tmp.path().join("stray.txt"), "x").unwrap();

        let names: Vec<String> = list_projects(tmp.path())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn list_projects_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(list_projects(&tmp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn pending_images_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let project = create(&tmp.path().join("p"), "p", &["a"]).unwrap();
        let pool = project.unsorted_dir();
        for name in ["b.png", "a.jpg", "c.txt", "D.TIFF", "x.jpg.tmp"] {
            fs::write(pool.join(name), b"").unwrap();
        }
        fs::create_dir_all(pool.join("nested.jpg")).unwrap();

        let pending = pending_images(&project).unwrap();
        assert_eq!(names(&pending), ["D.TIFF", "a.jpg", "b.png"]);
    }

    #[test]
    fn pending_images_missing_pool_is_empty() {
        let tmp = TempDir::new().unwrap();
        let project = create(&tmp.path().join("p"), "p", &["a"]).unwrap();
        fs::remove_dir(project.unsorted_dir()).unwrap();
        assert!(pending_images(&project).unwrap().is_empty());
    }

    #[test]
    fn ensure_class_folder_checks_membership() {
        let tmp = TempDir::new().unwrap();
        let project = create(&tmp.path().join("p"), "p", &["a"]).unwrap();
        fs::remove_dir(project.class_dir("a")).unwrap();

        let dir = ensure_class_folder(&project, "a").unwrap();
        assert!(dir.is_dir());
        assert!(matches!(
            ensure_class_folder(&project, "zzz"),
            Err(ProjectError::UnknownClass(c)) if c == "zzz"
        ));
        assert!(!project.class_dir("zzz").exists());
    }

    #[test]
    fn slots_skip_unsorted() {
        let tmp = TempDir::new().unwrap();
        let project = create(&tmp.path().join("p"), "p", &["cats", "unsorted", "dogs"]).unwrap();
        assert_eq!(project.classes, ["cats", "unsorted", "dogs"]);
        assert_eq!(project.class_for_slot(0), None);
        assert_eq!(project.class_for_slot(1), Some("cats"));
        assert_eq!(project.class_for_slot(2), Some("dogs"));
        assert_eq!(project.class_for_slot(3), None);
    }

    #[test]
    fn import_renames_on_collision() {
        let tmp = TempDir::new().unwrap();
        let project = create(&tmp.path().join("p"), "p", &["a"]).unwrap();
        let outside = tmp.path().join("camera");
        fs::create_dir_all(outside.join("day2")).unwrap();
        fs::write(outside.join("img.jpg"), b"1").unwrap();
        fs::write(outside.join("day2").join("img.jpg"), b"2").unwrap();

        let report = import_images(
            &project,
            &[outside.join("img.jpg"), outside.join("day2").join("img.jpg")],
        )
        .unwrap();
        let imported = report.imported;
        assert!(report.failed.is_empty());
        assert_eq!(names(&imported), ["img.jpg", "img_1.jpg"]);
        assert_eq!(fs::read(&imported[1]).unwrap(), b"2");
        assert!(outside.join("img.jpg").exists(), "import copies, not moves");
    }

    #[test]
    fn import_continues_past_missing_source() {
        let tmp = TempDir::new().unwrap();
        let project = create(&tmp.path().join("p"), "p", &["a"]).unwrap();
        let ghost = tmp.path().join("ghost.jpg");
        let real = tmp.path().join("real.jpg");
        fs::write(&real, b"x").unwrap();

        let report = import_images(&project, &[ghost.clone(), real]).unwrap();
        assert_eq!(names(&report.imported), ["real.jpg"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, ghost);
        assert_eq!(pending_images(&project).unwrap(), report.imported);
    }

    #[test]
    fn collect_expands_directories_to_images() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("card");
        fs::create_dir_all(dir.join("nested")).unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt"] {
            fs::write(dir.join(name), b"x").unwrap();
        }
        fs::write(dir.join("nested").join("deep.jpg"), b"x").unwrap();
        let loose = tmp.path().join("loose.tif");
        fs::write(&loose, b"x").unwrap();

        let files = collect_image_files(&[loose.clone(), dir.clone()]).unwrap();
        assert_eq!(files, [loose, dir.join("a.jpg"), dir.join("b.PNG")]);
    }
}
