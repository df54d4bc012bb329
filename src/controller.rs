//! Workflow controller: input events in, engine calls out.
//!
//! Front ends translate whatever their toolkit delivers into
//! [`InputEvent`]s. Keys go through a [`KeyMap`], a plain table built from
//! the project's classes and the `[keys]` config, so bindings are data and
//! the dispatch is testable without a window.
//!
//! | Input | Effect |
//! |---|---|
//! | `0` | commit to `unsorted` |
//! | `1`..`9` | commit to the Nth class, skipping `unsorted` (out of range: nothing) |
//! | next key (`space`, `n`) | reload the head of the pool, nothing moved |
//! | class action | commit to that class |
//! | add images | pick files, import into `unsorted` |
//! | pointer down/move/up | crop drag |
//!
//! Everything except "add images" is a no-op while no image is loaded.

use crate::config::{AppConfig, KeysConfig};
use crate::crop::CropSelector;
use crate::geometry::ViewMapping;
use crate::imaging::ImageBackend;
use crate::naming;
use crate::output;
use crate::project::{self, Project, ProjectError};
use crate::session::{CurrentItem, LoadOutcome, SortError, SortSession};
use crate::types::{Point, Size};
use image::DynamicImage;
use std::path::PathBuf;
use thiserror::Error;

/// Viewport assumed until the front end reports a real size.
pub const DEFAULT_VIEWPORT: Size = Size {
    width: 1024,
    height: 768,
};

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Sort(#[from] SortError),
    #[error(transparent)]
    Project(#[from] ProjectError),
}

pub type Result<T> = std::result::Result<T, ControllerError>;

/// A key as the controller sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Digit(u8),
    Space,
    Char(char),
}

impl Key {
    /// Parse a key name: `"space"`, a digit, or any other single character.
    pub fn parse(name: &str) -> Option<Key> {
        if name.eq_ignore_ascii_case("space") {
            return Some(Key::Space);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(' '), None) => Some(Key::Space),
            (Some(c), None) => Some(match c.to_digit(10) {
                Some(d) => Key::Digit(d as u8),
                None => Key::Char(c.to_ascii_lowercase()),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Digit(d) => write!(f, "{d}"),
            Key::Space => write!(f, "space"),
            Key::Char(c) => write!(f, "{c}"),
        }
    }
}

/// Raw input delivered by a front end.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key(Key),
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    Resize(Size),
    RenameEdited(String),
    /// A per-class button or command.
    ClassAction(String),
    AddImages,
}

/// What a key or button asks the engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Commit(String),
    Next,
    AddImages,
}

/// Key-to-command table for one project.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    bindings: Vec<(Key, Command)>,
}

impl KeyMap {
    /// Digit `0` sends back to `unsorted`, `1`..`9` address the sortable
    /// classes in order, and each configured next key skips.
    pub fn for_project(project: &Project, keys: &KeysConfig) -> Self {
        let unsorted = project
            .classes
            .iter()
            .find(|c| naming::is_unsorted(c))
            .cloned()
            .unwrap_or_else(|| naming::UNSORTED.to_string());

        let mut bindings = vec![(Key::Digit(0), Command::Commit(unsorted))];
        for digit in 1..=9u8 {
            if let Some(class) = project.class_for_slot(usize::from(digit)) {
                bindings.push((Key::Digit(digit), Command::Commit(class.to_string())));
            }
        }
        for name in &keys.next {
            match Key::parse(name) {
                Some(key @ (Key::Space | Key::Char(_))) => bindings.push((key, Command::Next)),
                _ => log::warn!("ignoring next key {name:?}"),
            }
        }
        Self { bindings }
    }

    pub fn command_for(&self, key: Key) -> Option<&Command> {
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == key)
            .map(|(_, command)| command)
    }

    pub fn bindings(&self) -> &[(Key, Command)] {
        &self.bindings
    }
}

/// Source of files for "add images".
pub trait FilePicker {
    /// Files the operator chose; empty when cancelled.
    fn choose_files(&mut self) -> Vec<PathBuf>;
}

impl<F: FnMut() -> Vec<PathBuf>> FilePicker for F {
    fn choose_files(&mut self) -> Vec<PathBuf> {
        self()
    }
}

/// One line for the status area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Warning(String),
    Error(String),
}

/// Outcome of handling one event.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Response {
    pub redraw: bool,
    pub status: Vec<Status>,
}

impl Response {
    fn none() -> Self {
        Self::default()
    }

    fn redraw() -> Self {
        Self {
            redraw: true,
            status: Vec::new(),
        }
    }

    fn push(&mut self, status: Status) {
        self.status.push(status);
    }
}

/// Everything a front end needs to paint the sorting screen.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The image scaled to fit the viewport.
    pub image: DynamicImage,
    pub mapping: ViewMapping,
    /// Pending crop as `(left, top, right, bottom)` in viewport space.
    pub overlay: Option<(f64, f64, f64, f64)>,
}

/// Drives one open project.
pub struct Controller<B: ImageBackend, P: FilePicker> {
    project: Project,
    backend: B,
    picker: P,
    session: SortSession,
    selector: CropSelector,
    keymap: KeyMap,
    viewport: Size,
}

impl<B: ImageBackend, P: FilePicker> Controller<B, P> {
    pub fn new(project: Project, backend: B, picker: P, config: &AppConfig) -> Self {
        let keymap = KeyMap::for_project(&project, &config.keys);
        Self {
            project,
            backend,
            picker,
            session: SortSession::new(config.sort_options()),
            selector: CropSelector::new(),
            keymap,
            viewport: DEFAULT_VIEWPORT,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn session(&self) -> &SortSession {
        &self.session
    }

    pub fn current(&self) -> Option<&CurrentItem> {
        self.session.current()
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Load the first image after opening the project.
    pub fn start(&mut self) -> Result<Response> {
        self.load_next()
    }

    pub fn handle(&mut self, event: InputEvent) -> Result<Response> {
        match event {
            InputEvent::Key(key) => match self.keymap.command_for(key).cloned() {
                Some(command) => self.run(command),
                None => Ok(Response::none()),
            },
            InputEvent::ClassAction(class) => self.run(Command::Commit(class)),
            InputEvent::AddImages => self.run(Command::AddImages),
            InputEvent::PointerDown(point) => Ok(self.pointer_down(point)),
            InputEvent::PointerMove(point) => Ok(self.pointer_move(point)),
            InputEvent::PointerUp(point) => Ok(self.pointer_up(point)),
            InputEvent::Resize(size) => {
                self.viewport = size;
                Ok(Response::redraw())
            }
            InputEvent::RenameEdited(text) => {
                self.session.set_rename(&text);
                Ok(Response::none())
            }
        }
    }

    pub fn run(&mut self, command: Command) -> Result<Response> {
        match command {
            Command::AddImages => self.add_images(),
            _ if !self.session.is_loaded() => Ok(Response::none()),
            Command::Next => self.load_next(),
            Command::Commit(class) => self.commit(&class),
        }
    }

    /// Render data for the current image, or `None` when nothing is loaded.
    pub fn frame(&self) -> Option<Frame> {
        let (image, mapping) = self.session.preview(&self.backend, self.viewport)?;
        let overlay = self
            .current()
            .and_then(|item| item.crop)
            .map(|rect| mapping.rect_to_viewport(&rect));
        Some(Frame {
            image,
            mapping,
            overlay,
        })
    }

    fn mapping(&self) -> Option<ViewMapping> {
        self.session.mapping(self.viewport)
    }

    fn pointer_down(&mut self, point: Point) -> Response {
        let mapping = self.mapping();
        if !self.selector.press(point, mapping.as_ref()) {
            return Response::none();
        }
        // A new gesture replaces whatever crop was pending.
        self.session.set_crop(None);
        Response::redraw()
    }

    fn pointer_move(&mut self, point: Point) -> Response {
        let mapping = self.mapping();
        match self.selector.drag(point, mapping.as_ref()) {
            Some(rect) => {
                self.session.set_crop(Some(rect));
                Response::redraw()
            }
            None => Response::none(),
        }
    }

    fn pointer_up(&mut self, point: Point) -> Response {
        let mapping = self.mapping();
        let rect = self.selector.drag(point, mapping.as_ref());
        if !self.selector.release() {
            return Response::none();
        }
        if let Some(rect) = rect {
            self.session.set_crop(Some(rect));
        }
        Response::redraw()
    }

    fn load_next(&mut self) -> Result<Response> {
        self.selector.reset();
        let outcome = self.session.load_next(&self.project, &self.backend)?;
        let mut response = Response::redraw();
        if outcome == LoadOutcome::Empty {
            response.push(Status::Info(output::format_empty_pool()));
        }
        Ok(response)
    }

    fn commit(&mut self, class: &str) -> Result<Response> {
        let report = match self.session.commit(&self.project, &self.backend, class) {
            Ok(report) => report,
            Err(SortError::NoCurrentItem) => return Ok(Response::none()),
            Err(e) => return Err(e.into()),
        };
        self.selector.reset();

        let mut response = Response::redraw();
        response.push(Status::Info(output::format_commit(&report)));
        for warning in &report.warnings {
            response.push(Status::Warning(output::format_commit_warning(warning)));
        }
        match &report.next {
            Ok(LoadOutcome::Empty) => response.push(Status::Info(output::format_empty_pool())),
            Ok(LoadOutcome::Loaded(_)) => {}
            Err(e) => response.push(Status::Error(e.to_string())),
        }
        Ok(response)
    }

    fn add_images(&mut self) -> Result<Response> {
        let chosen = self.picker.choose_files();
        if chosen.is_empty() {
            return Ok(Response::none());
        }
        let report = project::import_images(&self.project, &chosen)?;
        let mut response = Response::redraw();
        response.push(Status::Info(output::format_import(report.imported.len())));
        for (source, reason) in &report.failed {
            response.push(Status::Warning(output::format_import_failure(source, reason)));
        }
        if !self.session.is_loaded() {
            let loaded = self.load_next()?;
            response.status.extend(loaded.status);
        }
        Ok(response)
    }
}
