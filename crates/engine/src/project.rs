use std::fmt::{Debug, Formatter};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::breakpoints::{BreakpointSet, Timestamp};
use crate::error::Result;
use crate::store::ProjectStore;

const APP_TITLE: &str = "Slideo";

/// Callback invoked after the project's breakpoints changed.
pub type BreakpointObserver = Box<dyn FnMut(&BreakpointSet) + Send>;

/// Persisted shape of a project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDocument {
    /// Video path relative to the project file's directory.
    #[serde(rename = "video-file")]
    pub video_file: String,
    #[serde(default)]
    pub breakpoints: BreakpointSet,
}

/// Observer list that is never copied along with the project.
#[derive(Default)]
struct Observers(Vec<BreakpointObserver>);

impl Observers {
    fn notify(&mut self, breakpoints: &BreakpointSet) {
        for observer in &mut self.0 {
            observer(breakpoints);
        }
    }
}

impl Clone for Observers {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl Debug for Observers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} observer(s)", self.0.len())
    }
}

/// In-memory state of one presentation project.
///
/// All breakpoint edits go through this type so the saved flag stays exact:
/// it is true if and only if the breakpoints match the file on disk. Clones are
/// independent values and do not carry observers.
#[derive(Debug, Clone)]
pub struct ProjectState {
    project_file: PathBuf,
    video_file: String,
    breakpoints: BreakpointSet,
    saved: bool,
    observers: Observers,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            project_file: PathBuf::new(),
            video_file: String::new(),
            breakpoints: BreakpointSet::new(),
            saved: true,
            observers: Observers::default(),
        }
    }
}

impl PartialEq for ProjectState {
    fn eq(&self, other: &Self) -> bool {
        self.project_file == other.project_file
            && self.video_file == other.video_file
            && self.breakpoints == other.breakpoints
            && self.saved == other.saved
    }
}

impl Eq for ProjectState {}

impl ProjectState {
    /// Creates an empty project that has not been written yet.
    pub fn create(project_file: impl Into<PathBuf>, video_file: impl Into<String>) -> Self {
        Self {
            project_file: project_file.into(),
            video_file: video_file.into(),
            breakpoints: BreakpointSet::new(),
            saved: false,
            observers: Observers::default(),
        }
    }

    /// Builds a project from a document just read from `project_file`.
    pub fn from_document(project_file: impl Into<PathBuf>, document: ProjectDocument) -> Self {
        Self {
            project_file: project_file.into(),
            video_file: document.video_file,
            breakpoints: document.breakpoints,
            saved: true,
            observers: Observers::default(),
        }
    }

    /// Reads a project through `store`.
    pub fn load<S>(store: &S, project_file: &Path) -> Result<Self>
    where
        S: ProjectStore + ?Sized,
    {
        let document = store.load(project_file)?;
        info!(
            path = %project_file.display(),
            breakpoint_count = document.breakpoints.len(),
            "project loaded"
        );
        Ok(Self::from_document(project_file, document))
    }

    /// Writes the project through `store`.
    ///
    /// The saved flag is only set once the store reports success.
    pub fn save<S>(&mut self, store: &S) -> Result<()>
    where
        S: ProjectStore + ?Sized,
    {
        store.save(&self.project_file, &self.to_document())?;
        self.saved = true;
        info!(
            path = %self.project_file.display(),
            breakpoint_count = self.breakpoints.len(),
            "project saved"
        );
        Ok(())
    }

    pub fn to_document(&self) -> ProjectDocument {
        ProjectDocument {
            video_file: self.video_file.clone(),
            breakpoints: self.breakpoints.clone(),
        }
    }

    pub fn project_file(&self) -> &Path {
        &self.project_file
    }

    pub fn video_file(&self) -> &str {
        &self.video_file
    }

    pub fn breakpoints(&self) -> &BreakpointSet {
        &self.breakpoints
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Directory containing the project file.
    pub fn project_dir(&self) -> &Path {
        self.project_file.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Video path resolved against the project directory.
    pub fn video_path(&self) -> PathBuf {
        self.project_dir().join(&self.video_file)
    }

    /// Window title, prefixed with `*` while there are unsaved changes.
    pub fn title(&self) -> String {
        let marker = if self.saved { "" } else { "*" };
        match self.project_file.file_stem() {
            Some(stem) => format!("{marker}{} - {APP_TITLE}", stem.to_string_lossy()),
            None => format!("{marker}{APP_TITLE}"),
        }
    }

    /// Registers a callback run after every breakpoint change.
    pub fn subscribe(&mut self, observer: BreakpointObserver) {
        self.observers.0.push(observer);
    }

    pub fn add_breakpoint(&mut self, at: Timestamp) -> bool {
        let changed = self.breakpoints.add(at);
        self.commit(changed, "add")
    }

    pub fn add_breakpoints(&mut self, points: &[Timestamp]) -> bool {
        let changed = self.breakpoints.add_all(points.iter().copied());
        self.commit(changed, "add batch")
    }

    pub fn add_regularly_spaced(
        &mut self,
        from: Timestamp,
        to: Timestamp,
        every: Timestamp,
    ) -> Result<bool> {
        let changed = self.breakpoints.add_regularly_spaced(from, to, every)?;
        Ok(self.commit(changed, "add regularly"))
    }

    pub fn remove_breakpoint(&mut self, at: Timestamp) -> bool {
        let changed = self.breakpoints.remove(at);
        self.commit(changed, "remove")
    }

    pub fn remove_breakpoints(&mut self, points: &[Timestamp]) -> bool {
        let changed = self.breakpoints.remove_all(points.iter().copied());
        self.commit(changed, "remove batch")
    }

    pub fn replace_breakpoint(&mut self, old: Timestamp, new: Timestamp) -> bool {
        let changed = self.breakpoints.replace(old, new);
        self.commit(changed, "replace")
    }

    /// Replaces every field with `other`'s values, keeping this project's
    /// observers, then notifies them.
    pub fn assign(&mut self, other: ProjectState) {
        self.project_file = other.project_file;
        self.video_file = other.video_file;
        self.breakpoints = other.breakpoints;
        self.saved = other.saved;
        self.observers.notify(&self.breakpoints);
    }

    pub(crate) fn set_saved_flag(&mut self, saved: bool) {
        self.saved = saved;
    }

    fn commit(&mut self, changed: bool, operation: &'static str) -> bool {
        if !changed {
            debug!(operation, "breakpoint edit was a no-op");
            return false;
        }
        self.saved = false;
        debug!(
            operation,
            breakpoint_count = self.breakpoints.len(),
            "breakpoints changed"
        );
        self.observers.notify(&self.breakpoints);
        true
    }
}

/// Expresses `video` relative to the directory of `project_file`.
///
/// Both paths are made absolute against the working directory first, so
/// relative command-line arguments resolve the same way the project will.
/// Returns the stored reference and whether the video lives below the project
/// directory. Videos elsewhere get a `../` reference and break when the
/// project directory is moved on its own.
pub fn relative_video_reference(project_file: &Path, video: &Path) -> (String, bool) {
    let project_dir = project_file.parent().unwrap_or_else(|| Path::new(""));
    let (Some(project_dir), Some(video_abs)) =
        (normalized_absolute(project_dir), normalized_absolute(video))
    else {
        return (video.to_string_lossy().into_owned(), false);
    };

    let dir_parts: Vec<Component<'_>> = project_dir.components().collect();
    let video_parts: Vec<Component<'_>> = video_abs.components().collect();
    let shared = dir_parts
        .iter()
        .zip(&video_parts)
        .take_while(|(dir, video)| dir == video)
        .count();
    // Different roots (another drive) have no relative form.
    if shared == 0 {
        return (video_abs.to_string_lossy().into_owned(), false);
    }

    let mut relative = PathBuf::new();
    for _ in shared..dir_parts.len() {
        relative.push(Component::ParentDir.as_os_str());
    }
    for part in &video_parts[shared..] {
        relative.push(part.as_os_str());
    }
    (
        relative.to_string_lossy().into_owned(),
        shared == dir_parts.len(),
    )
}

/// Absolute form of `path` with `.` and `..` folded lexically.
fn normalized_absolute(path: &Path) -> Option<PathBuf> {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    let absolute = std::path::absolute(path).ok()?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Some(normalized)
}
