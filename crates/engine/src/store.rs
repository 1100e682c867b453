use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::project::ProjectDocument;

/// Extension given to new project files that have none.
pub const PROJECT_FILE_EXTENSION: &str = "eo";

/// Persistence operations required by the engine.
pub trait ProjectStore {
    /// Reads the project document stored at `path`.
    fn load(&self, path: &Path) -> Result<ProjectDocument>;

    /// Writes `document` to `path`, replacing any previous content.
    fn save(&self, path: &Path, document: &ProjectDocument) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectFormat {
    Yaml,
    Json,
}

impl ProjectFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("eo" | "yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(EngineError::UnsupportedProjectFormat(path.to_path_buf())),
        }
    }
}

/// File-backed store choosing YAML or JSON from the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileProjectStore;

impl ProjectStore for FileProjectStore {
    fn load(&self, path: &Path) -> Result<ProjectDocument> {
        let format = ProjectFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ProjectIo {
            context: "failed to read project file",
            path: path.to_path_buf(),
            source,
        })?;

        match format {
            ProjectFormat::Yaml => {
                serde_yaml::from_str(&text).map_err(|source| EngineError::ProjectYaml {
                    path: path.to_path_buf(),
                    source,
                })
            }
            ProjectFormat::Json => {
                serde_json::from_str(&text).map_err(|source| EngineError::ProjectJson {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    fn save(&self, path: &Path, document: &ProjectDocument) -> Result<()> {
        let text = match ProjectFormat::from_path(path)? {
            ProjectFormat::Yaml => {
                serde_yaml::to_string(document).map_err(|source| EngineError::ProjectYaml {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            ProjectFormat::Json => serde_json::to_string_pretty(document).map_err(|source| {
                EngineError::ProjectJson {
                    path: path.to_path_buf(),
                    source,
                }
            })?,
        };

        // Write next to the target and rename so a failed write never leaves
        // a truncated project behind.
        let staging = staging_path(path);
        std::fs::write(&staging, text).map_err(|source| EngineError::ProjectIo {
            context: "failed to write project file",
            path: staging.clone(),
            source,
        })?;
        std::fs::rename(&staging, path).map_err(|source| EngineError::ProjectIo {
            context: "failed to replace project file",
            path: path.to_path_buf(),
            source,
        })?;

        debug!(
            path = %path.display(),
            breakpoint_count = document.breakpoints.len(),
            "project document written"
        );
        Ok(())
    }
}

/// Appends the default project extension when `path` has none.
pub fn with_project_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        return path;
    }
    path.with_extension(PROJECT_FILE_EXTENSION)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("project"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{FileProjectStore, ProjectFormat, ProjectStore, with_project_extension};
    use crate::breakpoints::BreakpointSet;
    use crate::error::EngineError;
    use crate::project::ProjectDocument;

    #[test]
    fn format_is_chosen_from_extension() {
        assert_eq!(
            ProjectFormat::from_path(&PathBuf::from("talk.eo")).expect("eo is yaml"),
            ProjectFormat::Yaml
        );
        assert_eq!(
            ProjectFormat::from_path(&PathBuf::from("talk.JSON")).expect("json"),
            ProjectFormat::Json
        );
        assert!(matches!(
            ProjectFormat::from_path(&PathBuf::from("talk.txt")),
            Err(EngineError::UnsupportedProjectFormat(_))
        ));
    }

    #[test]
    fn yaml_document_uses_video_file_key() {
        let document = ProjectDocument {
            video_file: "talk.mp4".to_string(),
            breakpoints: BreakpointSet::from_iter([2_000, 1_000]),
        };

        let yaml = serde_yaml::to_string(&document).expect("serialize");
        assert!(yaml.contains("video-file: talk.mp4"));

        let parsed: ProjectDocument = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(parsed.breakpoints.to_vec(), vec![1_000, 2_000]);
    }

    #[test]
    fn missing_breakpoints_key_loads_as_empty_set() {
        let parsed: ProjectDocument =
            serde_yaml::from_str("video-file: talk.mp4\n").expect("deserialize");
        assert!(parsed.breakpoints.is_empty());
    }

    #[test]
    fn loading_a_missing_file_is_a_persistence_failure() {
        let path = std::env::temp_dir().join(format!(
            "slideo-missing-{}.eo",
            std::process::id()
        ));

        let error = FileProjectStore
            .load(&path)
            .expect_err("missing file must fail");

        assert!(error.is_persistence_failure());
        assert!(matches!(error, EngineError::ProjectIo { .. }));
    }

    #[test]
    fn project_extension_is_only_added_when_missing() {
        assert_eq!(
            with_project_extension(PathBuf::from("/tmp/talk")),
            PathBuf::from("/tmp/talk.eo")
        );
        assert_eq!(
            with_project_extension(PathBuf::from("/tmp/talk.json")),
            PathBuf::from("/tmp/talk.json")
        );
    }
}
