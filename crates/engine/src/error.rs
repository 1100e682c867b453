use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by engine commands and project operations.
#[derive(Debug)]
pub enum EngineError {
    ProjectNotLoaded,
    InvalidRange {
        from: i64,
        to: i64,
        every: i64,
    },
    InvalidTimestamp {
        input: String,
    },
    UnsupportedProjectFormat(PathBuf),
    ProjectIo {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    ProjectJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    ProjectYaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    Media {
        path: PathBuf,
        reason: String,
    },
}

impl EngineError {
    /// Returns true for failures reading or writing the project file.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedProjectFormat(_)
                | Self::ProjectIo { .. }
                | Self::ProjectJson { .. }
                | Self::ProjectYaml { .. }
        )
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotLoaded => write!(f, "project is not loaded"),
            Self::InvalidRange { every, .. } if *every <= 0 => {
                write!(f, "breakpoint spacing must be positive, got {every} ms")
            }
            Self::InvalidRange { from, to, every } => write!(
                f,
                "too many breakpoints from {from} ms to {to} ms every {every} ms"
            ),
            Self::InvalidTimestamp { input } => write!(f, "invalid timestamp: {input:?}"),
            Self::UnsupportedProjectFormat(path) => {
                write!(f, "unsupported project file format: {}", path.display())
            }
            Self::ProjectIo {
                context,
                path,
                source,
            } => write!(f, "{context}: {} ({source})", path.display()),
            Self::ProjectJson { path, source } => write!(
                f,
                "project serialization/deserialization failed at {} ({source})",
                path.display()
            ),
            Self::ProjectYaml { path, source } => write!(
                f,
                "project serialization/deserialization failed at {} ({source})",
                path.display()
            ),
            Self::Media { path, reason } => {
                write!(f, "media error for {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ProjectIo { source, .. } => Some(source),
            Self::ProjectJson { source, .. } => Some(source),
            Self::ProjectYaml { source, .. } => Some(source),
            _ => None,
        }
    }
}
