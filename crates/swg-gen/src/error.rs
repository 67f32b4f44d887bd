use std::fmt;
use std::path::PathBuf;

use swg_core::error::ConfigError;
use swg_core::fault::Faults;
use swg_emit::EmitError;
use thiserror::Error;

/// Conditions that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every handler was skipped; `faults` says why.
    #[error("no annotated operations found")]
    NoOperations { faults: Faults },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to produce {}", join_names(.failures))]
    Artifacts {
        failures: Vec<ArtifactError>,
        faults: Faults,
    },
}

impl BuildError {
    /// Faults collected before the build was abandoned, if it got that far.
    pub fn faults(&self) -> Option<&Faults> {
        match self {
            BuildError::NoOperations { faults } | BuildError::Artifacts { faults, .. } => {
                Some(faults)
            }
            _ => None,
        }
    }
}

/// One artifact that could not be rendered.
#[derive(Debug)]
pub struct ArtifactError {
    pub file: String,
    pub error: EmitError,
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.error)
    }
}

fn join_names(errors: &[ArtifactError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
