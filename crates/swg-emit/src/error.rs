use std::process::ExitStatus;

use thiserror::Error;

/// Failure to produce one artifact. Other artifacts are unaffected.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to render template {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Failure of an external source formatter.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{program} produced non-UTF-8 output")]
    Encoding { program: String },
}
