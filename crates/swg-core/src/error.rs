use std::path::PathBuf;

use thiserror::Error;

/// Problems with the run configuration. These abort a build before any
/// output is written.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("search dir {} does not exist", .0.display())]
    SearchDirNotFound(PathBuf),

    #[error("no search dir configured")]
    NoSearchDir,

    #[error("entry point {} does not exist", .0.display())]
    EntryPointNotFound(PathBuf),

    #[error("entry point {} could not be read: {source}", .path.display())]
    EntryPointUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output location {} is not writable: {source}", .path.display())]
    OutputNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("unknown naming strategy: {0}")]
    UnknownNamingStrategy(String),

    #[error("unknown output type: {0}")]
    UnknownOutputType(String),
}
