pub mod error;
pub mod generator;
pub mod sink;
pub mod walk;

pub use error::{ArtifactError, BuildError};
pub use generator::{BuildReport, Gen};
pub use sink::{DirSink, MemorySink, OutputSink};
