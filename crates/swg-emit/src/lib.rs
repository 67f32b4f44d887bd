pub mod error;
pub mod format;
pub mod json;
pub mod stub;
pub mod yaml;

pub use error::{EmitError, FormatError};
pub use format::{Passthrough, Rustfmt, SourceFormatter, format_or_original};
pub use json::to_json;
pub use stub::{DEFAULT_TEMPLATE, StubOptions, render_stub};
pub use yaml::json_to_yaml;
