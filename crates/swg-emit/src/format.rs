use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::FormatError;

/// Formats generated Rust source.
pub trait SourceFormatter {
    fn format(&self, source: &str) -> Result<String, FormatError>;
}

/// Pipes source through `rustfmt` on stdin.
#[derive(Debug, Clone)]
pub struct Rustfmt {
    pub program: String,
    pub edition: String,
}

impl Default for Rustfmt {
    fn default() -> Self {
        Self {
            program: "rustfmt".to_string(),
            edition: "2021".to_string(),
        }
    }
}

impl SourceFormatter for Rustfmt {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        let spawn_error = |source: std::io::Error| FormatError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(["--edition", &self.edition])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes()).map_err(spawn_error)?;
        }
        let output = child.wait_with_output().map_err(spawn_error)?;

        if !output.status.success() {
            return Err(FormatError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| FormatError::Encoding {
            program: self.program.clone(),
        })
    }
}

/// Leaves source untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl SourceFormatter for Passthrough {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        Ok(source.to_string())
    }
}

/// Format `source`, keeping the unformatted text when the formatter fails.
pub fn format_or_original(formatter: &dyn SourceFormatter, source: String) -> String {
    match formatter.format(&source) {
        Ok(formatted) => formatted,
        Err(e) => {
            log::warn!("formatting skipped, keeping unformatted source: {e}");
            source
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl SourceFormatter for Upper {
        fn format(&self, source: &str) -> Result<String, FormatError> {
            Ok(source.to_uppercase())
        }
    }

    #[test]
    fn test_formatter_output_is_used() {
        assert_eq!(format_or_original(&Upper, "fn a() {}".to_string()), "FN A() {}");
        assert_eq!(format_or_original(&Passthrough, "x".to_string()), "x");
    }

    #[test]
    fn test_missing_formatter_keeps_source() {
        let formatter = Rustfmt {
            program: "swg-no-such-formatter".to_string(),
            ..Default::default()
        };
        let err = formatter.format("fn main(){}").unwrap_err();
        assert!(matches!(err, FormatError::Spawn { .. }));
        assert_eq!(
            format_or_original(&formatter, "fn main(){}".to_string()),
            "fn main(){}"
        );
    }
}
