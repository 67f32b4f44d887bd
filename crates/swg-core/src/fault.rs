//! Non-fatal problems collected while scanning, resolving, and assembling.
//!
//! A degraded build still succeeds, but every fault that shaped its output is
//! kept here so callers can tell a partial result from a clean one.

use std::fmt;
use std::path::PathBuf;

/// Where in the scanned sources a fault originated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Category of a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// A source file could not be read or parsed.
    Source,
    /// A malformed annotation on one handler or type.
    Directive,
    /// A type reference that could not be resolved against the catalog.
    Resolution,
    /// Path template placeholders and declared path parameters disagree.
    PathParameter,
    /// Two handlers registered the same (path, method).
    Duplicate,
    /// The assembled document is inconsistent, e.g. two properties share a serialized name.
    Validation,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Source => "source",
            FaultKind::Directive => "directive",
            FaultKind::Resolution => "resolution",
            FaultKind::PathParameter => "path-parameter",
            FaultKind::Duplicate => "duplicate",
            FaultKind::Validation => "validation",
        }
    }
}

/// One recorded fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    pub location: Option<SourceLocation>,
    pub message: String,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {} fault: {}", self.kind.as_str(), self.message),
            None => write!(f, "{} fault: {}", self.kind.as_str(), self.message),
        }
    }
}

/// An ordered list of faults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Faults(Vec<Fault>);

impl Faults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fault and log it.
    pub fn push(
        &mut self,
        kind: FaultKind,
        location: Option<&SourceLocation>,
        message: impl Into<String>,
    ) {
        let fault = Fault {
            kind,
            location: location.cloned(),
            message: message.into(),
        };
        log::warn!("{fault}");
        self.0.push(fault);
    }

    pub fn extend(&mut self, other: Faults) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fault> {
        self.0.iter()
    }

    /// Faults of a single kind, in recording order.
    pub fn of_kind(&self, kind: FaultKind) -> impl Iterator<Item = &Fault> {
        self.0.iter().filter(move |f| f.kind == kind)
    }

    pub fn into_vec(self) -> Vec<Fault> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Faults {
    type Item = &'a Fault;
    type IntoIter = std::slice::Iter<'a, Fault>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
