//! Destinations for rendered artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Receives rendered artifacts by file name.
///
/// `write` may stage; nothing is guaranteed visible until `commit`.
pub trait OutputSink {
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), BuildError>;

    fn commit(&mut self) -> Result<(), BuildError> {
        Ok(())
    }
}

/// Writes into a directory. Each file is staged as a hidden temporary
/// sibling and renamed over its target on commit, so a failed run leaves
/// the previous output in place.
#[derive(Debug)]
pub struct DirSink {
    dir: PathBuf,
    staged: Vec<(PathBuf, PathBuf)>,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staged: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn discard(&mut self) {
        for (temp, _) in self.staged.drain(..) {
            if let Err(e) = fs::remove_file(&temp) {
                log::debug!("could not remove {}: {e}", temp.display());
            }
        }
    }
}

impl OutputSink for DirSink {
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), BuildError> {
        let target = self.dir.join(name);
        if target.is_dir() {
            self.discard();
            return Err(BuildError::Io {
                source: std::io::Error::other("target is a directory"),
                path: target,
            });
        }

        let temp = self.dir.join(format!(".{name}.tmp"));
        if let Err(source) = fs::write(&temp, bytes) {
            self.discard();
            return Err(BuildError::Io { path: temp, source });
        }
        self.staged.push((temp, target));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BuildError> {
        let staged = std::mem::take(&mut self.staged);
        let mut pending = staged.into_iter();
        while let Some((temp, target)) = pending.next() {
            if let Err(source) = fs::rename(&temp, &target) {
                self.staged = pending.collect();
                self.staged.push((temp, target.clone()));
                self.discard();
                return Err(BuildError::Io {
                    path: target,
                    source,
                });
            }
            log::info!("wrote {}", target.display());
        }
        Ok(())
    }
}

impl Drop for DirSink {
    fn drop(&mut self) {
        self.discard();
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), BuildError> {
        self.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}
