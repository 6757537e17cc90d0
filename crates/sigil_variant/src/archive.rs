//! Template sources.
//!
//! A [`TemplateArchive`] is a flat namespace of template files: the per-stage
//! main templates (`VertexShader_vs.glsl`, ...), piece files and anything the
//! generated source `#include`s.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use sigil_core::{Result, SigilError};
use sigil_template::IncludeSource;

pub trait TemplateArchive: Send + Sync {
    /// All file names, in any order.
    fn list(&self) -> Vec<String>;

    fn exists(&self, name: &str) -> bool;

    /// Reads a file as UTF-8 text.
    fn read(&self, name: &str) -> Result<String>;
}

/// Lets generated source `#include` other archive files.
pub(crate) struct ArchiveIncludes<'a>(pub &'a dyn TemplateArchive);

impl IncludeSource for ArchiveIncludes<'_> {
    fn load(&self, name: &str) -> Option<String> {
        self.0.read(name).ok()
    }
}

// ============================================================================
// In-memory archive
// ============================================================================

/// Templates held in memory, typically embedded or built by tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    files: FxHashMap<String, String>,
}

impl MemoryArchive {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.files.insert(name.into(), source.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }
}

impl TemplateArchive for MemoryArchive {
    fn list(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    fn exists(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    fn read(&self, name: &str) -> Result<String> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| SigilError::TemplateNotFound(name.to_string()))
    }
}

// ============================================================================
// Directory archive
// ============================================================================

/// Templates read from the files directly inside a directory.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    /// Opens `root`, which must be an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SigilError::TemplateNotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> Option<PathBuf> {
        // Only plain file names; no escaping the root.
        let candidate = Path::new(name);
        let mut components = candidate.components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) => Some(self.root.join(candidate)),
            _ => None,
        }
    }
}

impl TemplateArchive for DirectoryArchive {
    fn list(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Cannot list template directory {}: {e}", self.root.display());
                return Vec::new();
            }
        };

        entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect()
    }

    fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_some_and(|path| path.is_file())
    }

    fn read(&self, name: &str) -> Result<String> {
        let path = self
            .path_of(name)
            .ok_or_else(|| SigilError::TemplateNotFound(name.to_string()))?;
        match fs::read_to_string(&path) {
            Ok(source) => Ok(source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SigilError::TemplateNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
