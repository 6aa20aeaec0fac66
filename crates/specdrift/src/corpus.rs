//! Corpus enumeration and document access.
//!
//! The ranker and budgeter never touch the filesystem directly; they go
//! through a [`DocumentSource`]. This module provides the filesystem and
//! in-memory implementations, plus the test-file heuristics used when
//! enumerating a directory tree.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Source extensions considered when looking for test files.
const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "js", "jsx", "mjs", "cjs", "ts", "tsx", "go", "rs", "java", "kt", "rb", "cs", "php",
    "scala", "swift",
];

/// Directory names that mark everything beneath them as test code.
const TEST_DIRS: &[&str] = &[
    "test",
    "tests",
    "__tests__",
    "spec",
    "specs",
    "e2e",
    "integration",
    "integration_tests",
];

/// Opaque reference to one corpus document: a `/`-separated path relative to
/// the corpus root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle {
    pub path: String,
}

impl DocumentHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Final path component (the file name).
    pub fn name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str())
    }

    /// Extension of the file name, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.name();
        name.rsplit_once('.').map(|(_, ext)| ext)
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl From<&str> for DocumentHandle {
    fn from(path: &str) -> Self {
        DocumentHandle::new(path)
    }
}

/// Reads corpus documents by handle.
///
/// Implemented for closures, so a plain `|handle| -> Result<String>` works
/// wherever a source is expected.
pub trait DocumentSource {
    fn read_document(&self, handle: &DocumentHandle) -> Result<String>;
}

impl<F> DocumentSource for F
where
    F: Fn(&DocumentHandle) -> Result<String>,
{
    fn read_document(&self, handle: &DocumentHandle) -> Result<String> {
        self(handle)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Documents held in memory, enumerated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: IndexMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(path.into(), text.into());
    }

    pub fn handles(&self) -> Vec<DocumentHandle> {
        self.documents.keys().map(DocumentHandle::new).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentSource for MemorySource {
    fn read_document(&self, handle: &DocumentHandle) -> Result<String> {
        self.documents.get(handle.as_str()).cloned().ok_or_else(|| {
            Error::unreadable(
                handle,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such document"),
            )
        })
    }
}

// ============================================================================
// Filesystem
// ============================================================================

/// Options for [`FsSource::discover`].
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Only keep files that look like tests (see [`is_test_file`]).
    pub test_files_only: bool,
    /// Skip files larger than this many bytes.
    pub max_file_size: Option<u64>,
    /// Directory names never descended into.
    pub skip_dirs: Vec<String>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            test_files_only: true,
            max_file_size: Some(1024 * 1024),
            skip_dirs: [
                ".git",
                "node_modules",
                "target",
                "vendor",
                "dist",
                "build",
                ".venv",
                "venv",
                "__pycache__",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Documents under a root directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerate candidate documents beneath the root, sorted by path so the
    /// enumeration order is stable across runs.
    pub fn discover(&self, options: &DiscoverOptions) -> Result<Vec<DocumentHandle>> {
        let mut handles = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !(entry.file_type().is_dir()
                        && entry
                            .file_name()
                            .to_str()
                            .is_some_and(|name| options.skip_dirs.iter().any(|d| d == name)))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("failed to read directory entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            if let Some(limit) = options.max_file_size
                && entry.metadata().map(|m| m.len() > limit).unwrap_or(false)
            {
                log::debug!("skipping oversized file {}", entry.path().display());
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if options.test_files_only && !is_test_file(&path) {
                continue;
            }
            handles.push(DocumentHandle::new(path));
        }

        log::info!(
            "found {} candidate documents under {}",
            handles.len(),
            self.root.display()
        );
        Ok(handles)
    }
}

impl DocumentSource for FsSource {
    fn read_document(&self, handle: &DocumentHandle) -> Result<String> {
        std::fs::read_to_string(self.root.join(&handle.path))
            .map_err(|source| Error::unreadable(handle, source))
    }
}

/// Fail with [`Error::EmptyCorpus`] when discovery produced no candidates.
pub fn ensure_nonempty(handles: &[DocumentHandle]) -> Result<()> {
    if handles.is_empty() {
        return Err(Error::EmptyCorpus);
    }
    Ok(())
}

// ============================================================================
// Test-file heuristics
// ============================================================================

/// Whether a `/`-separated path looks like a test file: a source file whose
/// name follows a common test naming convention, or that lives under a test
/// directory.
///
/// ```
/// use specdrift::corpus::is_test_file;
///
/// assert!(is_test_file("tests/test_users.py"));
/// assert!(is_test_file("src/users.spec.ts"));
/// assert!(is_test_file("pkg/users_test.go"));
/// assert!(!is_test_file("src/users.py"));
/// assert!(!is_test_file("tests/fixtures/users.json"));
/// ```
pub fn is_test_file(path: &str) -> bool {
    let handle = DocumentHandle::new(path);
    let Some(ext) = handle.extension() else {
        return false;
    };
    if !SOURCE_EXTENSIONS.contains(&ext) {
        return false;
    }

    let name = handle.name();
    let stem = &name[..name.len() - ext.len() - 1];
    let named_like_test = stem.starts_with("test_")
        || stem.ends_with("_test")
        || stem.ends_with("_spec")
        || stem.ends_with(".test")
        || stem.ends_with(".spec")
        || stem.ends_with("Test")
        || stem.ends_with("Tests")
        || stem.ends_with("IT");
    if named_like_test {
        return true;
    }

    path.split('/')
        .rev()
        .skip(1)
        .any(|dir| TEST_DIRS.contains(&dir))
}
