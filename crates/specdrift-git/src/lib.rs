#![doc = include_str!("../README.md")]

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use git2::{ObjectType, Oid, Repository, Tree, TreeWalkMode, TreeWalkResult};
use specdrift::corpus::is_test_file;
use specdrift::{DiscoverOptions, DocumentHandle, DocumentSource};
use std::path::Path;

/// Text used for a description that does not exist at a revision.
pub const MISSING_SPEC: &str = "{}";

// ============================================================================
// Revision ranges
// ============================================================================

/// A pair of revisions to compare.
///
/// Written as `"old..new"`. Either side may be omitted and defaults to
/// `HEAD`; a bare `"rev"` compares `rev` against `HEAD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRange {
    pub old: String,
    pub new: String,
}

impl RevisionRange {
    /// Parse a range expression.
    pub fn parse(s: &str) -> Self {
        let (old, new) = s.split_once("..").unwrap_or((s, ""));
        RevisionRange {
            old: or_head(old),
            new: or_head(new.trim_start_matches('.')),
        }
    }
}

fn or_head(rev: &str) -> String {
    if rev.is_empty() {
        "HEAD".to_string()
    } else {
        rev.to_string()
    }
}

// ============================================================================
// Reading descriptions
// ============================================================================

/// Resolve a revision expression to its tree.
pub fn resolve_tree<'repo>(repo: &'repo Repository, rev: &str) -> Result<Tree<'repo>> {
    let object = repo
        .revparse_single(rev)
        .with_context(|| format!("Failed to resolve revision '{}'", rev))?;
    object
        .peel_to_tree()
        .with_context(|| format!("Revision '{}' does not point at a tree", rev))
}

/// Read a file as it exists at `rev`. Returns `None` when the path is absent.
pub fn read_blob_at(repo: &Repository, rev: &str, path: &str) -> Result<Option<String>> {
    let tree = resolve_tree(repo, rev)?;
    read_blob_in(repo, &tree, path)
}

fn read_blob_in(repo: &Repository, tree: &Tree<'_>, path: &str) -> Result<Option<String>> {
    let entry = match tree.get_path(Path::new(path)) {
        Ok(entry) => entry,
        Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let blob = entry
        .to_object(repo)?
        .peel_to_blob()
        .with_context(|| format!("'{}' is not a file", path))?;
    let text = String::from_utf8(blob.content().to_vec())
        .with_context(|| format!("'{}' is not valid UTF-8", path))?;
    Ok(Some(text))
}

/// Read both revisions of a description. A side where the file does not
/// exist reads as [`MISSING_SPEC`].
pub fn read_spec_pair(
    repo: &Repository,
    range: &RevisionRange,
    path: &str,
) -> Result<(String, String)> {
    let old = read_blob_at(repo, &range.old, path)?.unwrap_or_else(|| {
        log::info!("{} does not exist at {}", path, range.old);
        MISSING_SPEC.to_string()
    });
    let new = read_blob_at(repo, &range.new, path)?.unwrap_or_else(|| {
        log::info!("{} does not exist at {}", path, range.new);
        MISSING_SPEC.to_string()
    });
    Ok((old, new))
}

/// Whether a path looks like an API description file.
pub fn is_spec_file(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    if !matches!(ext, "json" | "yaml" | "yml") {
        return false;
    }
    stem.contains("openapi") || stem.contains("swagger") || matches!(stem, "api" | "spec")
}

/// Description files added, modified, or deleted between the two revisions
/// of `range`, in diff order.
pub fn changed_specs(repo: &Repository, range: &RevisionRange) -> Result<Vec<String>> {
    let old_tree = resolve_tree(repo, &range.old)?;
    let new_tree = resolve_tree(repo, &range.new)?;
    let diff = repo.diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;

    let mut paths = Vec::new();
    for delta in diff.deltas() {
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().replace('\\', "/"));
        if let Some(path) = path
            && is_spec_file(&path)
            && !paths.contains(&path)
        {
            paths.push(path);
        }
    }
    log::debug!(
        "{} description file(s) changed in {}..{}",
        paths.len(),
        range.old,
        range.new
    );
    Ok(paths)
}

// ============================================================================
// Test corpus at a revision
// ============================================================================

/// Corpus documents read from a git tree instead of the working directory.
pub struct TreeSource<'repo> {
    repo: &'repo Repository,
    tree: Tree<'repo>,
    rev: String,
}

impl<'repo> TreeSource<'repo> {
    pub fn at(repo: &'repo Repository, rev: &str) -> Result<Self> {
        Ok(TreeSource {
            repo,
            tree: resolve_tree(repo, rev)?,
            rev: rev.to_string(),
        })
    }

    pub fn revision(&self) -> &str {
        &self.rev
    }

    /// Enumerate candidate documents in the tree, in tree order.
    ///
    /// [`DiscoverOptions::max_file_size`] is not applied; blob sizes are only
    /// known once a document is read.
    pub fn discover(&self, options: &DiscoverOptions) -> Result<Vec<DocumentHandle>> {
        let mut handles = Vec::new();
        self.tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            let name = entry.name().unwrap_or("");
            match entry.kind() {
                Some(ObjectType::Tree) if options.skip_dirs.iter().any(|d| d == name) => {
                    TreeWalkResult::Skip
                }
                Some(ObjectType::Blob) => {
                    let path = format!("{}{}", root, name);
                    if !options.test_files_only || is_test_file(&path) {
                        handles.push(DocumentHandle::new(path));
                    }
                    TreeWalkResult::Ok
                }
                _ => TreeWalkResult::Ok,
            }
        })?;
        log::info!(
            "found {} candidate documents at {}",
            handles.len(),
            self.rev
        );
        Ok(handles)
    }
}

impl DocumentSource for TreeSource<'_> {
    fn read_document(&self, handle: &DocumentHandle) -> specdrift::Result<String> {
        match read_blob_in(self.repo, &self.tree, handle.as_str()) {
            Ok(Some(text)) => Ok(text),
            Ok(None) => Err(specdrift::Error::unreadable(
                handle,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not in tree"),
            )),
            Err(e) => Err(specdrift::Error::unreadable(
                handle,
                std::io::Error::other(format!("{:#}", e)),
            )),
        }
    }
}

// ============================================================================
// Revision metadata
// ============================================================================

/// Summary information about a commit.
#[derive(Debug, Clone)]
pub struct RevisionInfo {
    /// Full hex OID.
    pub id: String,
    /// Short (8-char) hex OID.
    pub short_id: String,
    /// First line of the commit message.
    pub subject: String,
    pub author: String,
    /// ISO 8601 commit timestamp.
    pub timestamp: String,
}

/// Describe the commit a revision expression points at.
pub fn describe_revision(repo: &Repository, rev: &str) -> Result<RevisionInfo> {
    let commit = repo
        .revparse_single(rev)
        .with_context(|| format!("Failed to resolve revision '{}'", rev))?
        .peel_to_commit()
        .with_context(|| format!("Revision '{}' is not a commit", rev))?;

    let time = commit.time();
    let timestamp = DateTime::<Utc>::from_timestamp(time.seconds(), 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string());

    Ok(RevisionInfo {
        id: commit.id().to_string(),
        short_id: short_oid(commit.id()),
        subject: commit
            .message()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .to_string(),
        author: commit.author().name().unwrap_or("unknown").to_string(),
        timestamp,
    })
}

fn short_oid(oid: Oid) -> String {
    oid.to_string().chars().take(8).collect()
}
