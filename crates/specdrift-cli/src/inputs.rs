//! Arguments shared by the commands that need a change list or a corpus.

use anyhow::{Context, Result, bail};
use clap::Args;
use specdrift::{ChangeRecord, DiscoverOptions, DocumentHandle, DocumentSource, FsSource};
use specdrift_git::{RevisionRange, TreeSource};
use std::path::{Path, PathBuf};

/// Where the two revisions of a description come from: a pair of files, or
/// a git repository and revision range.
#[derive(Args, Debug)]
pub struct SpecInput {
    /// Old revision of the description
    #[arg(long, requires = "new", conflicts_with = "range")]
    pub old: Option<PathBuf>,

    /// New revision of the description
    #[arg(long, requires = "old")]
    pub new: Option<PathBuf>,

    /// Git repository to read the descriptions (and --tests-rev corpus) from
    #[arg(short, long)]
    pub repo: Option<PathBuf>,

    /// Revision range, `old..new`
    #[arg(long, default_value = "HEAD~1..HEAD")]
    pub range: String,

    /// Description path inside the repository [default: every changed description]
    #[arg(long)]
    pub spec: Option<String>,
}

impl SpecInput {
    /// Load both revisions and diff them. A side that fails to parse is
    /// logged and contributes no changes.
    pub fn load_changes(&self) -> Result<Vec<ChangeRecord>> {
        if let (Some(old), Some(new)) = (&self.old, &self.new) {
            let old_raw = read_file(old)?;
            let new_raw = read_file(new)?;
            return Ok(diff_pair(&old_raw, &new_raw, &new.display().to_string()));
        }

        let Some(repo_path) = &self.repo else {
            bail!("Provide --old and --new, or --repo");
        };
        let repo = open_repo(repo_path)?;
        let range = RevisionRange::parse(&self.range);
        let specs = match &self.spec {
            Some(spec) => vec![spec.clone()],
            None => specdrift_git::changed_specs(&repo, &range)?,
        };
        if specs.is_empty() {
            log::info!("no description files changed in {}", self.range);
        }

        let mut changes = Vec::new();
        for spec in &specs {
            let (old_raw, new_raw) = specdrift_git::read_spec_pair(&repo, &range, spec)
                .with_context(|| format!("Failed to read {} in {}", spec, self.range))?;
            changes.extend(diff_pair(&old_raw, &new_raw, spec));
        }
        Ok(changes)
    }
}

fn diff_pair(old_raw: &str, new_raw: &str, label: &str) -> Vec<ChangeRecord> {
    let outcome = specdrift::diff_text(old_raw, new_raw);
    if let Some(e) = &outcome.error {
        log::warn!("{}: {}; reporting no changes", label, e);
    }
    outcome.changes
}

/// The test corpus: a directory, or a revision of the `--repo` repository.
#[derive(Args, Debug)]
pub struct CorpusInput {
    /// Directory holding the test corpus
    #[arg(long, default_value = ".")]
    pub tests: PathBuf,

    /// Read the corpus from this revision of --repo instead of --tests
    #[arg(long, requires = "repo")]
    pub tests_rev: Option<String>,

    /// Consider every file, not only files that look like tests
    #[arg(long)]
    pub all_files: bool,
}

impl CorpusInput {
    pub fn options(&self) -> DiscoverOptions {
        DiscoverOptions {
            test_files_only: !self.all_files,
            ..Default::default()
        }
    }

    /// Enumerate the corpus and hand it, with a reader, to `f`.
    pub fn with_source<T>(
        &self,
        repo: Option<&Path>,
        f: impl FnOnce(&[DocumentHandle], &dyn DocumentSource) -> Result<T>,
    ) -> Result<T> {
        let options = self.options();
        match (&self.tests_rev, repo) {
            (Some(rev), Some(repo_path)) => {
                let repo = open_repo(repo_path)?;
                let source = TreeSource::at(&repo, rev)?;
                let handles = source.discover(&options)?;
                warn_if_empty(&handles);
                f(&handles, &source)
            }
            (Some(_), None) => bail!("--tests-rev requires --repo"),
            (None, _) => {
                let source = FsSource::new(&self.tests);
                let handles = source
                    .discover(&options)
                    .with_context(|| format!("Failed to scan {:?}", self.tests))?;
                warn_if_empty(&handles);
                f(&handles, &source)
            }
        }
    }
}

fn warn_if_empty(handles: &[DocumentHandle]) {
    if let Err(e) = specdrift::corpus::ensure_nonempty(handles) {
        log::warn!("{}", e);
    }
}

pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

pub fn open_repo(path: &Path) -> Result<git2::Repository> {
    git2::Repository::open(path)
        .with_context(|| format!("Failed to open repository at {:?}", path))
}
