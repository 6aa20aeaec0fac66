use crate::inputs::{CorpusInput, open_repo};
use anyhow::Result;
use clap::Subcommand;
use specdrift::DocumentHandle;
use specdrift_git::{RevisionInfo, RevisionRange};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ListSource {
    /// List description files changed in a revision range
    Specs {
        /// Path to the git repository
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Revision range, `old..new`
        #[arg(long, default_value = "HEAD~1..HEAD")]
        range: String,
    },
    /// List the files the ranker would consider
    Tests {
        #[command(flatten)]
        corpus: CorpusInput,

        /// Git repository for --tests-rev
        #[arg(short, long)]
        repo: Option<PathBuf>,
    },
}

pub fn run(source: ListSource, json: bool) -> Result<()> {
    match source {
        ListSource::Specs { repo, range } => run_specs(repo, range, json),
        ListSource::Tests { corpus, repo } => run_tests(corpus, repo, json),
    }
}

fn run_specs(repo_path: PathBuf, range: String, json: bool) -> Result<()> {
    let repo = open_repo(&repo_path)?;
    let parsed = RevisionRange::parse(&range);
    let old = specdrift_git::describe_revision(&repo, &parsed.old)?;
    let new = specdrift_git::describe_revision(&repo, &parsed.new)?;
    let specs = specdrift_git::changed_specs(&repo, &parsed)?;

    if json {
        let output = serde_json::json!({
            "source": "git",
            "old": revision_json(&old),
            "new": revision_json(&new),
            "specs": specs,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Range: {} {}", old.short_id, truncate(&old.subject, 40));
        println!("    .. {} {}", new.short_id, truncate(&new.subject, 40));
        println!();
        if specs.is_empty() {
            println!("  (no description files changed)");
        } else {
            for spec in &specs {
                println!("  {}", spec);
            }
        }
    }
    Ok(())
}

fn revision_json(info: &RevisionInfo) -> serde_json::Value {
    serde_json::json!({
        "id": info.id,
        "subject": info.subject,
        "author": info.author,
        "timestamp": info.timestamp,
    })
}

fn run_tests(corpus: CorpusInput, repo: Option<PathBuf>, json: bool) -> Result<()> {
    let handles: Vec<DocumentHandle> =
        corpus.with_source(repo.as_deref(), |handles, _| Ok(handles.to_vec()))?;

    if json {
        let output = serde_json::json!({
            "count": handles.len(),
            "documents": handles,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if handles.is_empty() {
        println!("  (no candidate files)");
    } else {
        for handle in &handles {
            println!("  {}", handle);
        }
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
