//! Relevance ranking of corpus documents against canonical identifiers.

use crate::corpus::{DocumentHandle, DocumentSource};
use crate::extract::is_placeholder;
use serde::Serialize;
use std::collections::BTreeSet;

/// Configuration for [`rank_with`].
#[derive(Debug, Clone)]
pub struct RankConfig {
    /// `K = clamp(budget_numerator / corpus_size, min_budget, max_budget)`.
    pub budget_numerator: usize,
    pub min_budget: usize,
    pub max_budget: usize,
    /// Fallback width when identifiers exist but nothing matched.
    pub fallback_width: usize,
    /// Fallback width when there were no identifiers at all.
    pub empty_fallback_width: usize,
    /// Lowercase file-name markers preferred by the no-match fallback.
    pub generic_markers: Vec<String>,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            budget_numerator: 15_000,
            min_budget: 2,
            max_budget: 5,
            fallback_width: 2,
            empty_fallback_width: 3,
            generic_markers: ["api", "endpoint", "integration", "service"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Retrieval width for a corpus of `corpus_size` documents. Shrinks as the
/// corpus grows so downstream context stays bounded.
///
/// ```
/// use specdrift::rank::{retrieval_budget, RankConfig};
///
/// let config = RankConfig::default();
/// assert_eq!(retrieval_budget(0, &config), 5);
/// assert_eq!(retrieval_budget(3_000, &config), 5);
/// assert_eq!(retrieval_budget(5_000, &config), 3);
/// assert_eq!(retrieval_budget(100_000, &config), 2);
/// ```
pub fn retrieval_budget(corpus_size: usize, config: &RankConfig) -> usize {
    (config.budget_numerator / corpus_size.max(1)).clamp(config.min_budget, config.max_budget)
}

/// A document with the identifiers it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredDocument {
    pub handle: DocumentHandle,
    pub matched: BTreeSet<String>,
    /// Number of distinct identifiers matched.
    pub score: usize,
}

/// Why a ranking fell back to a heuristic instead of scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// No identifiers were supplied; the head of the corpus is returned.
    EmptyIdentifiers,
    /// Nothing matched; documents with generic API-ish names are returned.
    GenericMarkers,
    /// Nothing matched and no name looked generic; the head of the corpus.
    CorpusOrder,
}

/// A document that could not be read and was left out of ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub handle: DocumentHandle,
    pub reason: String,
}

/// Output of the ranker.
#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    /// At most `budget` documents, best first.
    pub documents: Vec<ScoredDocument>,
    /// The retrieval width K used for this corpus.
    pub budget: usize,
    /// Documents successfully read and scored.
    pub scanned: usize,
    pub skipped: Vec<SkippedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn handles(&self) -> Vec<&DocumentHandle> {
        self.documents.iter().map(|d| &d.handle).collect()
    }
}

/// Rank `corpus` against `identifiers` with the default configuration.
///
/// # Examples
///
/// ```
/// use specdrift::{rank, MemorySource};
/// use std::collections::BTreeSet;
///
/// let source = MemorySource::new()
///     .with_document("test_orders.py", "client.get('/v1/orders')")
///     .with_document("test_users.py", "client.get('/v1/users')");
/// let ids: BTreeSet<String> = ["/v1/users".to_string()].into();
///
/// let ranking = rank(&ids, &source.handles(), &source);
/// assert_eq!(ranking.documents.len(), 1);
/// assert_eq!(ranking.documents[0].handle.as_str(), "test_users.py");
/// ```
pub fn rank<S>(identifiers: &BTreeSet<String>, corpus: &[DocumentHandle], source: &S) -> Ranking
where
    S: DocumentSource + ?Sized,
{
    rank_with(identifiers, corpus, source, &RankConfig::default())
}

/// Rank `corpus` against `identifiers`.
///
/// Documents are read one at a time, scored by the number of distinct
/// identifiers they mention, and stably sorted by descending score so ties
/// keep corpus order. Unreadable documents are logged, reported in
/// [`Ranking::skipped`], and otherwise ignored.
pub fn rank_with<S>(
    identifiers: &BTreeSet<String>,
    corpus: &[DocumentHandle],
    source: &S,
    config: &RankConfig,
) -> Ranking
where
    S: DocumentSource + ?Sized,
{
    let budget = retrieval_budget(corpus.len(), config);
    let patterns: Vec<IdentifierPatterns> = identifiers
        .iter()
        .map(|id| IdentifierPatterns::new(id))
        .collect();

    let mut scored = Vec::with_capacity(corpus.len());
    let mut skipped = Vec::new();
    for handle in corpus {
        match source.read_document(handle) {
            Ok(text) => scored.push(score_document(handle, &text, &patterns)),
            Err(e) => {
                log::warn!("skipping unreadable document {}: {}", handle, e);
                skipped.push(SkippedDocument {
                    handle: handle.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    let scanned = scored.len();

    let (mut hits, misses): (Vec<ScoredDocument>, Vec<ScoredDocument>) =
        scored.into_iter().partition(|d| d.score > 0);

    let (mut documents, fallback) = if hits.is_empty() {
        fallback_documents(identifiers.is_empty(), misses, config)
    } else {
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        (hits, None)
    };
    documents.truncate(budget);

    log::debug!(
        "ranked {} of {} documents (budget {}, {} unreadable)",
        documents.len(),
        corpus.len(),
        budget,
        skipped.len()
    );

    Ranking {
        fallback: fallback.filter(|_| !documents.is_empty()),
        documents,
        budget,
        scanned,
        skipped,
    }
}

fn fallback_documents(
    no_identifiers: bool,
    candidates: Vec<ScoredDocument>,
    config: &RankConfig,
) -> (Vec<ScoredDocument>, Option<Fallback>) {
    if no_identifiers {
        let docs = candidates
            .into_iter()
            .take(config.empty_fallback_width)
            .collect();
        return (docs, Some(Fallback::EmptyIdentifiers));
    }

    let generic: Vec<ScoredDocument> = candidates
        .iter()
        .filter(|d| {
            let name = d.handle.name().to_lowercase();
            config.generic_markers.iter().any(|m| name.contains(m.as_str()))
        })
        .take(config.fallback_width)
        .cloned()
        .collect();
    if !generic.is_empty() {
        return (generic, Some(Fallback::GenericMarkers));
    }

    let docs = candidates
        .into_iter()
        .take(config.fallback_width)
        .collect();
    (docs, Some(Fallback::CorpusOrder))
}

fn score_document(
    handle: &DocumentHandle,
    text: &str,
    patterns: &[IdentifierPatterns],
) -> ScoredDocument {
    let haystack = text.to_lowercase();
    let matched: BTreeSet<String> = patterns
        .iter()
        .filter(|p| p.matches(&haystack))
        .map(|p| p.identifier.clone())
        .collect();
    ScoredDocument {
        handle: handle.clone(),
        score: matched.len(),
        matched,
    }
}

/// The literal substrings that count as a mention of one identifier.
#[derive(Debug, Clone)]
struct IdentifierPatterns {
    identifier: String,
    patterns: Vec<String>,
}

impl IdentifierPatterns {
    fn new(identifier: &str) -> Self {
        let lower = identifier.to_lowercase();
        let segments: Vec<&str> = lower.split('/').filter(|s| !s.is_empty()).collect();
        let concrete: Vec<&str> = segments
            .iter()
            .copied()
            .filter(|s| !is_placeholder(s))
            .collect();

        let mut candidates = vec![
            lower.clone(),
            lower.trim_start_matches('/').to_string(),
            if lower.starts_with('/') {
                format!("/{}", concrete.join("/"))
            } else {
                concrete.join("/")
            },
            segments.join("/"),
        ];
        candidates.extend(
            concrete
                .iter()
                .filter(|s| s.chars().count() > 2)
                .map(|s| s.to_string()),
        );

        let mut patterns: Vec<String> = Vec::new();
        for candidate in candidates {
            if !candidate.is_empty() && candidate != "/" && !patterns.contains(&candidate) {
                patterns.push(candidate);
            }
        }

        Self {
            identifier: identifier.to_string(),
            patterns,
        }
    }

    fn matches(&self, haystack: &str) -> bool {
        self.patterns.iter().any(|p| haystack.contains(p.as_str()))
    }
}
