#![doc = include_str!("../README.md")]

pub mod budget;
pub mod corpus;
pub mod diff;
pub mod error;
pub mod extract;
pub mod parse;
pub mod rank;
pub mod types;

// Everything a caller typically needs is re-exported at the crate root.
// The stages are, in pipeline order:
//
// - [`parse`] and [`diff`] turn two spec revisions into [`ChangeRecord`]s
// - [`extract`] derives identifiers from the changes
// - [`rank`] scores a corpus of documents against those identifiers
// - [`budget`] renders the top documents within a token budget

pub use budget::{BudgetConfig, BudgetedContext, ContextBundle, budget};
pub use corpus::{DiscoverOptions, DocumentHandle, DocumentSource, FsSource, MemorySource};
pub use diff::{DiffOutcome, DiffSummary, diff, diff_text};
pub use error::{Error, Result};
pub use extract::extract;
pub use parse::parse;
pub use rank::{Fallback, RankConfig, Ranking, ScoredDocument, SkippedDocument, rank, rank_with};
pub use types::{
    ChangeKind, ChangeRecord, HTTP_METHODS, Location, NormalizedSpec, Operation, Operations,
    Parameter, ParameterDelta, Response, ResponseDelta,
};
