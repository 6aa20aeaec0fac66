use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("spec is neither valid JSON ({json}) nor valid YAML ({yaml})")]
    UnparsableSpec { json: String, yaml: String },

    #[error("invalid spec structure: {0}")]
    InvalidSpec(String),

    #[error("unreadable document {handle}: {source}")]
    UnreadableDocument {
        handle: String,
        #[source]
        source: std::io::Error,
    },

    /// Returned by [`crate::corpus::ensure_nonempty`]. Ranking an empty corpus
    /// is not an error; this is for callers that want to report it.
    #[error("no candidate documents supplied")]
    EmptyCorpus,
}

impl Error {
    /// Wrap an I/O failure for a specific corpus document.
    pub fn unreadable(handle: impl std::fmt::Display, source: std::io::Error) -> Self {
        Error::UnreadableDocument {
            handle: handle.to_string(),
            source,
        }
    }
}
