//! Token-bounded rendering of ranked documents.
//!
//! Token counts are estimated as `chars / 3.5`; there is no real tokenizer.
//! Truncation is line-based and never parses the document's grammar.

use crate::corpus::{DocumentHandle, DocumentSource};
use crate::rank::ScoredDocument;
use serde::Serialize;
use std::cmp::Reverse;

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: f64 = 3.5;

/// Prefixes (after trimming) that mark a line as an import or definition.
const DECLARATION_PREFIXES: &[&str] = &[
    "import ",
    "use ",
    "package ",
    "#include",
    "using ",
    "require(",
    "require ",
    "extern crate",
    "def ",
    "async def ",
    "class ",
    "fn ",
    "pub fn ",
    "async fn ",
    "pub async fn ",
    "func ",
    "function ",
    "async function ",
    "export ",
    "describe(",
    "describe.",
    "context(",
    "test(",
    "it(",
    "#[test]",
    "#[tokio::test]",
    "#[cfg(test)]",
    "@test",
    "@pytest",
    "@before",
    "@after",
    "mod ",
];

/// Content markers checked (in order) for the framework hint.
const FRAMEWORK_MARKERS: &[(&str, &str)] = &[
    ("import pytest", "pytest"),
    ("@pytest", "pytest"),
    ("import unittest", "unittest"),
    ("unittest.testcase", "unittest"),
    ("from 'vitest'", "vitest"),
    ("from \"vitest\"", "vitest"),
    ("@playwright/test", "playwright"),
    ("cy.visit(", "cypress"),
    ("cy.request(", "cypress"),
    ("require('mocha')", "mocha"),
    ("from 'chai'", "mocha"),
    ("require('chai')", "mocha"),
    ("@jest/globals", "jest"),
    ("jest.", "jest"),
    ("supertest", "jest"),
    ("\"testing\"", "go-testing"),
    ("#[tokio::test]", "rust"),
    ("#[test]", "rust"),
    ("org.junit", "junit"),
    ("rspec.describe", "rspec"),
    ("require 'rails_helper'", "rspec"),
    ("require 'spec_helper'", "rspec"),
];

/// Configuration for [`budget`].
#[derive(Debug, Clone)]
pub struct BudgetConfig {
    /// Documents longer than this many characters are truncated.
    pub per_document_chars: usize,
    /// Rendering stops before the accumulated estimate exceeds this.
    pub total_tokens: usize,
    /// Declaration lines kept verbatim at the head of a truncated document.
    pub max_declaration_lines: usize,
    /// Assumed average line width when sizing the body of a truncated document.
    pub chars_per_line: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            per_document_chars: 6_000,
            total_tokens: 12_000,
            max_declaration_lines: 10,
            chars_per_line: 50,
        }
    }
}

/// One document rendered for the prompt payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetedContext {
    pub identity: String,
    pub framework_hint: String,
    pub rendered_text: String,
    pub estimated_tokens: usize,
    pub truncated: bool,
}

/// Output of [`budget`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContextBundle {
    pub contexts: Vec<BudgetedContext>,
    /// Readable documents left out because the token budget ran out.
    pub skipped: usize,
    /// Documents that could not be read.
    pub unreadable: Vec<DocumentHandle>,
    pub total_tokens: usize,
}

/// Estimated token count of `text`.
pub fn estimate_tokens(text: &str) -> f64 {
    text.chars().count() as f64 / CHARS_PER_TOKEN
}

/// Render ranked documents into a token-bounded bundle.
///
/// Documents are taken in rank order (highest score first); among equal
/// scores the smaller file goes first, and equal sizes keep rank order.
/// Rendering stops when the next one would push the estimate past
/// [`BudgetConfig::total_tokens`].
///
/// # Examples
///
/// ```
/// use specdrift::{budget, BudgetConfig, MemorySource, ScoredDocument, DocumentHandle};
///
/// let source = MemorySource::new().with_document("test_users.py", "import pytest\n");
/// let ranked = vec![ScoredDocument {
///     handle: DocumentHandle::new("test_users.py"),
///     matched: Default::default(),
///     score: 0,
/// }];
///
/// let bundle = budget(&ranked, &source, &BudgetConfig::default());
/// assert_eq!(bundle.contexts[0].framework_hint, "pytest");
/// assert!(!bundle.contexts[0].truncated);
/// ```
pub fn budget<S>(documents: &[ScoredDocument], source: &S, config: &BudgetConfig) -> ContextBundle
where
    S: DocumentSource + ?Sized,
{
    let mut bundle = ContextBundle::default();

    let mut loaded: Vec<(&ScoredDocument, String)> = Vec::with_capacity(documents.len());
    for doc in documents {
        match source.read_document(&doc.handle) {
            Ok(text) => loaded.push((doc, text)),
            Err(e) => {
                log::warn!("skipping unreadable document {}: {}", doc.handle, e);
                bundle.unreadable.push(doc.handle.clone());
            }
        }
    }
    loaded.sort_by_key(|(doc, text)| (Reverse(doc.score), text.len()));

    let limit = config.total_tokens as f64;
    let mut used = 0.0;
    for (index, (doc, text)) in loaded.iter().enumerate() {
        let handle = &doc.handle;
        let (rendered, truncated) = render_document(text, config);
        let cost = estimate_tokens(&rendered);
        if used + cost > limit {
            bundle.skipped = loaded.len() - index;
            log::info!(
                "context budget of {} tokens reached; skipped {} remaining document(s)",
                config.total_tokens,
                bundle.skipped
            );
            break;
        }
        used += cost;
        bundle.contexts.push(BudgetedContext {
            identity: handle.to_string(),
            framework_hint: framework_hint(handle, text).to_string(),
            rendered_text: rendered,
            estimated_tokens: cost.ceil() as usize,
            truncated,
        });
    }

    bundle.total_tokens = used.ceil() as usize;
    bundle
}

/// Render one document, truncating it when it exceeds the per-document
/// character budget. Returns the text and whether it was truncated.
pub fn render_document(text: &str, config: &BudgetConfig) -> (String, bool) {
    if text.chars().count() <= config.per_document_chars {
        return (text.to_string(), false);
    }

    let mut declarations: Vec<&str> = Vec::new();
    let mut body: Vec<&str> = Vec::new();
    for line in text.lines() {
        if is_declaration(line) {
            if declarations.len() < config.max_declaration_lines {
                declarations.push(line);
            }
        } else {
            body.push(line);
        }
    }

    let declaration_chars: usize = declarations.iter().map(|l| l.chars().count() + 1).sum();
    let body_lines = config.per_document_chars.saturating_sub(declaration_chars)
        / config.chars_per_line.max(1);

    let kept_body = body.len().min(body_lines);
    let omitted = text.lines().count() - declarations.len() - kept_body;

    let mut rendered = String::new();
    for line in declarations.iter().chain(body.iter().take(kept_body)) {
        rendered.push_str(line);
        rendered.push('\n');
    }
    rendered.push_str(&format!("... [truncated: {} more lines]\n", omitted));

    (rendered, true)
}

/// Whether a line looks like an import or a definition.
pub fn is_declaration(line: &str) -> bool {
    let trimmed = line.trim_start().to_lowercase();
    if trimmed.starts_with("from ") && trimmed.contains(" import ") {
        return true;
    }
    if trimmed.starts_with("const ") || trimmed.starts_with("let ") || trimmed.starts_with("var ")
    {
        return trimmed.contains("require(") || trimmed.contains("= await import(");
    }
    DECLARATION_PREFIXES.iter().any(|p| trimmed.starts_with(p))
}

/// Best guess at the test framework a document uses; `"unknown"` when
/// nothing gives it away.
pub fn framework_hint(handle: &DocumentHandle, text: &str) -> &'static str {
    let lower = text.to_lowercase();
    if let Some(&(_, name)) = FRAMEWORK_MARKERS
        .iter()
        .find(|&&(marker, _)| lower.contains(marker))
    {
        return name;
    }

    let name = handle.name();
    match handle.extension() {
        Some("py") => "pytest",
        Some("go") if name.ends_with("_test.go") => "go-testing",
        Some("rs") => "rust",
        Some("java") | Some("kt") => "junit",
        Some("rb") if name.ends_with("_spec.rb") => "rspec",
        Some("js") | Some("jsx") | Some("ts") | Some("tsx") | Some("mjs") | Some("cjs") => "jest",
        _ => "unknown",
    }
}
