//! Render specdrift output as Markdown.
//!
//! Change lists become a summary table followed by one bullet per change,
//! rankings become a numbered list, and a [`ContextBundle`] becomes a prompt
//! payload: the changes, then each selected test file in a fenced block.
//!
//! # Example
//!
//! ```
//! use specdrift::ChangeRecord;
//! use specdrift_report::{render_changes, ReportOptions};
//!
//! let changes = vec![ChangeRecord::NewEndpoint { path: "/v1/users/{id}".into() }];
//! let md = render_changes(&changes, &ReportOptions::default());
//! assert!(md.contains("| new endpoint | 1 |"));
//! assert!(md.contains("- new endpoint `/v1/users/{id}`"));
//! ```

use specdrift::{
    ChangeRecord, ContextBundle, DiffSummary, DocumentHandle, Fallback, Ranking,
};

/// Options controlling what the Markdown renderers include.
pub struct ReportOptions {
    /// Heading placed above the report.
    pub title: Option<String>,
    /// Include the per-kind count table.
    pub show_summary: bool,
    /// List parameter and response deltas as nested bullets.
    pub show_details: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: None,
            show_summary: true,
            show_details: true,
        }
    }
}

/// Render a change list.
pub fn render_changes(changes: &[ChangeRecord], options: &ReportOptions) -> String {
    let mut md = String::new();
    if let Some(title) = &options.title {
        md.push_str(&format!("# {}\n\n", title));
    }

    if changes.is_empty() {
        md.push_str("No structural changes.\n");
        return md;
    }

    if options.show_summary {
        let summary = DiffSummary::from_changes(changes);
        md.push_str("| Change | Count |\n");
        md.push_str("|---|---|\n");
        for (kind, count) in &summary.counts {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push_str(&format!("| **total** | {} |\n\n", summary.total));
    }

    for change in changes {
        md.push_str(&format!("- {}\n", change_headline(change)));
        if options.show_details {
            for detail in change_details(change) {
                md.push_str(&format!("  - `{}`\n", detail));
            }
        }
    }
    md
}

/// Render a ranking as a numbered list with matched identifiers.
pub fn render_ranking(ranking: &Ranking) -> String {
    let mut md = String::new();
    if ranking.is_empty() {
        md.push_str("No relevant documents.\n");
    }
    for (i, doc) in ranking.documents.iter().enumerate() {
        md.push_str(&format!("{}. `{}`", i + 1, doc.handle));
        if doc.score > 0 {
            let matched: Vec<String> = doc.matched.iter().map(|m| format!("`{}`", m)).collect();
            md.push_str(&format!(" (score {}: {})", doc.score, matched.join(", ")));
        }
        md.push('\n');
    }
    if let Some(fallback) = ranking.fallback {
        md.push_str(&format!("\n_{}_\n", fallback_note(fallback)));
    }
    if !ranking.skipped.is_empty() {
        md.push_str(&format!(
            "\n_{} document(s) could not be read._\n",
            ranking.skipped.len()
        ));
    }
    md
}

/// Render the prompt payload: changes first, then the budgeted test files.
pub fn render_prompt(changes: &[ChangeRecord], bundle: &ContextBundle) -> String {
    let mut md = String::new();
    md.push_str("## API changes\n\n");
    md.push_str(&render_changes(
        changes,
        &ReportOptions {
            show_summary: false,
            ..Default::default()
        },
    ));

    md.push_str("\n## Related tests\n");
    if bundle.contexts.is_empty() {
        md.push_str("\nNo related tests found.\n");
    }
    for context in &bundle.contexts {
        md.push_str(&format!(
            "\n### `{}` ({})\n\n",
            context.identity, context.framework_hint
        ));
        let language = fence_language(&DocumentHandle::new(context.identity.as_str()));
        md.push_str(&format!("```{}\n", language));
        md.push_str(&context.rendered_text);
        if !context.rendered_text.ends_with('\n') {
            md.push('\n');
        }
        md.push_str("```\n");
    }
    if bundle.skipped > 0 {
        md.push_str(&format!(
            "\n_{} more test file(s) omitted to stay within the context budget._\n",
            bundle.skipped
        ));
    }
    md
}

fn change_headline(change: &ChangeRecord) -> String {
    let target = match change.method() {
        Some(method) => format!("`{} {}`", method.to_uppercase(), change.path()),
        None => format!("`{}`", change.path()),
    };
    let mut line = format!("{} {}", change.kind(), target);
    if let Some(id) = change.operation_id() {
        line.push_str(&format!(" ({})", id));
    }
    line
}

fn change_details(change: &ChangeRecord) -> Vec<String> {
    match change {
        ChangeRecord::ParameterChange { details, .. } => {
            details.iter().map(|d| d.to_string()).collect()
        }
        ChangeRecord::ResponseChange { details, .. } => {
            details.iter().map(|d| d.to_string()).collect()
        }
        _ => Vec::new(),
    }
}

fn fallback_note(fallback: Fallback) -> &'static str {
    match fallback {
        Fallback::EmptyIdentifiers => "No identifiers to match; showing the first documents.",
        Fallback::GenericMarkers => "Nothing matched; showing generically named API tests.",
        Fallback::CorpusOrder => "Nothing matched; showing the first documents.",
    }
}

/// Info string for a fenced code block, from the file extension.
pub fn fence_language(handle: &DocumentHandle) -> &'static str {
    match handle.extension() {
        Some("py") => "python",
        Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => "javascript",
        Some("ts") | Some("tsx") => "typescript",
        Some("go") => "go",
        Some("rs") => "rust",
        Some("java") => "java",
        Some("kt") => "kotlin",
        Some("rb") => "ruby",
        Some("cs") => "csharp",
        Some("php") => "php",
        Some("scala") => "scala",
        Some("swift") => "swift",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specdrift::{
        BudgetedContext, Location, ParameterDelta, ResponseDelta, ScoredDocument, SkippedDocument,
    };
    use std::collections::BTreeSet;

    fn sample_changes() -> Vec<ChangeRecord> {
        vec![
            ChangeRecord::ParameterChange {
                path: "/v1/users".into(),
                method: "get".into(),
                operation_id: Some("listUsers".into()),
                details: vec![ParameterDelta::NewParameter {
                    name: "cursor".into(),
                    location: Location::Query,
                    required: false,
                }],
            },
            ChangeRecord::ResponseChange {
                path: "/v1/users".into(),
                method: "get".into(),
                operation_id: Some("listUsers".into()),
                details: vec![ResponseDelta::RemovedCode { code: "404".into() }],
            },
            ChangeRecord::NewEndpoint {
                path: "/v1/orders".into(),
            },
        ]
    }

    fn scored(path: &str, matched: &[&str]) -> ScoredDocument {
        ScoredDocument {
            handle: DocumentHandle::new(path),
            matched: matched.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            score: matched.len(),
        }
    }

    // ── render_changes ─────────────────────────────────────────────────

    #[test]
    fn test_render_changes_summary_and_bullets() {
        let md = render_changes(&sample_changes(), &ReportOptions::default());
        assert!(md.contains("| new endpoint | 1 |"));
        assert!(md.contains("| parameter change | 1 |"));
        assert!(md.contains("| **total** | 3 |"));
        assert!(md.contains("- parameter change `GET /v1/users` (listUsers)"));
        assert!(md.contains("  - `+query cursor (optional)`"));
        assert!(md.contains("  - `-404`"));
    }

    #[test]
    fn test_render_changes_keeps_order() {
        let md = render_changes(&sample_changes(), &ReportOptions::default());
        let param = md.find("- parameter change").unwrap();
        let response = md.find("- response change").unwrap();
        let endpoint = md.find("- new endpoint").unwrap();
        assert!(param < response && response < endpoint);
    }

    #[test]
    fn test_render_changes_without_details_or_summary() {
        let options = ReportOptions {
            title: Some("Drift".into()),
            show_summary: false,
            show_details: false,
        };
        let md = render_changes(&sample_changes(), &options);
        assert!(md.starts_with("# Drift\n"));
        assert!(!md.contains("| Change |"));
        assert!(!md.contains("cursor"));
    }

    #[test]
    fn test_render_changes_empty() {
        let md = render_changes(&[], &ReportOptions::default());
        assert_eq!(md, "No structural changes.\n");
    }

    // ── render_ranking ─────────────────────────────────────────────────

    #[test]
    fn test_render_ranking_lists_matches() {
        let ranking = Ranking {
            documents: vec![
                scored("tests/test_users.py", &["/v1/users", "/v1/users/{id}"]),
                scored("tests/test_misc.py", &["/v1/users"]),
            ],
            budget: 5,
            scanned: 2,
            skipped: vec![SkippedDocument {
                handle: DocumentHandle::new("tests/broken.py"),
                reason: "denied".into(),
            }],
            fallback: None,
        };
        let md = render_ranking(&ranking);
        assert!(md.starts_with("1. `tests/test_users.py` (score 2: `/v1/users`, `/v1/users/{id}`)\n"));
        assert!(md.contains("2. `tests/test_misc.py` (score 1"));
        assert!(md.contains("1 document(s) could not be read"));
    }

    #[test]
    fn test_render_ranking_fallback_note() {
        let ranking = Ranking {
            documents: vec![scored("tests/test_api.py", &[])],
            budget: 2,
            scanned: 1,
            skipped: Vec::new(),
            fallback: Some(Fallback::GenericMarkers),
        };
        let md = render_ranking(&ranking);
        assert!(md.contains("1. `tests/test_api.py`\n"));
        assert!(md.contains("generically named"));
    }

    // ── render_prompt ──────────────────────────────────────────────────

    #[test]
    fn test_render_prompt_fences_contexts() {
        let bundle = ContextBundle {
            contexts: vec![BudgetedContext {
                identity: "tests/test_users.py".into(),
                framework_hint: "pytest".into(),
                rendered_text: "import pytest".into(),
                estimated_tokens: 4,
                truncated: false,
            }],
            skipped: 2,
            unreadable: Vec::new(),
            total_tokens: 4,
        };
        let md = render_prompt(&sample_changes(), &bundle);
        assert!(md.starts_with("## API changes\n\n- parameter change"));
        assert!(md.contains("### `tests/test_users.py` (pytest)\n\n```python\nimport pytest\n```\n"));
        assert!(md.contains("2 more test file(s) omitted"));
        assert!(!md.contains("| Change |"));
    }

    #[test]
    fn test_render_prompt_without_contexts() {
        let md = render_prompt(&[], &ContextBundle::default());
        assert!(md.contains("No structural changes."));
        assert!(md.contains("No related tests found."));
    }

    #[test]
    fn test_fence_language() {
        assert_eq!(fence_language(&DocumentHandle::new("a/b.test.ts")), "typescript");
        assert_eq!(fence_language(&DocumentHandle::new("users_test.go")), "go");
        assert_eq!(fence_language(&DocumentHandle::new("Makefile")), "");
    }
}
