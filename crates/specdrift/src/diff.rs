//! Structural diff between two [`NormalizedSpec`]s.

use crate::error::Error;
use crate::parse::parse;
use crate::types::{ChangeKind, ChangeRecord, NormalizedSpec, Operation, ParameterDelta, ResponseDelta};
use serde::Serialize;
use std::collections::BTreeMap;

/// Compute every change between `old` and `new`.
///
/// Two passes: the forward pass walks `new` (new endpoints, new methods, and
/// parameter/response changes on methods present in both), the backward pass
/// walks `old` (removed endpoints and methods). Forward records always
/// precede backward records and each pass follows its spec's key order.
///
/// # Examples
///
/// ```
/// use specdrift::{diff, ChangeRecord, NormalizedSpec, Operation};
///
/// let old = NormalizedSpec::new().with_operation("/v1/users", "get", Operation::new());
/// let new = old.clone().with_operation("/v1/users", "post", Operation::new());
///
/// assert_eq!(
///     diff(&old, &new),
///     vec![ChangeRecord::NewMethod {
///         path: "/v1/users".into(),
///         method: "post".into(),
///         operation_id: None,
///     }]
/// );
/// ```
pub fn diff(old: &NormalizedSpec, new: &NormalizedSpec) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();

    for (path, new_ops) in &new.paths {
        let Some(old_ops) = old.paths.get(path) else {
            changes.push(ChangeRecord::NewEndpoint { path: path.clone() });
            continue;
        };

        for (method, new_op) in new_ops {
            let Some(old_op) = old_ops.get(method) else {
                changes.push(ChangeRecord::NewMethod {
                    path: path.clone(),
                    method: method.clone(),
                    operation_id: new_op.operation_id.clone(),
                });
                continue;
            };

            let operation_id = new_op
                .operation_id
                .clone()
                .or_else(|| old_op.operation_id.clone());

            let params = parameter_deltas(old_op, new_op);
            if !params.is_empty() {
                changes.push(ChangeRecord::ParameterChange {
                    path: path.clone(),
                    method: method.clone(),
                    operation_id: operation_id.clone(),
                    details: params,
                });
            }

            let responses = response_deltas(old_op, new_op);
            if !responses.is_empty() {
                changes.push(ChangeRecord::ResponseChange {
                    path: path.clone(),
                    method: method.clone(),
                    operation_id,
                    details: responses,
                });
            }
        }
    }

    for (path, old_ops) in &old.paths {
        let Some(new_ops) = new.paths.get(path) else {
            changes.push(ChangeRecord::RemovedEndpoint { path: path.clone() });
            continue;
        };

        for (method, old_op) in old_ops {
            if !new_ops.contains_key(method) {
                changes.push(ChangeRecord::RemovedMethod {
                    path: path.clone(),
                    method: method.clone(),
                    operation_id: old_op.operation_id.clone(),
                });
            }
        }
    }

    changes
}

fn parameter_deltas(old: &Operation, new: &Operation) -> Vec<ParameterDelta> {
    let mut deltas = Vec::new();

    for param in &new.parameters {
        match old.parameter(&param.name, &param.location) {
            None => deltas.push(ParameterDelta::NewParameter {
                name: param.name.clone(),
                location: param.location.clone(),
                required: param.required,
            }),
            Some(prev) if prev.required != param.required => {
                deltas.push(ParameterDelta::RequirementChanged {
                    name: param.name.clone(),
                    location: param.location.clone(),
                    from: prev.required,
                    to: param.required,
                })
            }
            Some(_) => {}
        }
    }

    for param in &old.parameters {
        if new.parameter(&param.name, &param.location).is_none() {
            deltas.push(ParameterDelta::RemovedParameter {
                name: param.name.clone(),
                location: param.location.clone(),
                required: param.required,
            });
        }
    }

    deltas
}

fn response_deltas(old: &Operation, new: &Operation) -> Vec<ResponseDelta> {
    let added = new
        .responses
        .keys()
        .filter(|code| !old.responses.contains_key(*code))
        .map(|code| ResponseDelta::NewCode { code: code.clone() });
    let removed = old
        .responses
        .keys()
        .filter(|code| !new.responses.contains_key(*code))
        .map(|code| ResponseDelta::RemovedCode { code: code.clone() });
    added.chain(removed).collect()
}

// ============================================================================
// Raw-text entry point
// ============================================================================

/// Result of [`diff_text`]: the change list plus the parse failure, if any.
///
/// A failed parse never propagates; it yields an empty change list and hands
/// the error back as a value so the caller can decide how to log it.
#[derive(Debug)]
pub struct DiffOutcome {
    pub changes: Vec<ChangeRecord>,
    pub error: Option<Error>,
}

impl DiffOutcome {
    pub fn is_clean(&self) -> bool {
        self.error.is_none()
    }
}

/// Parse two raw documents and diff them, degrading to "no changes" when
/// either side fails to parse.
pub fn diff_text(old_raw: &str, new_raw: &str) -> DiffOutcome {
    let specs = parse(old_raw).and_then(|old| parse(new_raw).map(|new| (old, new)));
    match specs {
        Ok((old, new)) => DiffOutcome {
            changes: diff(&old, &new),
            error: None,
        },
        Err(e) => {
            log::debug!("spec pair did not parse, reporting no changes: {}", e);
            DiffOutcome {
                changes: Vec::new(),
                error: Some(e),
            }
        }
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Per-kind counts for a change list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub counts: BTreeMap<ChangeKind, usize>,
    pub total: usize,
}

impl DiffSummary {
    pub fn from_changes(changes: &[ChangeRecord]) -> Self {
        let mut summary = DiffSummary::default();
        for change in changes {
            *summary.counts.entry(change.kind()).or_insert(0) += 1;
            summary.total += 1;
        }
        summary
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
