//! Canonical identifiers derived from change records.
//!
//! Extraction is permissive. It emits every variant of a path
//! that might appear in a test file, and leaves precision to the ranker's
//! match counting.

use crate::types::ChangeRecord;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Identifiers that match nearly every API test and carry no signal.
const GENERIC_IDENTIFIERS: [&str; 3] = ["/api", "/v1", "/v2"];

/// Quoted, path-like strings inside a serialized record.
static QUOTED_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(/[A-Za-z0-9_.~{}-]+(?:/[A-Za-z0-9_.~{}-]*)*)""#).unwrap());

static OPERATION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""operationId"\s*:\s*"([^"]+)""#).unwrap());

/// Derive the deduplicated identifier set for a change list.
///
/// # Examples
///
/// ```
/// use specdrift::{extract, ChangeRecord};
///
/// let ids = extract(&[ChangeRecord::NewEndpoint { path: "/v1/users/{id}/posts".into() }]);
/// assert!(ids.contains("/v1/users/{id}/posts"));
/// assert!(ids.contains("/v1/users"));
/// assert!(!ids.contains("/v1"));
/// ```
pub fn extract(changes: &[ChangeRecord]) -> BTreeSet<String> {
    let mut candidates = Vec::new();
    for change in changes {
        candidates.extend(path_variants(change.path()));
        scan_payload(change, &mut candidates);
    }
    candidates.into_iter().filter(|c| is_useful(c)).collect()
}

/// Exact path, path with trailing `{param}` segments stripped, and every
/// parameter-free prefix of two or more segments, longest first.
///
/// No exclusion filtering is applied here.
pub fn path_variants(path: &str) -> Vec<String> {
    let mut variants = vec![path.to_string()];

    let stripped = strip_trailing_params(path);
    if stripped != path && stripped.len() > 1 {
        variants.push(stripped.to_string());
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for len in (2..=segments.len()).rev() {
        let prefix = &segments[..len];
        if prefix.iter().any(|s| is_placeholder(s)) {
            continue;
        }
        let candidate = format!("/{}", prefix.join("/"));
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }

    variants
}

/// Split an `operationId` on case boundaries, `_` and `-` into lowercase
/// words, keeping only words longer than two characters.
///
/// ```
/// use specdrift::extract::split_operation_id;
///
/// assert_eq!(split_operation_id("getUserById"), vec!["get", "user"]);
/// assert_eq!(split_operation_id("create_API-Key"), vec!["create", "api", "key"]);
/// ```
pub fn split_operation_id(id: &str) -> Vec<String> {
    let chars: Vec<char> = id.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .into_iter()
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() > 2)
        .collect()
}

/// `{id}`-style template segment.
pub fn is_placeholder(segment: &str) -> bool {
    segment.len() >= 2 && segment.starts_with('{') && segment.ends_with('}')
}

/// The exclusion filter: too short, a bare version/api marker, or a
/// single-letter path.
pub fn is_useful(identifier: &str) -> bool {
    if identifier.chars().count() <= 3 {
        return false;
    }
    if GENERIC_IDENTIFIERS.contains(&identifier) {
        return false;
    }
    !is_single_letter_path(identifier)
}

fn is_single_letter_path(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some('/'), Some(c), None) if c.is_ascii_lowercase()
    )
}

fn strip_trailing_params(path: &str) -> &str {
    let mut rest = path;
    while let Some((head, last)) = rest.rsplit_once('/') {
        if !is_placeholder(last) {
            break;
        }
        rest = head;
    }
    rest
}

fn scan_payload(change: &ChangeRecord, out: &mut Vec<String>) {
    let payload = match serde_json::to_string(change) {
        Ok(payload) => payload,
        Err(e) => {
            log::debug!("could not serialize change for scanning: {}", e);
            return;
        }
    };

    for cap in QUOTED_PATH.captures_iter(&payload) {
        let candidate = &cap[1];
        if candidate.len() > 3 {
            out.push(candidate.to_string());
        }
    }

    if let Some(cap) = OPERATION_ID.captures(&payload) {
        let words = split_operation_id(&cap[1]);
        if !words.is_empty() {
            out.push(words.join("/"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, ParameterDelta};

    fn endpoint(path: &str) -> ChangeRecord {
        ChangeRecord::NewEndpoint { path: path.into() }
    }

    // ── path_variants ──────────────────────────────────────────────────

    #[test]
    fn test_variants_with_trailing_param() {
        assert_eq!(
            path_variants("/v1/users/{id}"),
            vec!["/v1/users/{id}", "/v1/users"]
        );
    }

    #[test]
    fn test_variants_with_inner_param() {
        assert_eq!(
            path_variants("/v1/users/{id}/posts"),
            vec!["/v1/users/{id}/posts", "/v1/users"]
        );
    }

    #[test]
    fn test_variants_prefixes_longest_first() {
        assert_eq!(
            path_variants("/api/v2/orders/items"),
            vec![
                "/api/v2/orders/items",
                "/api/v2/orders",
                "/api/v2",
            ]
        );
    }

    #[test]
    fn test_variants_multiple_trailing_params() {
        let v = path_variants("/orgs/{org}/{repo}");
        assert_eq!(v[1], "/orgs");
    }

    #[test]
    fn test_variants_root_param_not_stripped_to_empty() {
        assert_eq!(path_variants("/{id}"), vec!["/{id}"]);
    }

    // ── Exclusion filter ───────────────────────────────────────────────

    #[test]
    fn test_exclusion_filter() {
        assert!(!is_useful("/v1"));
        assert!(!is_useful("/v2"));
        assert!(!is_useful("/api"));
        assert!(!is_useful("/ab"));
        assert!(!is_useful("/x"));
        assert!(is_useful("/abcd"));
        assert!(is_useful("/v1/users"));
    }

    #[test]
    fn test_extract_never_admits_excluded_identifiers() {
        let changes = vec![
            endpoint("/api"),
            endpoint("/v1"),
            endpoint("/v2/x"),
            endpoint("/a"),
            endpoint("/api/v1"),
            endpoint("/v2/{id}"),
        ];
        for id in extract(&changes) {
            assert!(id.chars().count() > 3, "too short: {}", id);
            assert!(!GENERIC_IDENTIFIERS.contains(&id.as_str()), "generic: {}", id);
        }
    }

    // ── Payload scanning ───────────────────────────────────────────────

    #[test]
    fn test_operation_id_synthesizes_identifier() {
        let change = ChangeRecord::NewMethod {
            path: "/v1/users".into(),
            method: "post".into(),
            operation_id: Some("createUserAccount".into()),
        };
        let ids = extract(&[change]);
        assert!(ids.contains("create/user/account"));
        assert!(ids.contains("/v1/users"));
    }

    #[test]
    fn test_operation_id_with_only_short_words_is_dropped() {
        let change = ChangeRecord::NewMethod {
            path: "/v1/users".into(),
            method: "get".into(),
            operation_id: Some("GetById".into()),
        };
        let ids = extract(&[change]);
        // "get" survives on its own but is too short for the final filter.
        assert!(!ids.contains("get"));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_details_are_scanned() {
        let change = ChangeRecord::ParameterChange {
            path: "/v1/users".into(),
            method: "get".into(),
            operation_id: None,
            details: vec![ParameterDelta::NewParameter {
                name: "/legacy/lookup".into(),
                location: Location::Query,
                required: false,
            }],
        };
        let ids = extract(&[change]);
        assert!(ids.contains("/legacy/lookup"));
    }

    #[test]
    fn test_split_operation_id_acronyms_and_digits() {
        assert_eq!(split_operation_id("listHTTPRoutes"), vec!["list", "http", "routes"]);
        assert_eq!(split_operation_id("v2GetOrders"), vec!["get", "orders"]);
        assert!(split_operation_id("").is_empty());
    }

    #[test]
    fn test_extract_empty_changes() {
        assert!(extract(&[]).is_empty());
    }
}
