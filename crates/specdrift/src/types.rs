use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys under a path item that name an operation. Anything else
/// (`parameters`, `summary`, `servers`, ...) is path-level metadata.
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Operations of one path, keyed by method in document order.
pub type Operations = IndexMap<String, Operation>;

// ============================================================================
// NormalizedSpec
// ============================================================================

/// A decoded API description reduced to the shape the differ compares:
/// path → method → operation.
///
/// Keys are exact, case-sensitive strings. No trailing-slash normalization is
/// performed, so `/users` and `/users/` are different endpoints. Both maps
/// keep document order, which makes diff output deterministic.
///
/// # Builder API
///
/// ```
/// use specdrift::{NormalizedSpec, Operation, Parameter, Location};
///
/// let spec = NormalizedSpec::new()
///     .with_operation(
///         "/v1/users/{id}",
///         "get",
///         Operation::new()
///             .with_parameter(Parameter::new("expand", Location::Query).with_required(true))
///             .with_response("200"),
///     );
///
/// assert_eq!(spec.endpoint_count(), 1);
/// assert!(spec.operation("/v1/users/{id}", "get").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSpec {
    pub paths: IndexMap<String, Operations>,
}

impl NormalizedSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) one operation, creating the path entry if needed.
    pub fn with_operation(
        mut self,
        path: impl Into<String>,
        method: impl Into<String>,
        operation: Operation,
    ) -> Self {
        self.paths
            .entry(path.into())
            .or_default()
            .insert(method.into(), operation);
        self
    }

    /// Add a path with no operations.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.paths.entry(path.into()).or_default();
        self
    }

    pub fn operations(&self, path: &str) -> Option<&Operations> {
        self.paths.get(path)
    }

    pub fn operation(&self, path: &str, method: &str) -> Option<&Operation> {
        self.paths.get(path).and_then(|ops| ops.get(method))
    }

    pub fn endpoint_count(&self) -> usize {
        self.paths.len()
    }

    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|ops| ops.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// One method on one path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(
        default,
        rename = "operationId",
        skip_serializing_if = "Option::is_none"
    )]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Status code (always a string, even when the source document used an
    /// integer key) → response.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Response>,
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_response(mut self, code: impl Into<String>) -> Self {
        self.responses.insert(code.into(), Response::default());
        self
    }

    /// Look up a parameter by its identity, the `(name, location)` pair.
    pub fn parameter(&self, name: &str, location: &Location) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name == name && &p.location == location)
    }
}

/// A single operation parameter. Identity is `(name, location)`: a `limit`
/// in the query and a `limit` header are different parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: Location,
    /// Absent in the source document means `false`.
    #[serde(default)]
    pub required: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            required: false,
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Where a parameter travels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Location {
    Query,
    Path,
    Header,
    Cookie,
    Body,
    FormData,
    /// Anything the source document uses that isn't a standard location.
    Other(String),
}

impl From<&str> for Location {
    fn from(s: &str) -> Self {
        match s {
            "query" => Location::Query,
            "path" => Location::Path,
            "header" => Location::Header,
            "cookie" => Location::Cookie,
            "body" => Location::Body,
            "formData" => Location::FormData,
            other => Location::Other(other.to_string()),
        }
    }
}

impl From<String> for Location {
    fn from(s: String) -> Self {
        Location::from(s.as_str())
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.to_string()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Query => write!(f, "query"),
            Location::Path => write!(f, "path"),
            Location::Header => write!(f, "header"),
            Location::Cookie => write!(f, "cookie"),
            Location::Body => write!(f, "body"),
            Location::FormData => write!(f, "formData"),
            Location::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Response descriptor. Only the code takes part in diffing; the
/// description is kept for reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================================
// ChangeRecord
// ============================================================================

/// One typed, atomic difference between two spec versions.
///
/// Serialized with an internal `type` tag, e.g.
/// `{"type":"new_method","path":"/v1/users","method":"post"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeRecord {
    NewEndpoint {
        path: String,
    },
    RemovedEndpoint {
        path: String,
    },
    NewMethod {
        path: String,
        method: String,
        #[serde(
            default,
            rename = "operationId",
            skip_serializing_if = "Option::is_none"
        )]
        operation_id: Option<String>,
    },
    RemovedMethod {
        path: String,
        method: String,
        #[serde(
            default,
            rename = "operationId",
            skip_serializing_if = "Option::is_none"
        )]
        operation_id: Option<String>,
    },
    ParameterChange {
        path: String,
        method: String,
        #[serde(
            default,
            rename = "operationId",
            skip_serializing_if = "Option::is_none"
        )]
        operation_id: Option<String>,
        details: Vec<ParameterDelta>,
    },
    ResponseChange {
        path: String,
        method: String,
        #[serde(
            default,
            rename = "operationId",
            skip_serializing_if = "Option::is_none"
        )]
        operation_id: Option<String>,
        details: Vec<ResponseDelta>,
    },
}

/// The kind of a [`ChangeRecord`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    NewEndpoint,
    RemovedEndpoint,
    NewMethod,
    RemovedMethod,
    ParameterChange,
    ResponseChange,
}

impl ChangeRecord {
    pub fn path(&self) -> &str {
        match self {
            ChangeRecord::NewEndpoint { path }
            | ChangeRecord::RemovedEndpoint { path }
            | ChangeRecord::NewMethod { path, .. }
            | ChangeRecord::RemovedMethod { path, .. }
            | ChangeRecord::ParameterChange { path, .. }
            | ChangeRecord::ResponseChange { path, .. } => path,
        }
    }

    /// `None` for endpoint-level records.
    pub fn method(&self) -> Option<&str> {
        match self {
            ChangeRecord::NewEndpoint { .. } | ChangeRecord::RemovedEndpoint { .. } => None,
            ChangeRecord::NewMethod { method, .. }
            | ChangeRecord::RemovedMethod { method, .. }
            | ChangeRecord::ParameterChange { method, .. }
            | ChangeRecord::ResponseChange { method, .. } => Some(method),
        }
    }

    pub fn operation_id(&self) -> Option<&str> {
        match self {
            ChangeRecord::NewEndpoint { .. } | ChangeRecord::RemovedEndpoint { .. } => None,
            ChangeRecord::NewMethod { operation_id, .. }
            | ChangeRecord::RemovedMethod { operation_id, .. }
            | ChangeRecord::ParameterChange { operation_id, .. }
            | ChangeRecord::ResponseChange { operation_id, .. } => operation_id.as_deref(),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeRecord::NewEndpoint { .. } => ChangeKind::NewEndpoint,
            ChangeRecord::RemovedEndpoint { .. } => ChangeKind::RemovedEndpoint,
            ChangeRecord::NewMethod { .. } => ChangeKind::NewMethod,
            ChangeRecord::RemovedMethod { .. } => ChangeKind::RemovedMethod,
            ChangeRecord::ParameterChange { .. } => ChangeKind::ParameterChange,
            ChangeRecord::ResponseChange { .. } => ChangeKind::ResponseChange,
        }
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeRecord::NewEndpoint { path } => write!(f, "new endpoint {}", path),
            ChangeRecord::RemovedEndpoint { path } => write!(f, "removed endpoint {}", path),
            ChangeRecord::NewMethod { path, method, .. } => {
                write!(f, "new method {} {}", method.to_uppercase(), path)
            }
            ChangeRecord::RemovedMethod { path, method, .. } => {
                write!(f, "removed method {} {}", method.to_uppercase(), path)
            }
            ChangeRecord::ParameterChange {
                path,
                method,
                details,
                ..
            } => {
                let parts: Vec<String> = details.iter().map(|d| d.to_string()).collect();
                write!(
                    f,
                    "parameters changed on {} {}: {}",
                    method.to_uppercase(),
                    path,
                    parts.join(", ")
                )
            }
            ChangeRecord::ResponseChange {
                path,
                method,
                details,
                ..
            } => {
                let parts: Vec<String> = details.iter().map(|d| d.to_string()).collect();
                write!(
                    f,
                    "responses changed on {} {}: {}",
                    method.to_uppercase(),
                    path,
                    parts.join(", ")
                )
            }
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::NewEndpoint => "new endpoint",
            ChangeKind::RemovedEndpoint => "removed endpoint",
            ChangeKind::NewMethod => "new method",
            ChangeKind::RemovedMethod => "removed method",
            ChangeKind::ParameterChange => "parameter change",
            ChangeKind::ResponseChange => "response change",
        };
        write!(f, "{}", label)
    }
}

/// A parameter-level difference within a [`ChangeRecord::ParameterChange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterDelta {
    NewParameter {
        name: String,
        location: Location,
        required: bool,
    },
    RemovedParameter {
        name: String,
        location: Location,
        required: bool,
    },
    RequirementChanged {
        name: String,
        location: Location,
        from: bool,
        to: bool,
    },
}

impl fmt::Display for ParameterDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterDelta::NewParameter {
                name,
                location,
                required,
            } => {
                let req = if *required { "required" } else { "optional" };
                write!(f, "+{} {} ({})", location, name, req)
            }
            ParameterDelta::RemovedParameter { name, location, .. } => {
                write!(f, "-{} {}", location, name)
            }
            ParameterDelta::RequirementChanged {
                name,
                location,
                from,
                to,
            } => write!(f, "{} {} required {} -> {}", location, name, from, to),
        }
    }
}

/// A response-level difference within a [`ChangeRecord::ResponseChange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseDelta {
    NewCode { code: String },
    RemovedCode { code: String },
}

impl fmt::Display for ResponseDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseDelta::NewCode { code } => write!(f, "+{}", code),
            ResponseDelta::RemovedCode { code } => write!(f, "-{}", code),
        }
    }
}
