//! Decoding of raw API descriptions into a [`NormalizedSpec`].
//!
//! Both JSON and YAML are accepted. JSON is tried first; YAML only when JSON
//! fails. Either way the document is converted into a single
//! `serde_json::Value` tree (object key order preserved) before it is
//! normalized, so the two encodings share one code path.

use crate::error::{Error, Result};
use crate::types::{HTTP_METHODS, Location, NormalizedSpec, Operation, Parameter, Response};
use indexmap::IndexMap;
use serde_json::Value;

/// Nested `$ref` chains longer than this are treated as unresolvable.
const MAX_REF_DEPTH: usize = 8;

/// Parse a raw spec document (JSON or YAML) into a [`NormalizedSpec`].
///
/// Fails with [`Error::UnparsableSpec`] only when neither decoder accepts the
/// text, and with [`Error::InvalidSpec`] when it decodes but isn't shaped like
/// an API description.
///
/// # Examples
///
/// ```
/// let yaml = "
/// openapi: 3.0.0
/// paths:
///   /v1/users:
///     get:
///       responses:
///         200:
///           description: ok
/// ";
/// let spec = specdrift::parse(yaml).unwrap();
/// let op = spec.operation("/v1/users", "get").unwrap();
/// assert!(op.responses.contains_key("200"));
/// ```
pub fn parse(raw: &str) -> Result<NormalizedSpec> {
    let root = decode(raw)?;
    normalize(&root)
}

fn decode(raw: &str) -> Result<Value> {
    let json_err = match serde_json::from_str::<Value>(raw) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    match serde_yaml::from_str::<serde_yaml::Value>(raw) {
        Ok(mut value) => {
            value
                .apply_merge()
                .map_err(|e| Error::InvalidSpec(format!("YAML merge keys: {}", e)))?;
            Ok(yaml_to_json(value))
        }
        Err(yaml_err) => Err(Error::UnparsableSpec {
            json: json_err.to_string(),
            yaml: yaml_err.to_string(),
        }),
    }
}

/// Convert a YAML tree into a JSON tree. Non-string mapping keys (YAML allows
/// `200:` as an integer key) are stringified here so that response codes
/// compare equal regardless of the source encoding.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .filter_map(|(k, v)| yaml_key(k).map(|k| (k, yaml_to_json(v))))
                .collect(),
        ),
        Yaml::Tagged(tagged) => {
            let tagged = *tagged;
            yaml_to_json(tagged.value)
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn normalize(root: &Value) -> Result<NormalizedSpec> {
    let doc = root
        .as_object()
        .ok_or_else(|| Error::InvalidSpec("document root is not a mapping".to_string()))?;

    let mut spec = NormalizedSpec::default();
    let paths = match doc.get("paths") {
        None | Some(Value::Null) => return Ok(spec),
        Some(Value::Object(paths)) => paths,
        Some(_) => return Err(Error::InvalidSpec("`paths` is not a mapping".to_string())),
    };

    for (path, item) in paths {
        let operations = spec.paths.entry(path.clone()).or_default();
        let Some(item) = item.as_object() else {
            continue;
        };

        let shared = item
            .get("parameters")
            .map(|p| parameters(root, p))
            .unwrap_or_default();

        for (method, op) in item {
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            operations.insert(method.clone(), operation(root, op, &shared));
        }
    }

    Ok(spec)
}

fn operation(root: &Value, op: &Value, shared: &[Parameter]) -> Operation {
    let mut operation = Operation {
        operation_id: op
            .get("operationId")
            .and_then(Value::as_str)
            .map(str::to_string),
        parameters: shared.to_vec(),
        responses: IndexMap::new(),
    };

    // Operation-level parameters override inherited ones with the same identity.
    if let Some(own) = op.get("parameters") {
        for param in parameters(root, own) {
            match operation
                .parameters
                .iter_mut()
                .find(|p| p.name == param.name && p.location == param.location)
            {
                Some(existing) => *existing = param,
                None => operation.parameters.push(param),
            }
        }
    }

    if let Some(body) = op.get("requestBody").and_then(|b| resolve(root, b))
        && operation.parameter("body", &Location::Body).is_none()
    {
        operation.parameters.push(Parameter {
            name: "body".to_string(),
            location: Location::Body,
            required: flag(body, "required"),
        });
    }

    if let Some(responses) = op.get("responses").and_then(Value::as_object) {
        for (code, response) in responses {
            let description = resolve(root, response)
                .and_then(|r| r.get("description"))
                .and_then(Value::as_str)
                .map(str::to_string);
            operation
                .responses
                .insert(code.clone(), Response { description });
        }
    }

    operation
}

fn parameters(root: &Value, list: &Value) -> Vec<Parameter> {
    let Some(items) = list.as_array() else {
        return Vec::new();
    };

    let mut out: Vec<Parameter> = Vec::new();
    for item in items {
        let Some(param) = resolve(root, item).and_then(parameter) else {
            log::debug!("skipping unresolvable or malformed parameter: {}", item);
            continue;
        };
        match out
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(existing) => *existing = param,
            None => out.push(param),
        }
    }
    out
}

fn parameter(value: &Value) -> Option<Parameter> {
    let name = value.get("name")?.as_str()?;
    let location = value.get("in")?.as_str()?;
    Some(Parameter {
        name: name.to_string(),
        location: Location::from(location),
        required: flag(value, "required"),
    })
}

/// A boolean field, with absence (or a non-boolean value) meaning `false`.
fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Follow local `$ref`s (`#/components/parameters/Limit`) until a concrete
/// node is reached.
fn resolve<'a>(root: &'a Value, value: &'a Value) -> Option<&'a Value> {
    let mut current = value;
    for _ in 0..MAX_REF_DEPTH {
        match current.get("$ref").and_then(Value::as_str) {
            Some(reference) => current = lookup(root, reference)?,
            None => return Some(current),
        }
    }
    None
}

fn lookup<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    if pointer.is_empty() {
        return Some(root);
    }
    let mut node = root;
    for token in pointer.strip_prefix('/')?.split('/') {
        let token = token.replace("~1", "/").replace("~0", "~");
        node = node.as_object()?.get(&token)?;
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Encodings ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "openapi": "3.0.0",
            "paths": {
                "/v1/users": {
                    "get": {"operationId": "listUsers", "responses": {"200": {"description": "ok"}}},
                    "post": {"responses": {"201": {"description": "created"}}}
                }
            }
        }"#;
        let spec = parse(json).unwrap();
        let ops = spec.operations("/v1/users").unwrap();
        let methods: Vec<&str> = ops.keys().map(|k| k.as_str()).collect();
        assert_eq!(methods, vec!["get", "post"]);
        assert_eq!(ops["get"].operation_id.as_deref(), Some("listUsers"));
        assert_eq!(
            ops["get"].responses["200"].description.as_deref(),
            Some("ok")
        );
    }

    #[test]
    fn test_parse_yaml_fallback() {
        let yaml = "
swagger: '2.0'
paths:
  /v1/orders/{id}:
    delete:
      parameters:
        - name: id
          in: path
          required: true
      responses:
        204:
          description: gone
";
        let spec = parse(yaml).unwrap();
        let op = spec.operation("/v1/orders/{id}", "delete").unwrap();
        assert_eq!(op.parameters.len(), 1);
        assert!(op.parameters[0].required);
        assert!(op.responses.contains_key("204"));
    }

    #[test]
    fn test_numeric_and_string_codes_normalize_identically() {
        let yaml = "paths:\n  /a:\n    get:\n      responses:\n        200: {}\n";
        let json = r#"{"paths":{"/a":{"get":{"responses":{"200":{}}}}}}"#;
        assert_eq!(parse(yaml).unwrap(), parse(json).unwrap());
    }

    #[test]
    fn test_unparsable_carries_both_errors() {
        let err = parse("{ \"paths\": [unclosed\n  - : :").unwrap_err();
        match err {
            Error::UnparsableSpec { json, yaml } => {
                assert!(!json.is_empty());
                assert!(!yaml.is_empty());
            }
            other => panic!("Expected UnparsableSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_scalar_root_is_invalid() {
        assert!(matches!(
            parse("just some words"),
            Err(Error::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_missing_paths_is_empty_spec() {
        let spec = parse(r#"{"openapi":"3.0.0","info":{"title":"x"}}"#).unwrap();
        assert!(spec.is_empty());
    }

    #[test]
    fn test_paths_not_a_mapping_is_invalid() {
        assert!(matches!(
            parse(r#"{"paths":["/a"]}"#),
            Err(Error::InvalidSpec(_))
        ));
    }

    // ── Normalization rules ────────────────────────────────────────────

    #[test]
    fn test_non_method_keys_are_ignored() {
        let json = r#"{"paths":{"/a":{"summary":"s","parameters":[],"servers":[],"get":{}}}}"#;
        let spec = parse(json).unwrap();
        let methods: Vec<&str> = spec.paths["/a"].keys().map(|k| k.as_str()).collect();
        assert_eq!(methods, vec!["get"]);
    }

    #[test]
    fn test_method_keys_are_case_sensitive() {
        let json = r#"{"paths":{"/a":{"GET":{},"get":{}}}}"#;
        let spec = parse(json).unwrap();
        assert_eq!(spec.paths["/a"].len(), 1);
    }

    #[test]
    fn test_empty_path_item_is_kept() {
        let spec = parse("paths:\n  /health:\n").unwrap();
        assert_eq!(spec.endpoint_count(), 1);
        assert_eq!(spec.operation_count(), 0);
    }

    #[test]
    fn test_required_defaults_to_false() {
        let json = r#"{"paths":{"/a":{"get":{"parameters":[{"name":"q","in":"query"}]}}}}"#;
        let spec = parse(json).unwrap();
        assert!(!spec.operation("/a", "get").unwrap().parameters[0].required);
    }

    #[test]
    fn test_path_level_parameters_are_inherited_and_overridden() {
        let json = r#"{"paths":{"/a/{id}":{
            "parameters":[
                {"name":"id","in":"path","required":true},
                {"name":"trace","in":"header"}
            ],
            "get":{"parameters":[{"name":"trace","in":"header","required":true}]}
        }}}"#;
        let spec = parse(json).unwrap();
        let op = spec.operation("/a/{id}", "get").unwrap();
        assert_eq!(op.parameters.len(), 2);
        assert!(op.parameter("id", &Location::Path).unwrap().required);
        assert!(op.parameter("trace", &Location::Header).unwrap().required);
    }

    #[test]
    fn test_parameter_refs_are_resolved() {
        let json = r##"{
            "components":{"parameters":{"Limit":{"name":"limit","in":"query","required":true}}},
            "paths":{"/a":{"get":{"parameters":[
                {"$ref":"#/components/parameters/Limit"},
                {"$ref":"#/components/parameters/Missing"}
            ]}}}
        }"##;
        let spec = parse(json).unwrap();
        let op = spec.operation("/a", "get").unwrap();
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(op.parameters[0].name, "limit");
        assert!(op.parameters[0].required);
    }

    #[test]
    fn test_ref_cycle_is_unresolvable() {
        let json = r##"{
            "components":{"parameters":{"A":{"$ref":"#/components/parameters/B"},"B":{"$ref":"#/components/parameters/A"}}},
            "paths":{"/a":{"get":{"parameters":[{"$ref":"#/components/parameters/A"}]}}}
        }"##;
        let spec = parse(json).unwrap();
        assert!(spec.operation("/a", "get").unwrap().parameters.is_empty());
    }

    #[test]
    fn test_request_body_becomes_body_parameter() {
        let json = r#"{"paths":{"/a":{"post":{"requestBody":{"required":true,"content":{}}}}}}"#;
        let spec = parse(json).unwrap();
        let op = spec.operation("/a", "post").unwrap();
        let body = op.parameter("body", &Location::Body).unwrap();
        assert!(body.required);
    }

    #[test]
    fn test_escaped_ref_tokens() {
        let json = r##"{
            "x":{"a/b":{"name":"n","in":"query"}},
            "paths":{"/a":{"get":{"parameters":[{"$ref":"#/x/a~1b"}]}}}
        }"##;
        let spec = parse(json).unwrap();
        assert_eq!(spec.operation("/a", "get").unwrap().parameters[0].name, "n");
    }

    #[test]
    fn test_yaml_merge_keys() {
        let yaml = "x-ops: &ops\n  get:\n    operationId: getA\npaths:\n  /a:\n    <<: *ops\n";
        let spec = parse(yaml).unwrap();
        assert_eq!(spec.operation_count(), 1);
        let op = spec.operation("/a", "get").unwrap();
        assert_eq!(op.operation_id.as_deref(), Some("getA"));
    }
}
