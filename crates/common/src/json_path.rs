//! Path-addressed mutation of JSON documents
//!
//! Fixture request bodies are tweaked per scenario by applying a batch of
//! add/update/delete operations addressed by paths such as
//! `data[0].party_id`. The caller's document is never touched: every call
//! works on a deep copy and returns it.
//!
//! ```text
//! "data[0].party_id"  ->  [Key("data"), Index(0), Key("party_id")]
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{Error, Result};

static SEGMENT_TOKEN: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"([^\[\]]+)|\[(\d+)\]").expect("segment pattern compiles"));

/// One step of a document path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    /// Mapping key
    Key(String),
    /// Sequence index
    Index(usize),
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathToken::Key(key) => write!(f, "{}", key),
            PathToken::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Split a path into tokens, in the order they appear.
///
/// Segments are separated by `.`; inside a segment, `[<digits>]` is an index
/// and any other run of non-bracket characters is a key.
pub fn tokenize(path: &str) -> Result<Vec<PathToken>> {
    let mut tokens = Vec::new();

    for segment in path.split('.') {
        for caps in SEGMENT_TOKEN.captures_iter(segment) {
            if let Some(key) = caps.get(1) {
                tokens.push(PathToken::Key(key.as_str().to_string()));
            } else if let Some(digits) = caps.get(2) {
                let index = digits
                    .as_str()
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidPath(path.to_string()))?;
                tokens.push(PathToken::Index(index));
            }
        }
    }

    if tokens.is_empty() {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(tokens)
}

/// Kind of mutation applied at a path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonOperationKind {
    #[default]
    Add,
    Update,
    Delete,
}

impl JsonOperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonOperationKind::Add => "add",
            JsonOperationKind::Update => "update",
            JsonOperationKind::Delete => "delete",
        }
    }
}

impl FromStr for JsonOperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(JsonOperationKind::Add),
            "update" => Ok(JsonOperationKind::Update),
            "delete" => Ok(JsonOperationKind::Delete),
            other => Err(Error::UnsupportedOperationKind(other.to_string())),
        }
    }
}

impl fmt::Display for JsonOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonOperation {
    pub path: String,

    #[serde(default)]
    pub operation: JsonOperationKind,

    /// Value written by add/update; ignored by delete
    #[serde(default)]
    pub value: Value,
}

impl JsonOperation {
    pub fn add(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            operation: JsonOperationKind::Add,
            value: value.into(),
        }
    }

    pub fn update(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            operation: JsonOperationKind::Update,
            value: value.into(),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operation: JsonOperationKind::Delete,
            value: Value::Null,
        }
    }

    /// Parse one operation from a free-form JSON object.
    pub fn from_value(input: &Value) -> Result<Self> {
        let obj = input
            .as_object()
            .ok_or_else(|| Error::InvalidOperation(format!("expected an object, got {}", input)))?;

        let path = obj
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidOperation("missing string field 'path'".to_string()))?;

        let operation = match obj.get("operation") {
            None | Some(Value::Null) => JsonOperationKind::default(),
            Some(Value::String(kind)) => kind.parse()?,
            Some(other) => return Err(Error::UnsupportedOperationKind(other.to_string())),
        };

        Ok(Self {
            path: path.to_string(),
            operation,
            value: obj.get("value").cloned().unwrap_or(Value::Null),
        })
    }
}

/// Parse a single operation object or an array of them.
///
/// The whole batch is validated before anything is applied, so an unknown
/// kind anywhere fails the batch.
pub fn parse_operations(input: &Value) -> Result<Vec<JsonOperation>> {
    match input {
        Value::Array(items) => items.iter().map(JsonOperation::from_value).collect(),
        single => Ok(vec![JsonOperation::from_value(single)?]),
    }
}

/// Policy for writes to a sequence index past its current end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceGrowth {
    /// Pad the gap with nulls
    #[default]
    PadWithNull,
    /// Fail with `IndexOutOfRange`; appending at exactly `len` is still allowed
    Reject,
}

/// Most null slots a single `PadWithNull` write may add
pub const DEFAULT_MAX_PADDING: usize = 10_000;

/// Applies operation batches to copies of a document
#[derive(Debug, Clone, Copy)]
pub struct PathMutator {
    strict: bool,
    growth: SequenceGrowth,
    max_padding: usize,
}

impl Default for PathMutator {
    fn default() -> Self {
        Self {
            strict: false,
            growth: SequenceGrowth::default(),
            max_padding: DEFAULT_MAX_PADDING,
        }
    }
}

impl PathMutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// In strict mode a delete whose path does not exist does nothing
    /// instead of creating the missing containers.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn growth(mut self, growth: SequenceGrowth) -> Self {
        self.growth = growth;
        self
    }

    /// Cap on the null slots one padded write may add. Larger gaps fail
    /// with `IndexOutOfRange`.
    pub fn max_padding(mut self, max_padding: usize) -> Self {
        self.max_padding = max_padding;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Apply `operations` in order to a copy of `document`.
    pub fn apply(&self, document: &Value, operations: &[JsonOperation]) -> Result<Value> {
        let mut target = document.clone();
        for op in operations {
            self.apply_in_place(&mut target, op)?;
        }
        Ok(target)
    }

    /// Parse free-form operations, then apply them.
    pub fn apply_raw(&self, document: &Value, operations: &Value) -> Result<Value> {
        let ops = parse_operations(operations)?;
        self.apply(document, &ops)
    }

    fn apply_in_place(&self, root: &mut Value, op: &JsonOperation) -> Result<()> {
        let tokens = tokenize(&op.path)?;
        let skip_missing = self.strict && op.operation == JsonOperationKind::Delete;

        let mut current = root;
        for pair in tokens.windows(2) {
            match self.descend(current, &pair[0], &pair[1], skip_missing)? {
                Some(child) => current = child,
                None => {
                    debug!(path = %op.path, "Path absent, strict delete skipped");
                    return Ok(());
                }
            }
        }

        let last = &tokens[tokens.len() - 1];
        match op.operation {
            JsonOperationKind::Add | JsonOperationKind::Update => {
                self.assign(current, last, op.value.clone())
            }
            JsonOperationKind::Delete => {
                remove(current, last);
                Ok(())
            }
        }
    }

    fn descend<'a>(
        &self,
        current: &'a mut Value,
        token: &PathToken,
        next: &PathToken,
        skip_missing: bool,
    ) -> Result<Option<&'a mut Value>> {
        match token {
            PathToken::Key(key) => {
                if skip_missing {
                    return Ok(current
                        .as_object_mut()
                        .and_then(|map| map.get_mut(key))
                        .filter(|child| !child.is_null()));
                }
                let child = ensure_object(current)
                    .entry(key.clone())
                    .or_insert_with(|| empty_container(next));
                if child.is_null() {
                    *child = empty_container(next);
                }
                Ok(Some(child))
            }
            PathToken::Index(index) => {
                if skip_missing {
                    return Ok(current
                        .as_array_mut()
                        .and_then(|items| items.get_mut(*index))
                        .filter(|child| !child.is_null()));
                }
                let items = ensure_array(current);
                self.reserve_slot(items, *index)?;
                let child = &mut items[*index];
                if child.is_null() {
                    *child = empty_container(next);
                }
                Ok(Some(child))
            }
        }
    }

    fn assign(&self, current: &mut Value, token: &PathToken, value: Value) -> Result<()> {
        match token {
            PathToken::Key(key) => {
                ensure_object(current).insert(key.clone(), value);
            }
            PathToken::Index(index) => {
                let items = ensure_array(current);
                self.reserve_slot(items, *index)?;
                items[*index] = value;
            }
        }
        Ok(())
    }

    fn reserve_slot(&self, items: &mut Vec<Value>, index: usize) -> Result<()> {
        let len = items.len();
        if index < len {
            return Ok(());
        }
        let out_of_range = Error::IndexOutOfRange { index, len };
        let gap = index - len;
        if gap > 0 && (self.growth == SequenceGrowth::Reject || gap > self.max_padding) {
            return Err(out_of_range);
        }
        let new_len = index.checked_add(1).ok_or(out_of_range)?;
        items.resize(new_len, Value::Null);
        Ok(())
    }
}

fn remove(current: &mut Value, token: &PathToken) {
    match (current, token) {
        (Value::Object(map), PathToken::Key(key)) => {
            map.remove(key);
        }
        (Value::Array(items), PathToken::Index(index)) if *index < items.len() => {
            items.remove(*index);
        }
        _ => {}
    }
}

fn empty_container(next: &PathToken) -> Value {
    match next {
        PathToken::Index(_) => Value::Array(Vec::new()),
        PathToken::Key(_) => Value::Object(Map::new()),
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    value.as_object_mut().expect("value coerced to object")
}

fn ensure_array(value: &mut Value) -> &mut Vec<Value> {
    if !value.is_array() {
        *value = Value::Array(Vec::new());
    }
    value.as_array_mut().expect("value coerced to array")
}

/// Apply operations with the default growth policy.
pub fn modify_json(document: &Value, operations: &[JsonOperation], strict: bool) -> Result<Value> {
    PathMutator::new().strict(strict).apply(document, operations)
}

/// Like [`modify_json`], for a document still in its serialized form.
pub fn modify_json_str(document: &str, operations: &[JsonOperation], strict: bool) -> Result<Value> {
    let parsed: Value = deserialize_json(document)?;
    modify_json(&parsed, operations, strict)
}

/// Pretty JSON with two-space indentation
pub fn serialize_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Error::from)
}

pub fn deserialize_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(Error::from)
}

/// Request body loaded from a fixture file.
///
/// Each update or removal replaces the held body with a freshly mutated
/// copy, so a body handed out earlier never changes underneath its holder.
#[derive(Debug, Clone, Default)]
pub struct FixtureBody {
    body: Option<Value>,
    mutator: PathMutator,
}

impl FixtureBody {
    /// A body that was deliberately left unset
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_value(body: Value) -> Self {
        Self {
            body: Some(body),
            mutator: PathMutator::new(),
        }
    }

    /// Load a JSON fixture from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path)?;
        debug!(fixture = %path.display(), "Loaded fixture body");
        Ok(Self::from_value(deserialize_json(&raw)?))
    }

    pub fn with_mutator(mut self, mutator: PathMutator) -> Self {
        self.mutator = mutator;
        self
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn update(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        self.mutate(&[JsonOperation::update(path, value)])
    }

    pub fn remove(&mut self, path: &str) -> Result<()> {
        self.mutate(&[JsonOperation::delete(path)])
    }

    pub fn mutate(&mut self, operations: &[JsonOperation]) -> Result<()> {
        let current = self
            .body
            .as_ref()
            .ok_or_else(|| Error::InvalidOperation("request body not initialized".to_string()))?;
        self.body = Some(self.mutator.apply(current, operations)?);
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serialize_json(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn test_tokenize_mixed_path() {
        let tokens = tokenize("data[0].party_id").unwrap();
        assert_eq!(
            tokens,
            vec![
                PathToken::Key("data".into()),
                PathToken::Index(0),
                PathToken::Key("party_id".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_nested_indices() {
        let tokens = tokenize("grid[1][2]").unwrap();
        assert_eq!(
            tokens,
            vec![
                PathToken::Key("grid".into()),
                PathToken::Index(1),
                PathToken::Index(2),
            ]
        );
    }

    #[test_case(""; "empty")]
    #[test_case("..."; "only dots")]
    fn test_tokenize_rejects_empty(path: &str) {
        assert!(matches!(tokenize(path), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_update_does_not_alias_input() {
        let original = json!({"a": {"b": 1}});
        let updated = modify_json(&original, &[JsonOperation::update("a.b", 2)], false).unwrap();

        assert_eq!(updated["a"]["b"], json!(2));
        assert_eq!(original["a"]["b"], json!(1));
    }

    #[test]
    fn test_delete_sequence_element_shifts() {
        let doc = json!({"items": [10, 20, 30]});
        let out = modify_json(&doc, &[JsonOperation::delete("items[1]")], false).unwrap();
        assert_eq!(out, json!({"items": [10, 30]}));
    }

    #[test]
    fn test_strict_delete_missing_path_is_noop() {
        let doc = json!({});
        let out = modify_json(&doc, &[JsonOperation::delete("missing.key")], true).unwrap();
        assert_eq!(out, json!({}));
    }

    #[test]
    fn test_lenient_delete_creates_intermediates() {
        let doc = json!({});
        let out = modify_json(&doc, &[JsonOperation::delete("missing.key")], false).unwrap();
        assert_eq!(out, json!({"missing": {}}));
    }

    #[test]
    fn test_strict_delete_existing_path() {
        let doc = json!({"data": [{"id": 1, "name": "x"}]});
        let out = modify_json(&doc, &[JsonOperation::delete("data[0].name")], true).unwrap();
        assert_eq!(out, json!({"data": [{"id": 1}]}));
    }

    #[test]
    fn test_add_creates_sequence_for_numeric_next_token() {
        let doc = json!({});
        let out = modify_json(&doc, &[JsonOperation::add("data[0].party_id", "123456")], false).unwrap();
        assert_eq!(out, json!({"data": [{"party_id": "123456"}]}));
    }

    #[test]
    fn test_operations_apply_in_order() {
        let doc = json!({"data": [{"type_of_code": "A"}]});
        let ops = vec![
            JsonOperation::update("data[0].type_of_code", "B"),
            JsonOperation::update("data[0].copy", "pending"),
            JsonOperation::delete("data[0].type_of_code"),
        ];
        let out = modify_json(&doc, &ops, false).unwrap();
        assert_eq!(out, json!({"data": [{"copy": "pending"}]}));
    }

    #[test]
    fn test_delete_absent_key_is_noop() {
        let doc = json!({"a": 1});
        let out = modify_json(&doc, &[JsonOperation::delete("b")], false).unwrap();
        assert_eq!(out, doc);
    }

    #[test]
    fn test_write_at_len_appends_under_both_policies() {
        let doc = json!({"items": [1, 2]});
        for growth in [SequenceGrowth::PadWithNull, SequenceGrowth::Reject] {
            let out = PathMutator::new()
                .growth(growth)
                .apply(&doc, &[JsonOperation::add("items[2]", 3)])
                .unwrap();
            assert_eq!(out, json!({"items": [1, 2, 3]}));
        }
    }

    #[test]
    fn test_write_past_len_pads_with_null() {
        let doc = json!({"items": [1, 2]});
        let out = PathMutator::new()
            .apply(&doc, &[JsonOperation::add("items[3]", 4)])
            .unwrap();
        assert_eq!(out, json!({"items": [1, 2, null, 4]}));
    }

    #[test]
    fn test_write_past_len_rejected() {
        let doc = json!({"items": [1, 2]});
        let err = PathMutator::new()
            .growth(SequenceGrowth::Reject)
            .apply(&doc, &[JsonOperation::add("items[3]", 4)])
            .unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 3, len: 2 }));
    }

    #[test]
    fn test_max_index_is_out_of_range() {
        let doc = json!({"items": [1]});
        for mutator in [PathMutator::new(), PathMutator::new().max_padding(usize::MAX)] {
            let err = mutator
                .apply(&doc, &[JsonOperation::add("items[18446744073709551615]", 1)])
                .unwrap_err();
            assert!(matches!(err, Error::IndexOutOfRange { index: usize::MAX, len: 1 }));
        }
    }

    #[test]
    fn test_huge_intermediate_index_is_out_of_range() {
        let err = PathMutator::new()
            .apply(&json!({}), &[JsonOperation::add("rows[4000000000].id", 1)])
            .unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 4_000_000_000, len: 0 }));
    }

    #[test]
    fn test_padding_cap() {
        let doc = json!({"items": []});
        let mutator = PathMutator::new().max_padding(2);

        let out = mutator.apply(&doc, &[JsonOperation::add("items[2]", "x")]).unwrap();
        assert_eq!(out, json!({"items": [null, null, "x"]}));

        let err = mutator
            .apply(&doc, &[JsonOperation::add("items[3]", "x")])
            .unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 3, len: 0 }));
    }

    #[test]
    fn test_unsupported_kind_fails_whole_batch() {
        let doc = json!({"a": 1});
        let raw = json!([
            {"path": "a", "operation": "update", "value": 2},
            {"path": "b", "operation": "upsert", "value": 3}
        ]);
        let err = PathMutator::new().apply_raw(&doc, &raw).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperationKind(kind) if kind == "upsert"));
    }

    #[test]
    fn test_parse_single_operation_defaults_to_add() {
        let ops = parse_operations(&json!({"path": "x.y"})).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].operation, JsonOperationKind::Add);
        assert_eq!(ops[0].value, Value::Null);
    }

    #[test]
    fn test_modify_json_str() {
        let out = modify_json_str(r#"{"a":[1]}"#, &[JsonOperation::update("a[0]", 5)], false).unwrap();
        assert_eq!(out, json!({"a": [5]}));
    }

    #[test]
    fn test_fixture_body_update_and_remove() {
        let mut body = FixtureBody::from_value(json!({"data": [{"party_id": "0", "email": "a@b.c"}]}));
        let before = body.body().cloned().unwrap();

        body.update("data[0].party_id", "654321").unwrap();
        body.remove("data[0].email").unwrap();

        assert_eq!(body.body().unwrap(), &json!({"data": [{"party_id": "654321"}]}));
        assert_eq!(before["data"][0]["party_id"], json!("0"));
    }

    #[test]
    fn test_fixture_body_uninitialized() {
        let mut body = FixtureBody::empty();
        assert!(matches!(
            body.update("a", 1),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_fixture_body_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("BodyEmail.json");
        std::fs::write(&path, r#"{"data":[{"type_of_code":"login"}]}"#).unwrap();

        let body = FixtureBody::load(&path).unwrap();
        assert_eq!(body.body().unwrap()["data"][0]["type_of_code"], json!("login"));

        let missing = FixtureBody::load(&tmp.path().join("nope.json"));
        assert!(matches!(missing, Err(Error::FileNotFound { .. })));
    }
}
