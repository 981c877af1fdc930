//! Immutable value snapshots sent to the validation endpoint

use serde_json::{Map, Value};

use crate::domain::path::FieldPath;
use crate::domain::value::FieldValue;

/// Copy of every leaf value at one instant, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    values: Vec<(FieldPath, FieldValue)>,
}

impl Snapshot {
    pub(crate) fn new(values: Vec<(FieldPath, FieldValue)>) -> Self {
        Self { values }
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldValue)> {
        self.values.iter().map(|(path, value)| (path, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Request body: nested object mirroring the tree shape.
    pub fn to_wire(&self) -> Value {
        let mut root = Map::new();
        for (path, value) in &self.values {
            insert_nested(&mut root, path, value.to_wire());
        }
        Value::Object(root)
    }
}

fn insert_nested(root: &mut Map<String, Value>, path: &FieldPath, value: Value) {
    let segments: Vec<&str> = path.segments().collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = root;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(last.to_string(), value);
}
