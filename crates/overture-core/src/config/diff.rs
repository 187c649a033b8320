//! Structural diff between an existing and a newly computed client document.
//!
//! All output lists are sorted so dry-run output is reproducible.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

/// Field-level change inside a modified server entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifiedEntry {
    pub name: String,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<ModifiedEntry>,
    pub unchanged: Vec<String>,
    pub has_changes: bool,
}

impl ConfigDiff {
    /// One-line summary, e.g. `2 added, 1 modified, 0 removed`.
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} modified, {} removed",
            self.added.len(),
            self.modified.len(),
            self.removed.len()
        )
    }
}

/// Diff two server maps keyed by server name.
///
/// Equality is deep and independent of object key order; arrays compare
/// element by element.
pub fn generate_diff(old: &Map<String, Value>, new: &Map<String, Value>) -> ConfigDiff {
    let mut diff = ConfigDiff::default();

    for (name, new_value) in new {
        match old.get(name) {
            None => diff.added.push(name.clone()),
            Some(old_value) if old_value == new_value => diff.unchanged.push(name.clone()),
            Some(old_value) => diff.modified.push(ModifiedEntry {
                name: name.clone(),
                changes: field_changes(old_value, new_value),
            }),
        }
    }

    diff.removed = old
        .keys()
        .filter(|name| !new.contains_key(*name))
        .cloned()
        .collect();

    diff.added.sort();
    diff.removed.sort();
    diff.unchanged.sort();
    diff.modified.sort_by(|a, b| a.name.cmp(&b.name));
    diff.has_changes =
        !diff.added.is_empty() || !diff.modified.is_empty() || !diff.removed.is_empty();
    diff
}

/// Diff the server maps stored under `root_key` in two whole documents.
pub fn generate_document_diff(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    root_key: &str,
) -> ConfigDiff {
    let empty = Map::new();
    let old_servers = old.get(root_key).and_then(Value::as_object).unwrap_or(&empty);
    let new_servers = new.get(root_key).and_then(Value::as_object).unwrap_or(&empty);
    generate_diff(old_servers, new_servers)
}

fn field_changes(old: &Value, new: &Value) -> Vec<FieldChange> {
    let (Value::Object(old_fields), Value::Object(new_fields)) = (old, new) else {
        return vec![FieldChange {
            field: "(entry)".to_string(),
            old: Some(old.clone()),
            new: Some(new.clone()),
        }];
    };

    let fields: BTreeSet<&String> = old_fields.keys().chain(new_fields.keys()).collect();
    fields
        .into_iter()
        .filter_map(|field| {
            let before = old_fields.get(field);
            let after = new_fields.get(field);
            if before == after {
                return None;
            }
            Some(FieldChange {
                field: field.clone(),
                old: before.cloned(),
                new: after.cloned(),
            })
        })
        .collect()
}
