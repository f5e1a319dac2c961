//! JSON back end: parse the whole document, mutate, re-serialize.
//!
//! Formatting is normalized as a side effect; key order survives because the
//! document map preserves insertion order.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value, json};

use super::{EditError, EditOp, EditOptions, SchemaEditor};

/// Keys under which named type declarations can be nested.
const NESTING_KEYS: &[&str] = &["fields", "type", "items", "values"];

#[derive(Debug, Clone)]
pub struct JsonEditor {
    indent: String,
}

impl JsonEditor {
    pub fn new(options: &EditOptions) -> Self {
        Self {
            indent: " ".repeat(options.json_indent),
        }
    }

    fn render(&self, doc: &Value) -> Result<String, EditError> {
        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(self.indent.as_bytes()));
        doc.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Default for JsonEditor {
    fn default() -> Self {
        Self::new(&EditOptions::default())
    }
}

impl SchemaEditor for JsonEditor {
    fn apply(&self, text: &str, op: &EditOp) -> Result<String, EditError> {
        let mut doc: Value = serde_json::from_str(text)?;
        let schema = op.schema();
        let target =
            find_schema_mut(&mut doc, schema).ok_or_else(|| EditError::SchemaNotFound(schema.to_string()))?;

        match op {
            EditOp::AddField { name, type_name, .. } => {
                fields_mut(target, schema)?.push(json!({ "name": name, "type": type_name }));
            }
            EditOp::RemoveField { name, .. } => {
                let fields = fields_mut(target, schema)?;
                let before = fields.len();
                fields.retain(|f| f.get("name").and_then(Value::as_str) != Some(name.as_str()));
                if fields.len() == before {
                    return Err(field_not_found(schema, name));
                }
            }
            EditOp::RenameField { old, new, .. } => {
                let field = field_mut(target, schema, old)?;
                field.insert("name".to_string(), Value::String(new.clone()));
            }
            EditOp::UpdateFieldType { field, new_type, .. } => {
                let field = field_mut(target, schema, field)?;
                match field.get_mut("type") {
                    // keep the nullable wrapper, swap the other branch
                    Some(Value::Array(members)) if members.len() == 2 && members.iter().any(|m| m.as_str() == Some("null")) => {
                        if let Some(branch) = members.iter_mut().find(|m| m.as_str() != Some("null")) {
                            *branch = Value::String(new_type.clone());
                        }
                    }
                    _ => {
                        field.insert("type".to_string(), Value::String(new_type.clone()));
                    }
                }
            }
            EditOp::UpdateFieldDefault { field, default, .. } => {
                let field = field_mut(target, schema, field)?;
                match default {
                    Some(value) => {
                        field.insert("default".to_string(), value.clone());
                    }
                    None => {
                        field.shift_remove("default");
                    }
                }
            }
            EditOp::AddSymbol { symbol, .. } => {
                symbols_mut(target, schema)?.push(Value::String(symbol.clone()));
            }
            EditOp::RenameSymbol { old, new, .. } => {
                let slot = symbols_mut(target, schema)?
                    .iter_mut()
                    .find(|s| s.as_str() == Some(old.as_str()))
                    .ok_or_else(|| EditError::SymbolNotFound {
                        schema: schema.to_string(),
                        symbol: old.clone(),
                    })?;
                *slot = Value::String(new.clone());
                if target.get("default").and_then(Value::as_str) == Some(old.as_str()) {
                    target.insert("default".to_string(), Value::String(new.clone()));
                }
            }
        }

        self.render(&doc)
    }
}

/// Find a named type declaration by simple or qualified name, searching nested
/// type definitions too.
fn find_schema_mut<'v>(value: &'v mut Value, name: &str) -> Option<&'v mut Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter_mut().find_map(|item| find_schema_mut(item, name)),
        Value::Object(obj) => {
            if declares(obj, name) {
                return Some(obj);
            }
            obj.iter_mut()
                .filter(|(key, _)| NESTING_KEYS.contains(&key.as_str()))
                .find_map(|(_, child)| find_schema_mut(child, name))
        }
        _ => None,
    }
}

fn declares(obj: &Map<String, Value>, name: &str) -> bool {
    let is_named_type = matches!(
        obj.get("type").and_then(Value::as_str),
        Some("record" | "enum" | "fixed")
    );
    let Some(own) = obj.get("name").and_then(Value::as_str) else {
        return false;
    };
    if !is_named_type {
        return false;
    }
    if own == name {
        return true;
    }
    match obj.get("namespace").and_then(Value::as_str) {
        Some(ns) if !ns.is_empty() => name.strip_prefix(ns).and_then(|rest| rest.strip_prefix('.')) == Some(own),
        _ => own.rsplit_once('.').is_some_and(|(_, simple)| simple == name),
    }
}

fn fields_mut<'m>(target: &'m mut Map<String, Value>, schema: &str) -> Result<&'m mut Vec<Value>, EditError> {
    target
        .get_mut("fields")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| EditError::PatternMismatch(format!("'{schema}' has no fields")))
}

fn symbols_mut<'m>(target: &'m mut Map<String, Value>, schema: &str) -> Result<&'m mut Vec<Value>, EditError> {
    target
        .get_mut("symbols")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| EditError::PatternMismatch(format!("'{schema}' has no symbols")))
}

fn field_mut<'m>(
    target: &'m mut Map<String, Value>,
    schema: &str,
    name: &str,
) -> Result<&'m mut Map<String, Value>, EditError> {
    fields_mut(target, schema)?
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find(|f| f.get("name").and_then(Value::as_str) == Some(name))
        .ok_or_else(|| field_not_found(schema, name))
}

fn field_not_found(schema: &str, field: &str) -> EditError {
    EditError::FieldNotFound {
        schema: schema.to_string(),
        field: field.to_string(),
    }
}
