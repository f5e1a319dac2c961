//! Source text mutation.
//!
//! Edits never touch a [`SchemaGraph`](crate::graph::SchemaGraph): they take the
//! original text, return new text, and the caller parses again. One
//! [`EditOp`] describes the intent; each format implements [`SchemaEditor`].
//!
//! The public helpers are fail-soft: when the target cannot be found or the
//! text cannot be understood, the input comes back unchanged.
//! [`try_apply_edit`] exposes the reason instead.

mod idl;
mod json;

pub use idl::IdlEditor;
pub use json::JsonEditor;

use serde_json::Value;
use tracing::debug;

use crate::detect::SchemaFormat;

/// A single edit against a named schema (simple or fully qualified name).
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    AddField { schema: String, name: String, type_name: String },
    RemoveField { schema: String, name: String },
    RenameField { schema: String, old: String, new: String },
    UpdateFieldType { schema: String, field: String, new_type: String },
    /// `None` removes the default.
    UpdateFieldDefault { schema: String, field: String, default: Option<Value> },
    AddSymbol { schema: String, symbol: String },
    RenameSymbol { schema: String, old: String, new: String },
}

impl EditOp {
    pub fn schema(&self) -> &str {
        match self {
            Self::AddField { schema, .. }
            | Self::RemoveField { schema, .. }
            | Self::RenameField { schema, .. }
            | Self::UpdateFieldType { schema, .. }
            | Self::UpdateFieldDefault { schema, .. }
            | Self::AddSymbol { schema, .. }
            | Self::RenameSymbol { schema, .. } => schema,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("editing is not supported for {0} documents")]
    UnsupportedFormat(&'static str),
    #[error("invalid JSON document: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("schema '{0}' not found")]
    SchemaNotFound(String),
    #[error("field '{field}' not found in '{schema}'")]
    FieldNotFound { schema: String, field: String },
    #[error("symbol '{symbol}' not found in '{schema}'")]
    SymbolNotFound { schema: String, symbol: String },
    #[error("no edit applies: {0}")]
    PatternMismatch(String),
}

/// Formatting knobs for the editors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOptions {
    /// Spaces per level when a JSON document is re-serialized.
    pub json_indent: usize,
    /// Indentation used inside an IDL body when none can be inferred.
    pub indent_unit: String,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            json_indent: 2,
            indent_unit: "  ".to_string(),
        }
    }
}

/// Per-format edit back end.
pub trait SchemaEditor {
    fn apply(&self, text: &str, op: &EditOp) -> Result<String, EditError>;
}

/// Apply `op`, reporting why nothing could be done.
pub fn try_apply_edit(
    text: &str,
    format: SchemaFormat,
    op: &EditOp,
    options: &EditOptions,
) -> Result<String, EditError> {
    match format {
        SchemaFormat::AvroJson => JsonEditor::new(options).apply(text, op),
        SchemaFormat::AvroIdl => IdlEditor::new(options).apply(text, op),
        SchemaFormat::Unknown => Err(EditError::UnsupportedFormat(format.as_str())),
    }
}

/// Apply `op` with default options; a miss returns `text` unchanged.
pub fn apply_edit(text: &str, format: SchemaFormat, op: &EditOp) -> String {
    match try_apply_edit(text, format, op, &EditOptions::default()) {
        Ok(updated) => updated,
        Err(e) => {
            debug!(error = %e, schema = op.schema(), "edit not applied");
            text.to_string()
        }
    }
}

pub fn add_field(text: &str, format: SchemaFormat, schema: &str, name: &str, type_name: &str) -> String {
    apply_edit(
        text,
        format,
        &EditOp::AddField {
            schema: schema.to_string(),
            name: name.to_string(),
            type_name: type_name.to_string(),
        },
    )
}

pub fn remove_field(text: &str, format: SchemaFormat, schema: &str, name: &str) -> String {
    apply_edit(
        text,
        format,
        &EditOp::RemoveField {
            schema: schema.to_string(),
            name: name.to_string(),
        },
    )
}

pub fn rename_field(text: &str, format: SchemaFormat, schema: &str, old: &str, new: &str) -> String {
    apply_edit(
        text,
        format,
        &EditOp::RenameField {
            schema: schema.to_string(),
            old: old.to_string(),
            new: new.to_string(),
        },
    )
}

pub fn update_field_type(text: &str, format: SchemaFormat, schema: &str, field: &str, new_type: &str) -> String {
    apply_edit(
        text,
        format,
        &EditOp::UpdateFieldType {
            schema: schema.to_string(),
            field: field.to_string(),
            new_type: new_type.to_string(),
        },
    )
}

pub fn update_field_default(
    text: &str,
    format: SchemaFormat,
    schema: &str,
    field: &str,
    default: Option<Value>,
) -> String {
    apply_edit(
        text,
        format,
        &EditOp::UpdateFieldDefault {
            schema: schema.to_string(),
            field: field.to_string(),
            default,
        },
    )
}

pub fn add_symbol(text: &str, format: SchemaFormat, schema: &str, symbol: &str) -> String {
    apply_edit(
        text,
        format,
        &EditOp::AddSymbol {
            schema: schema.to_string(),
            symbol: symbol.to_string(),
        },
    )
}

pub fn rename_symbol(text: &str, format: SchemaFormat, schema: &str, old: &str, new: &str) -> String {
    apply_edit(
        text,
        format,
        &EditOp::RenameSymbol {
            schema: schema.to_string(),
            old: old.to_string(),
            new: new.to_string(),
        },
    )
}

/// `new_field`, or `new_field_N` with the first free N >= 2.
pub fn unique_field_name<S: AsRef<str>>(existing: &[S]) -> String {
    unique_name("new_field", existing)
}

/// `NEW_SYMBOL`, or `NEW_SYMBOL_N` with the first free N >= 2.
pub fn unique_symbol_name<S: AsRef<str>>(existing: &[S]) -> String {
    unique_name("NEW_SYMBOL", existing)
}

fn unique_name<S: AsRef<str>>(base: &str, existing: &[S]) -> String {
    let taken = |candidate: &str| existing.iter().any(|e| e.as_ref() == candidate);
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
