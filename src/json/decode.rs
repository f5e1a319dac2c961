//! Typed view over JSON schema declarations.
//!
//! Raw `serde_json::Value`s are decoded once into this small AST; the walker
//! never looks at untyped maps.

use serde_json::{Map, Value};

use crate::builder::is_primitive;
use crate::graph::EntityKind;

/// Field keys with a meaning of their own; everything else is an annotation.
const STANDARD_FIELD_KEYS: &[&str] = &["name", "type", "doc", "default", "order", "aliases", "join"];

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Primitive(String),
    Named(String),
    Array(Box<TypeExpr>),
    Map(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    Inline(Box<SchemaDecl>),
    /// Anything unrecognized, kept only for display.
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclBody {
    Record(Vec<FieldDecl>),
    Enum(Vec<String>),
    Fixed(Option<u64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDecl {
    pub name: String,
    pub namespace: Option<String>,
    pub doc: Option<String>,
    pub body: DeclBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub doc: Option<String>,
    pub default: Option<Value>,
    pub join: Option<JoinDecl>,
    pub annotations: Option<Map<String, Value>>,
}

/// Author-declared logical foreign key (`"join": {...}` on a field).
#[derive(Debug, Clone, PartialEq)]
pub struct JoinDecl {
    /// `None` when the object names no target schema.
    pub schema: Option<String>,
    pub field: Option<String>,
    pub cardinality: Option<String>,
}

fn str_of<'v>(obj: &'v Map<String, Value>, key: &str) -> Option<&'v str> {
    obj.get(key).and_then(Value::as_str)
}

impl SchemaDecl {
    /// Decode a named type declaration. Objects without a named-type `type` or
    /// without a `name` are not declarations and yield `None`.
    pub fn decode(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let kind = str_of(obj, "type").and_then(EntityKind::from_str)?;
        // "error" is an IDL keyword only
        if str_of(obj, "type") == Some("error") {
            return None;
        }
        let full_name = str_of(obj, "name").filter(|n| !n.is_empty())?;

        let (namespace, name) = match full_name.rsplit_once('.') {
            Some((ns, simple)) => (Some(ns.to_string()), simple.to_string()),
            None => (
                str_of(obj, "namespace").filter(|ns| !ns.is_empty()).map(str::to_string),
                full_name.to_string(),
            ),
        };

        let body = match kind {
            EntityKind::Record => DeclBody::Record(
                obj.get("fields")
                    .and_then(Value::as_array)
                    .map(|fields| fields.iter().filter_map(FieldDecl::decode).collect())
                    .unwrap_or_default(),
            ),
            EntityKind::Enum => DeclBody::Enum(
                obj.get("symbols")
                    .and_then(Value::as_array)
                    .map(|symbols| {
                        symbols
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            EntityKind::Fixed => DeclBody::Fixed(obj.get("size").and_then(Value::as_u64)),
        };

        Some(Self {
            name,
            namespace,
            doc: str_of(obj, "doc").map(str::to_string),
            body,
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self.body {
            DeclBody::Record(_) => EntityKind::Record,
            DeclBody::Enum(_) => EntityKind::Enum,
            DeclBody::Fixed(_) => EntityKind::Fixed,
        }
    }
}

impl FieldDecl {
    pub fn decode(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let name = str_of(obj, "name")?.to_string();
        let ty = obj
            .get("type")
            .map_or_else(|| TypeExpr::Unknown("unknown".to_string()), TypeExpr::decode);

        let annotations: Map<String, Value> = obj
            .iter()
            .filter(|(k, _)| !STANDARD_FIELD_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Some(Self {
            name,
            ty,
            doc: str_of(obj, "doc").map(str::to_string),
            default: obj.get("default").cloned(),
            join: obj.get("join").and_then(JoinDecl::decode),
            annotations: (!annotations.is_empty()).then_some(annotations),
        })
    }
}

impl JoinDecl {
    fn decode(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            schema: str_of(obj, "schema").filter(|s| !s.is_empty()).map(str::to_string),
            field: str_of(obj, "field").map(str::to_string),
            cardinality: str_of(obj, "cardinality").map(str::to_string),
        })
    }
}

impl TypeExpr {
    pub fn decode(value: &Value) -> Self {
        match value {
            Value::String(name) => Self::from_name(name),
            Value::Array(members) => Self::Union(members.iter().map(Self::decode).collect()),
            Value::Object(obj) => match obj.get("type") {
                Some(Value::String(kind)) => match kind.as_str() {
                    "array" => Self::Array(Box::new(
                        obj.get("items").map_or(Self::Unknown("unknown".into()), Self::decode),
                    )),
                    "map" => Self::Map(Box::new(
                        obj.get("values").map_or(Self::Unknown("unknown".into()), Self::decode),
                    )),
                    "record" | "enum" | "fixed" => SchemaDecl::decode(value)
                        .map_or_else(|| Self::Unknown(kind.clone()), |decl| Self::Inline(Box::new(decl))),
                    // {"type": "string", "logicalType": "uuid"} and {"type": "Ref"}
                    other => Self::from_name(other),
                },
                Some(inner @ (Value::Object(_) | Value::Array(_))) => Self::decode(inner),
                _ => Self::Unknown(value.to_string()),
            },
            other => Self::Unknown(other.to_string()),
        }
    }

    fn from_name(name: &str) -> Self {
        if is_primitive(name) {
            Self::Primitive(name.to_string())
        } else {
            Self::Named(name.to_string())
        }
    }
}
