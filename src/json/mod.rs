//! Avro JSON (`.avsc`) frontend.

mod decode;
mod walker;

pub use decode::{DeclBody, FieldDecl, JoinDecl, SchemaDecl, TypeExpr};
pub use walker::parse_json;
