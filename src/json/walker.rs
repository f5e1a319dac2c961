//! Structural walk over decoded JSON schema declarations.

use serde_json::Value;
use tracing::debug;

use super::decode::{DeclBody, FieldDecl, JoinDecl, SchemaDecl, TypeExpr};
use crate::builder::{GraphBuilder, ResolvedType};
use crate::graph::{
    Cardinality, Diagnostic, EntityBody, Field, Relationship, SchemaEntity, SchemaGraph,
    SourceRange, namespace_of, qualified_id,
};

/// Parse JSON schema text into a graph.
///
/// The document may hold one declaration or an array of them; all share one
/// registry so references resolve across the whole input. Invalid JSON yields
/// an empty graph with one positioned diagnostic.
pub fn parse_json(input: &str) -> SchemaGraph {
    let value: Value = match serde_json::from_str(input) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "JSON schema did not parse");
            let range = SourceRange::point(e.line(), e.column());
            return SchemaGraph {
                diagnostics: vec![Diagnostic::error(format!("JSON parse error: {e}")).with_range(range)],
                ..SchemaGraph::default()
            };
        }
    };

    let top_level = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut walker = Walker::default();
    for item in &top_level {
        if let Some(decl) = SchemaDecl::decode(item) {
            walker.declare(&decl, None);
        }
    }

    let graph = walker.builder.finish();
    debug!(
        entities = graph.entities.len(),
        relationships = graph.relationships.len(),
        diagnostics = graph.diagnostics.len(),
        "parsed JSON schema"
    );
    graph
}

#[derive(Default)]
struct Walker {
    builder: GraphBuilder,
}

impl Walker {
    /// Register a declaration and everything inline in it. Returns its id; an
    /// id seen before is returned untouched.
    fn declare(&mut self, decl: &SchemaDecl, parent: Option<&str>) -> String {
        let namespace = decl
            .namespace
            .clone()
            .or_else(|| parent.and_then(namespace_of).map(str::to_string));
        let id = qualified_id(namespace.as_deref(), &decl.name);

        let entity = SchemaEntity {
            id: id.clone(),
            name: decl.name.clone(),
            namespace: namespace.clone(),
            doc: decl.doc.clone(),
            body: EntityBody::empty(decl.kind()),
            is_nested: parent.is_some(),
            parent_schema: parent.map(str::to_string),
        };
        let Some(slot) = self.builder.register(entity) else {
            return id;
        };

        let body = match &decl.body {
            DeclBody::Record(fields) => EntityBody::Record {
                fields: fields
                    .iter()
                    .map(|f| self.field(f, &id, namespace.as_deref()))
                    .collect(),
            },
            DeclBody::Enum(symbols) => EntityBody::Enum {
                symbols: symbols.clone(),
            },
            DeclBody::Fixed(size) => EntityBody::Fixed { size: *size },
        };
        self.builder.set_body(slot, body);
        id
    }

    fn field(&mut self, decl: &FieldDecl, source: &str, namespace: Option<&str>) -> Field {
        let resolved = self.resolve(&decl.ty, &decl.name, source, namespace);
        self.builder.link_field(source, &decl.name, &resolved);

        if let Some(join) = &decl.join {
            self.join(join, &decl.name, source);
        }

        Field {
            name: decl.name.clone(),
            field_type: resolved.ty,
            doc: decl.doc.clone(),
            default: decl.default.clone(),
            annotations: decl.annotations.clone(),
        }
    }

    fn join(&mut self, join: &JoinDecl, field: &str, source: &str) {
        let Some(target) = &join.schema else {
            self.builder.diagnostic(Diagnostic::warning(format!(
                "join on {source}.{field} is missing a schema"
            )));
            return;
        };
        let cardinality = join.cardinality.as_deref().and_then(|c| {
            let parsed = Cardinality::from_str(c);
            if parsed.is_none() {
                self.builder.diagnostic(Diagnostic::warning(format!(
                    "Unknown join cardinality '{c}' on {source}.{field}"
                )));
            }
            parsed
        });
        self.builder.relate(Relationship::join(
            source,
            field,
            target,
            join.field.as_deref(),
            cardinality,
        ));
    }

    fn resolve(
        &mut self,
        ty: &TypeExpr,
        field: &str,
        source: &str,
        namespace: Option<&str>,
    ) -> ResolvedType {
        match ty {
            TypeExpr::Primitive(name) => ResolvedType::primitive(name),
            TypeExpr::Named(name) => ResolvedType::named(&self.builder.qualify(name, namespace)),
            TypeExpr::Array(items) => self.resolve(items, field, source, namespace).array(),
            TypeExpr::Map(values) => self.resolve(values, field, source, namespace).map(),
            TypeExpr::Union(members) => ResolvedType::union(
                members
                    .iter()
                    .map(|m| self.resolve(m, field, source, namespace))
                    .collect(),
            ),
            TypeExpr::Inline(decl) => {
                let id = self.declare(decl, Some(source));
                self.builder.relate(Relationship::nested(source, field, &id));
                ResolvedType::inline(&decl.name, &id)
            }
            TypeExpr::Unknown(display) => ResolvedType::unknown(display.as_str()),
        }
    }
}
