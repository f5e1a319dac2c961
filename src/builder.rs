//! Graph assembly shared by both frontends.
//!
//! The JSON walker and the IDL parser only decide *what* they saw; identity,
//! de-duplication, union normalization and reference emission all live here so
//! the two syntaxes converge on identical graphs for identical schemas.

use std::collections::HashSet;

use crate::graph::{
    Cardinality, Diagnostic, EntityBody, Field, FieldType, Relationship, SchemaEntity, SchemaGraph,
    qualified_id, simple_name,
};

/// Avro primitive type names.
pub const PRIMITIVES: &[&str] = &[
    "null", "boolean", "int", "long", "float", "double", "bytes", "string",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// Edge a field type asks for once the field name is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub target: String,
    pub cardinality: Cardinality,
}

/// A resolved field type plus the reference edge it implies, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType {
    pub ty: FieldType,
    pub link: Option<Link>,
}

impl ResolvedType {
    pub fn primitive(name: &str) -> Self {
        Self {
            ty: FieldType::primitive(name),
            link: None,
        }
    }

    /// Named reference to `target` (already qualified by the caller).
    pub fn named(target: &str) -> Self {
        Self {
            ty: FieldType::reference(simple_name(target), target),
            link: Some(Link {
                target: target.to_string(),
                cardinality: Cardinality::OneToOne,
            }),
        }
    }

    /// Inline definition: points at the nested entity but draws no reference edge,
    /// the caller emits a `nested` relationship instead.
    pub fn inline(display: &str, target: &str) -> Self {
        Self {
            ty: FieldType::reference(display, target),
            link: None,
        }
    }

    pub fn unknown(display: impl Into<String>) -> Self {
        Self {
            ty: FieldType {
                display: display.into(),
                ..FieldType::default()
            },
            link: None,
        }
    }

    /// Array of the item type. An inline item definition gains a `1:N` edge here
    /// on top of its `nested` one.
    pub fn array(self) -> Self {
        let Self { ty, link } = self;
        let link = link.or_else(|| {
            ty.referenced_schema.clone().map(|target| Link {
                target,
                cardinality: Cardinality::OneToMany,
            })
        });
        Self {
            ty: FieldType {
                display: format!("{}[]", ty.display),
                is_reference: ty.is_reference,
                referenced_schema: ty.referenced_schema,
                is_array: true,
                ..FieldType::default()
            },
            link: link.map(|l| Link {
                cardinality: Cardinality::OneToMany,
                ..l
            }),
        }
    }

    /// Maps keep the value's reference info but never draw an edge.
    pub fn map(self) -> Self {
        let ty = self.ty;
        Self {
            ty: FieldType {
                display: format!("map<{}>", ty.display),
                is_reference: ty.is_reference,
                referenced_schema: ty.referenced_schema,
                ..FieldType::default()
            },
            link: None,
        }
    }

    /// `T?` shorthand.
    pub fn nullable(mut self) -> Self {
        if !self.ty.is_nullable {
            self.ty.display.push('?');
            self.ty.is_nullable = true;
        }
        self
    }

    /// Union of members; `{null, T}` collapses to nullable `T`.
    pub fn union(members: Vec<ResolvedType>) -> Self {
        let has_null = members.iter().any(|m| m.ty.is_null());
        let mut non_null: Vec<&ResolvedType> = members.iter().filter(|m| !m.ty.is_null()).collect();

        if has_null && non_null.len() == 1 {
            if let Some(inner) = non_null.pop() {
                let inner = inner.clone();
                return Self {
                    ty: FieldType {
                        display: format!("{}?", inner.ty.display),
                        is_reference: inner.ty.is_reference,
                        referenced_schema: inner.ty.referenced_schema,
                        is_array: inner.ty.is_array,
                        is_nullable: true,
                        ..FieldType::default()
                    },
                    link: inner.link,
                };
            }
        }

        let first_ref = non_null.iter().find(|m| m.ty.is_reference);
        let is_reference = first_ref.is_some();
        let referenced_schema = first_ref.and_then(|m| m.ty.referenced_schema.clone());
        let link = first_ref.and_then(|m| m.link.clone());
        let display = members
            .iter()
            .map(|m| m.ty.display.as_str())
            .collect::<Vec<_>>()
            .join(" | ");

        Self {
            ty: FieldType {
                display,
                is_reference,
                referenced_schema,
                is_array: false,
                is_nullable: has_null,
                is_union: true,
                union_types: Some(members.into_iter().map(|m| m.ty).collect()),
            },
            link,
        }
    }
}

/// Position in the builder's output that can be restored.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    entities: usize,
    relationships: usize,
}

#[derive(Debug, Default)]
pub struct GraphBuilder {
    entities: Vec<SchemaEntity>,
    relationships: Vec<Relationship>,
    diagnostics: Vec<Diagnostic>,
    known: HashSet<String>,
    edge_ids: HashSet<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    /// Register an entity. Returns its slot, or `None` if the id is taken
    /// (first registration wins).
    pub fn register(&mut self, entity: SchemaEntity) -> Option<usize> {
        if !self.known.insert(entity.id.clone()) {
            return None;
        }
        self.entities.push(entity);
        Some(self.entities.len() - 1)
    }

    pub fn set_body(&mut self, slot: usize, body: EntityBody) {
        if let Some(entity) = self.entities.get_mut(slot) {
            entity.body = body;
        }
    }

    /// Append a field to a registered record.
    pub fn push_field(&mut self, slot: usize, field: Field) {
        if let Some(SchemaEntity {
            body: EntityBody::Record { fields },
            ..
        }) = self.entities.get_mut(slot)
        {
            fields.push(field);
        }
    }

    /// Push a relationship unless one with the same id was already emitted.
    pub fn relate(&mut self, rel: Relationship) -> bool {
        if !self.edge_ids.insert(rel.id.clone()) {
            return false;
        }
        self.relationships.push(rel);
        true
    }

    /// Emit the reference edge implied by a resolved field type.
    pub fn link_field(&mut self, source: &str, field: &str, resolved: &ResolvedType) {
        if let Some(link) = &resolved.link {
            self.relate(Relationship::reference(
                source,
                field,
                &link.target,
                link.cardinality,
            ));
        }
    }

    pub fn diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Qualify a reference against the enclosing namespace.
    ///
    /// Dotted names are taken as-is. A bare name prefers the namespaced id, then a
    /// known bare id; unknown names are qualified (forward reference).
    pub fn qualify(&self, name: &str, namespace: Option<&str>) -> String {
        if name.contains('.') {
            return name.to_string();
        }
        let full = qualified_id(namespace, name);
        if self.contains(&full) || !self.contains(name) {
            full
        } else {
            name.to_string()
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            entities: self.entities.len(),
            relationships: self.relationships.len(),
        }
    }

    /// Drop every entity and relationship added since `cp`. Diagnostics stay.
    pub fn rollback(&mut self, cp: Checkpoint) {
        for entity in self.entities.drain(cp.entities..) {
            self.known.remove(&entity.id);
        }
        for rel in self.relationships.drain(cp.relationships..) {
            self.edge_ids.remove(&rel.id);
        }
    }

    pub fn finish(self) -> SchemaGraph {
        SchemaGraph {
            entities: self.entities,
            relationships: self.relationships,
            diagnostics: self.diagnostics,
        }
    }
}
