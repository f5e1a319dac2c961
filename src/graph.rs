//! Unified graph model shared by the JSON and IDL frontends.
//!
//! A [`SchemaGraph`] is plain value data produced fresh by every parse call.
//! Edits never touch it; they rewrite source text which is then parsed again.

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaGraph {
    pub entities: Vec<SchemaEntity>,
    pub relationships: Vec<Relationship>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SchemaGraph {
    /// An empty graph carrying a single error diagnostic.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            diagnostics: vec![Diagnostic::error(message)],
            ..Self::default()
        }
    }

    pub fn entity(&self, id: &str) -> Option<&SchemaEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Relationships leaving the given entity, in emission order.
    pub fn relationships_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.relationships.iter().filter(move |r| r.source_schema == id)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Record,
    Enum,
    Fixed,
}

impl EntityKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "record" | "error" => Some(Self::Record),
            "enum" => Some(Self::Enum),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaEntity {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(flatten)]
    pub body: EntityBody,
    pub is_nested: bool,
    /// Id of the textually enclosing entity. Lookup only, never ownership.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_schema: Option<String>,
}

/// Kind-specific payload; serialized as `kind` plus the matching member.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityBody {
    Record { fields: Vec<Field> },
    Enum { symbols: Vec<String> },
    Fixed {
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
    },
}

impl EntityBody {
    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Record => Self::Record { fields: Vec::new() },
            EntityKind::Enum => Self::Enum { symbols: Vec::new() },
            EntityKind::Fixed => Self::Fixed { size: None },
        }
    }
}

impl SchemaEntity {
    pub fn kind(&self) -> EntityKind {
        match self.body {
            EntityBody::Record { .. } => EntityKind::Record,
            EntityBody::Enum { .. } => EntityKind::Enum,
            EntityBody::Fixed { .. } => EntityKind::Fixed,
        }
    }

    pub fn fields(&self) -> &[Field] {
        match &self.body {
            EntityBody::Record { fields } => fields,
            _ => &[],
        }
    }

    pub fn symbols(&self) -> &[String] {
        match &self.body {
            EntityBody::Enum { symbols } => symbols,
            _ => &[],
        }
    }

    pub fn size(&self) -> Option<u64> {
        match self.body {
            EntityBody::Fixed { size } => size,
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().iter().find(|f| f.name == name)
    }
}

/// Build an entity id from an optional namespace and a simple name.
pub fn qualified_id(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{ns}.{name}"),
        _ => name.to_string(),
    }
}

/// Namespace part of a qualified id (`a.b.C` -> `a.b`).
pub fn namespace_of(id: &str) -> Option<&str> {
    id.rsplit_once('.').map(|(ns, _)| ns)
}

/// Last segment of a possibly qualified name.
pub fn simple_name(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, simple)| simple)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Non-standard keys kept verbatim for round-tripping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Map<String, Value>>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            doc: None,
            default: None,
            annotations: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldType {
    pub display: String,
    pub is_reference: bool,
    /// May name an entity that is not (yet) part of the graph.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_schema: Option<String>,
    pub is_array: bool,
    pub is_nullable: bool,
    pub is_union: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub union_types: Option<Vec<FieldType>>,
}

impl FieldType {
    pub fn primitive(name: &str) -> Self {
        Self {
            display: name.to_string(),
            is_nullable: name == "null",
            ..Self::default()
        }
    }

    pub fn reference(display: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            is_reference: true,
            referenced_schema: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn is_null(&self) -> bool {
        !self.is_reference && self.display == "null"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Reference,
    Nested,
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:1")]
    ManyToOne,
    #[serde(rename = "N:M")]
    ManyToMany,
}

impl Cardinality {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "1:1" => Some(Self::OneToOne),
            "1:N" | "1:n" => Some(Self::OneToMany),
            "N:1" | "n:1" => Some(Self::ManyToOne),
            "N:M" | "n:m" => Some(Self::ManyToMany),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToOne => "N:1",
            Self::ManyToMany => "N:M",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub source_schema: String,
    pub source_field: String,
    pub target_schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_field: Option<String>,
    pub kind: RelationshipKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
}

impl Relationship {
    pub fn reference(source: &str, field: &str, target: &str, cardinality: Cardinality) -> Self {
        Self {
            id: format!("ref-{source}.{field}-{target}"),
            source_schema: source.to_string(),
            source_field: field.to_string(),
            target_schema: target.to_string(),
            target_field: None,
            kind: RelationshipKind::Reference,
            label: None,
            cardinality: Some(cardinality),
        }
    }

    /// Synthetic "contains" edge from a parent to an inline/nested type.
    pub fn nested(parent: &str, field: &str, child: &str) -> Self {
        Self {
            id: format!("nested-{parent}-{child}"),
            source_schema: parent.to_string(),
            source_field: field.to_string(),
            target_schema: child.to_string(),
            target_field: None,
            kind: RelationshipKind::Nested,
            label: Some("contains".to_string()),
            cardinality: None,
        }
    }

    pub fn join(
        source: &str,
        field: &str,
        target: &str,
        target_field: Option<&str>,
        cardinality: Option<Cardinality>,
    ) -> Self {
        Self {
            id: format!("join-{source}.{field}-{target}"),
            source_schema: source.to_string(),
            source_field: field.to_string(),
            target_schema: target.to_string(),
            target_field: target_field.map(str::to_string),
            kind: RelationshipKind::Join,
            label: target_field.map(|tf| format!("{field} → {tf}")),
            cardinality,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    #[serde(flatten)]
    pub range: Option<SourceRange>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            range: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
            range: None,
        }
    }

    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.range = Some(range);
        self
    }
}

/// 1-based line/column span. Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    #[serde(rename = "startLineNumber")]
    pub start_line: usize,
    #[serde(rename = "startColumn")]
    pub start_column: usize,
    #[serde(rename = "endLineNumber")]
    pub end_line: usize,
    #[serde(rename = "endColumn")]
    pub end_column: usize,
}

impl SourceRange {
    pub fn point(line: usize, column: usize) -> Self {
        Self {
            start_line: line,
            start_column: column,
            end_line: line,
            end_column: column,
        }
    }

    /// Convert a byte span of `source` into a line/column range. Builds a
    /// [`LineIndex`] each call; use one index for many ranges over one source.
    pub fn from_offsets(source: &str, start: usize, end: usize) -> Self {
        LineIndex::new(source).range(start, end)
    }
}

/// Line start offsets of a source text, for offset to line/column lookup.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    starts: Vec<usize>,
    /// Lines holding only ASCII, where a column is a byte distance.
    ascii: Vec<bool>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut starts = vec![0];
        let mut ascii = Vec::new();
        let mut line_ascii = true;
        for (idx, b) in source.bytes().enumerate() {
            if b == b'\n' {
                starts.push(idx + 1);
                ascii.push(line_ascii);
                line_ascii = true;
            } else if !b.is_ascii() {
                line_ascii = false;
            }
        }
        ascii.push(line_ascii);
        Self { source, starts, ascii }
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let line = self.starts.partition_point(|&s| s <= offset) - 1;
        let start = self.starts[line];
        let column = if self.ascii[line] {
            offset - start
        } else {
            self.source
                .get(start..offset)
                .map_or(offset - start, |text| text.chars().count())
        };
        (line + 1, column + 1)
    }

    pub fn range(&self, start: usize, end: usize) -> SourceRange {
        let (start_line, start_column) = self.line_col(start);
        let (end_line, end_column) = self.line_col(end.max(start));
        SourceRange {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_id() {
        assert_eq!(qualified_id(Some("com.example"), "User"), "com.example.User");
        assert_eq!(qualified_id(None, "User"), "User");
        assert_eq!(qualified_id(Some(""), "User"), "User");
    }

    #[test]
    fn test_name_parts() {
        assert_eq!(namespace_of("a.b.C"), Some("a.b"));
        assert_eq!(namespace_of("C"), None);
        assert_eq!(simple_name("a.b.C"), "C");
        assert_eq!(simple_name("C"), "C");
    }

    #[test]
    fn test_source_range_from_offsets() {
        let src = "record A {\n  string x;\n}";
        let range = SourceRange::from_offsets(src, 13, 19);
        assert_eq!(range.start_line, 2);
        assert_eq!(range.start_column, 3);
        assert_eq!(range.end_line, 2);
        assert_eq!(range.end_column, 9);
    }

    #[test]
    fn test_source_range_counts_chars() {
        let src = "ユーザー x";
        let range = SourceRange::from_offsets(src, "ユーザー ".len(), src.len());
        assert_eq!(range.start_column, 6);
    }

    #[test]
    fn test_line_index_reuse() {
        let src = "a\r\nbé c\n\nd";
        let lines = LineIndex::new(src);
        assert_eq!(lines.line_col(0), (1, 1));
        assert_eq!(lines.line_col(3), (2, 1));
        assert_eq!(lines.line_col(src.find('c').unwrap()), (2, 4));
        assert_eq!(lines.line_col(src.find('d').unwrap()), (4, 1));
        assert_eq!(lines.line_col(src.len() + 10), (4, 2));
    }

    #[test]
    fn test_cardinality_labels() {
        assert_eq!(Cardinality::from_str("N:1"), Some(Cardinality::ManyToOne));
        assert_eq!(Cardinality::from_str("2:3"), None);
        assert_eq!(Cardinality::OneToMany.as_str(), "1:N");
    }

    #[test]
    fn test_entity_serializes_kind_and_body() {
        let entity = SchemaEntity {
            id: "User".into(),
            name: "User".into(),
            namespace: None,
            doc: None,
            body: EntityBody::Record {
                fields: vec![Field::new("id", FieldType::primitive("long"))],
            },
            is_nested: false,
            parent_schema: None,
        };
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["kind"], "record");
        assert_eq!(json["isNested"], false);
        assert_eq!(json["fields"][0]["type"]["display"], "long");
        assert!(json.get("namespace").is_none());
    }

    #[test]
    fn test_diagnostic_range_flattens() {
        let d = Diagnostic::error("boom").with_range(SourceRange::point(3, 4));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["startLineNumber"], 3);
        assert_eq!(json["endColumn"], 4);
    }

    #[test]
    fn test_join_label() {
        let rel = Relationship::join("E", "user_id", "User", Some("id"), None);
        assert_eq!(rel.id, "join-E.user_id-User");
        assert_eq!(rel.label.as_deref(), Some("user_id → id"));
        let rel = Relationship::join("E", "user_id", "User", None, None);
        assert!(rel.label.is_none());
    }
}
