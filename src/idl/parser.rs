//! Recursive-descent parser for the protocol/IDL syntax.
//!
//! The parser never aborts on malformed input: a missing or unexpected token
//! becomes a diagnostic and parsing resumes at the next token. Only running out
//! of input where a token is mandatory surfaces as a [`ParseError`], which
//! [`parse_idl`] turns into a single diagnostic while keeping everything
//! extracted up to that point.

use tracing::debug;

use super::lexer::{Lexed, Lexer, Token, TokenKind, clean_doc, matching_brace};
use crate::builder::{GraphBuilder, ResolvedType, is_primitive};
use crate::graph::{
    Cardinality, Diagnostic, EntityBody, EntityKind, Field, LineIndex, Relationship, SchemaEntity,
    SchemaGraph, SourceRange, qualified_id,
};

/// Logical types the IDL spells as bare keywords.
const LOGICAL_TYPES: &[&str] = &[
    "date", "time_ms", "timestamp_ms", "local_timestamp_ms", "decimal", "uuid",
];

/// Deepest nesting of protocols, declarations and types the parser descends into.
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(&'static str),
}

/// Parse IDL source into a graph. Never fails; problems become diagnostics.
pub fn parse_idl(input: &str) -> SchemaGraph {
    let Lexed { tokens, errors } = Lexer::new(input).tokenize();
    let mut parser = Parser::new(input, &tokens);

    for err in errors {
        let range = parser.lines.range(err.offset(), input.len());
        parser.builder.diagnostic(Diagnostic::warning(err.to_string()).with_range(range));
    }

    if let Err(e) = parser.parse_members(Scope::default(), false) {
        let range = parser.lines.range(input.len(), input.len());
        parser
            .builder
            .diagnostic(Diagnostic::error(format!("IDL parse error: {e}")).with_range(range));
    }

    let graph = parser.builder.finish();
    debug!(
        entities = graph.entities.len(),
        relationships = graph.relationships.len(),
        diagnostics = graph.diagnostics.len(),
        "parsed IDL schema"
    );
    graph
}

/// Naming context threaded through the descent. Entering a protocol, a
/// namespace statement or a record body produces a new scope; nothing is
/// mutated in place.
#[derive(Debug, Clone, Default)]
struct Scope {
    namespace: Option<String>,
    parent: Option<String>,
}

impl Scope {
    fn with_namespace(&self, namespace: Option<String>) -> Self {
        Self {
            namespace,
            parent: self.parent.clone(),
        }
    }

    fn within(namespace: Option<String>, parent: String) -> Self {
        Self {
            namespace,
            parent: Some(parent),
        }
    }
}

#[derive(Debug)]
struct JoinSpec {
    schema: Option<String>,
    field: Option<String>,
    cardinality: Option<String>,
    range: SourceRange,
}

/// Annotations preceding a declaration or field that the parser understands.
#[derive(Debug, Default)]
struct Annotations {
    namespace: Option<String>,
    join: Option<JoinSpec>,
}

#[derive(Debug, Default)]
struct AnnotationArgs {
    positional: Option<String>,
    pairs: Vec<(String, String)>,
}

impl AnnotationArgs {
    fn get(&self, key: &str) -> Option<String> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }
}

struct Parser<'a> {
    source: &'a str,
    lines: LineIndex<'a>,
    tokens: &'a [Token<'a>],
    pos: usize,
    depth: usize,
    too_deep: bool,
    builder: GraphBuilder,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: &'a [Token<'a>]) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            tokens,
            pos: 0,
            depth: 0,
            too_deep: false,
            builder: GraphBuilder::new(),
        }
    }

    fn peek(&self) -> Option<&'a Token<'a>> {
        let tokens = self.tokens;
        tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&'a Token<'a>> {
        let tokens = self.tokens;
        tokens.get(self.pos + ahead)
    }

    fn advance(&mut self) -> Option<&'a Token<'a>> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn check_symbol(&self, sym: char) -> bool {
        self.peek().is_some_and(|t| t.is_symbol(sym))
    }

    fn consume_symbol(&mut self, sym: char) -> bool {
        if self.check_symbol(sym) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn range_of(&self, tok: Option<&Token<'_>>) -> SourceRange {
        match tok {
            Some(t) => self.lines.range(t.offset, t.end),
            None => self.lines.range(self.source.len(), self.source.len()),
        }
    }

    fn descend<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Step over the construct at the current token without descending into
    /// it. Stops after its balanced group closes, or before a `;`, `,` or a
    /// closer that belongs to the enclosing construct.
    fn skip_too_deep(&mut self) -> Result<(), ParseError> {
        if !self.too_deep {
            self.too_deep = true;
            let tok = self.peek();
            self.report(format!("Nesting deeper than {MAX_DEPTH} levels is not supported"), tok);
        }
        let mut open = 0usize;
        while let Some(tok) = self.peek() {
            let opens = tok.is_symbol('{') || tok.is_symbol('<') || tok.is_symbol('(');
            let closes = tok.is_symbol('}') || tok.is_symbol('>') || tok.is_symbol(')');
            if open == 0 && (closes || tok.is_symbol(';') || tok.is_symbol(',')) {
                return Ok(());
            }
            self.pos += 1;
            if opens {
                open += 1;
            } else if closes {
                open -= 1;
                if open == 0 {
                    return Ok(());
                }
            }
        }
        Err(ParseError::UnexpectedEof("end of nested block"))
    }

    fn report(&mut self, message: String, tok: Option<&Token<'_>>) {
        let range = self.range_of(tok);
        self.builder.diagnostic(Diagnostic::error(message).with_range(range));
    }

    /// Consume `sym` or record a diagnostic without consuming anything.
    fn expect(&mut self, sym: char) {
        if self.consume_symbol(sym) {
            return;
        }
        let tok = self.peek();
        let found = tok.map_or_else(|| "end of input".to_string(), |t| format!("'{}'", t.text));
        self.report(format!("Expected '{sym}' but found {found}"), tok);
    }

    /// Consume a name token. A non-name token is reported and left in place.
    fn name(&mut self, what: &'static str) -> Result<Option<&'a Token<'a>>, ParseError> {
        let tok = self.peek().ok_or(ParseError::UnexpectedEof(what))?;
        if tok.is_name() {
            self.pos += 1;
            Ok(Some(tok))
        } else {
            self.report(format!("Expected {what} but found '{}'", tok.text), Some(tok));
            Ok(None)
        }
    }

    fn doc(&self) -> Option<String> {
        self.peek().and_then(|t| t.doc).map(clean_doc)
    }

    /// Skip a balanced `( ... )` group starting at the current token.
    fn skip_parens(&mut self) -> AnnotationArgs {
        let mut args = AnnotationArgs::default();
        if !self.consume_symbol('(') {
            return args;
        }
        let mut depth = 1usize;
        while let Some(tok) = self.advance() {
            if tok.is_symbol('(') {
                depth += 1;
            } else if tok.is_symbol(')') {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            } else if depth == 1 {
                if tok.kind == TokenKind::Str && args.positional.is_none() && args.pairs.is_empty() {
                    args.positional = Some(tok.text.to_string());
                } else if tok.is_name() && self.check_symbol('=') {
                    if let Some(value) = self.peek_at(1).filter(|v| !v.is_symbol(')')) {
                        args.pairs.push((tok.text.to_string(), value.text.to_string()));
                        self.pos += 2;
                    }
                }
            }
        }
        args
    }

    fn parse_annotations(&mut self) -> Annotations {
        let mut ann = Annotations::default();
        while let Some(tok) = self.peek().filter(|t| t.kind == TokenKind::Annotation) {
            self.pos += 1;
            let args = self.skip_parens();
            match tok.text {
                "@namespace" => ann.namespace = args.positional,
                "@join" => {
                    ann.join = Some(JoinSpec {
                        schema: args.get("schema"),
                        field: args.get("field"),
                        cardinality: args.get("cardinality"),
                        range: self.range_of(Some(tok)),
                    })
                }
                _ => {}
            }
        }
        ann
    }

    /// Members of the file or of a protocol body (`closed`).
    fn parse_members(&mut self, mut scope: Scope, closed: bool) -> Result<(), ParseError> {
        while let Some(tok) = self.peek() {
            if closed && tok.is_symbol('}') {
                break;
            }
            let start = self.pos;
            let doc = self.doc();
            let ann = self.parse_annotations();
            let Some(tok) = self.peek() else { break };

            if tok.is_word("protocol") {
                self.parse_protocol(&scope, ann)?;
            } else if is_declaration(tok) {
                self.parse_declaration(&scope, ann, doc)?;
            } else if tok.is_symbol(';') && ann.namespace.is_some() {
                // `@namespace("x");` holds for the rest of this body
                self.pos += 1;
                scope = scope.with_namespace(ann.namespace);
            } else if !closed
                && tok.is_word("namespace")
                && self.peek_at(1).is_some_and(|t| t.is_name())
                && self.peek_at(2).is_some_and(|t| t.is_symbol(';'))
            {
                let ns = self.peek_at(1).map(|t| t.text.to_string());
                self.pos += 3;
                scope = scope.with_namespace(ns);
            } else if tok.is_symbol('{') {
                // message bodies and other unsupported blocks
                self.pos = matching_brace(self.tokens, self.pos).map_or(self.tokens.len(), |c| c + 1);
            }

            if self.pos == start {
                self.pos += 1;
            }
        }
        Ok(())
    }

    fn parse_protocol(&mut self, scope: &Scope, ann: Annotations) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return self.skip_too_deep();
        }
        self.pos += 1; // protocol
        let namespace = match self.name("protocol name")? {
            Some(name) => ann.namespace.or_else(|| Some(name.text.to_string())),
            None => ann.namespace.or_else(|| scope.namespace.clone()),
        };
        self.expect('{');
        self.descend(|p| p.parse_members(scope.with_namespace(namespace), true))?;
        self.expect('}');
        Ok(())
    }

    fn parse_declaration(
        &mut self,
        scope: &Scope,
        ann: Annotations,
        doc: Option<String>,
    ) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            self.skip_too_deep()?;
            if self.consume_symbol('=') {
                self.skip_default();
            }
            self.consume_symbol(';');
            return Ok(());
        }
        let Some(keyword) = self.advance() else {
            return Ok(());
        };
        let Some(kind) = EntityKind::from_str(keyword.text) else {
            return Ok(());
        };
        let Some(name_tok) = self.name("type name")? else {
            return Ok(());
        };

        let name = name_tok.text;
        let namespace = ann.namespace.or_else(|| scope.namespace.clone());
        let id = qualified_id(namespace.as_deref(), name);
        let entity = SchemaEntity {
            id: id.clone(),
            name: name.to_string(),
            namespace: namespace.clone(),
            doc,
            body: EntityBody::empty(kind),
            is_nested: scope.parent.is_some(),
            parent_schema: scope.parent.clone(),
        };

        let checkpoint = self.builder.checkpoint();
        let slot = self.builder.register(entity);
        match slot {
            Some(_) => {
                if let Some(parent) = &scope.parent {
                    self.builder.relate(Relationship::nested(parent, name, &id));
                }
            }
            None => {
                let range = self.range_of(Some(name_tok));
                self.builder.diagnostic(
                    Diagnostic::warning(format!("Duplicate definition of '{id}' ignored")).with_range(range),
                );
            }
        }

        let inner = Scope::within(namespace, id.clone());
        match kind {
            EntityKind::Record => self.descend(|p| p.parse_record_body(&inner, slot))?,
            EntityKind::Enum => self.parse_enum_body(slot),
            EntityKind::Fixed => self.parse_fixed_size(slot),
        }

        if slot.is_none() {
            self.builder.rollback(checkpoint);
        }
        Ok(())
    }

    fn parse_record_body(&mut self, scope: &Scope, slot: Option<usize>) -> Result<(), ParseError> {
        self.expect('{');
        let source_id = scope.parent.clone().unwrap_or_default();

        while let Some(tok) = self.peek() {
            if tok.is_symbol('}') {
                break;
            }
            let start = self.pos;
            let doc = self.doc();
            let ann = self.parse_annotations();

            match self.peek() {
                Some(tok) if is_declaration(tok) => self.parse_declaration(scope, ann, doc)?,
                Some(tok) if tok.is_symbol('}') => {}
                Some(_) => {
                    if let Some(mut field) = self.parse_field(scope, &source_id, ann)? {
                        field.doc = doc;
                        if let Some(slot) = slot {
                            self.builder.push_field(slot, field);
                        }
                    }
                }
                None => {}
            }

            if self.pos == start {
                self.pos += 1;
            }
        }

        self.expect('}');
        Ok(())
    }

    fn parse_field(
        &mut self,
        scope: &Scope,
        source_id: &str,
        ann: Annotations,
    ) -> Result<Option<Field>, ParseError> {
        let Some(resolved) = self.parse_type(scope)? else {
            return Ok(None);
        };
        let Some(name_tok) = self.name("field name")? else {
            return Ok(None);
        };
        let name = name_tok.text;

        if self.consume_symbol('=') {
            self.skip_default();
        }
        self.expect(';');

        self.builder.link_field(source_id, name, &resolved);
        if let Some(join) = ann.join {
            self.emit_join(source_id, name, join);
        }

        Ok(Some(Field::new(name, resolved.ty)))
    }

    /// Skip a default value up to `;`, stopping early at an unbalanced `}`.
    fn skip_default(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            if depth == 0 && (tok.is_symbol(';') || tok.is_symbol('}')) {
                break;
            }
            if tok.is_symbol('{') || tok.is_symbol('[') {
                depth += 1;
            } else if tok.is_symbol('}') || tok.is_symbol(']') {
                depth = depth.saturating_sub(1);
            }
            self.pos += 1;
        }
    }

    fn emit_join(&mut self, source_id: &str, field: &str, join: JoinSpec) {
        let Some(target) = join.schema else {
            self.builder.diagnostic(
                Diagnostic::warning("@join is missing a schema argument").with_range(join.range),
            );
            return;
        };
        let cardinality = join.cardinality.as_deref().and_then(|c| {
            let parsed = Cardinality::from_str(c);
            if parsed.is_none() {
                self.builder.diagnostic(
                    Diagnostic::warning(format!("Unknown join cardinality '{c}'")).with_range(join.range),
                );
            }
            parsed
        });
        self.builder.relate(Relationship::join(
            source_id,
            field,
            &target,
            join.field.as_deref(),
            cardinality,
        ));
    }

    fn parse_type(&mut self, scope: &Scope) -> Result<Option<ResolvedType>, ParseError> {
        if self.depth >= MAX_DEPTH {
            self.skip_too_deep()?;
            return Ok(Some(ResolvedType::unknown("unknown")));
        }
        self.descend(|p| p.parse_type_at(scope))
    }

    fn parse_type_at(&mut self, scope: &Scope) -> Result<Option<ResolvedType>, ParseError> {
        let tok = self.peek().ok_or(ParseError::UnexpectedEof("type"))?;

        let resolved = if tok.is_word("union") {
            self.pos += 1;
            self.expect('{');
            let mut members = Vec::new();
            while let Some(t) = self.peek() {
                if t.is_symbol('}') {
                    break;
                }
                let start = self.pos;
                if let Some(member) = self.parse_type(scope)? {
                    members.push(member);
                }
                self.consume_symbol(',');
                if self.pos == start {
                    break;
                }
            }
            self.expect('}');
            return Ok(Some(ResolvedType::union(members)));
        } else if tok.is_word("array") || tok.is_word("map") {
            self.pos += 1;
            self.expect('<');
            let inner = self
                .parse_type(scope)?
                .unwrap_or_else(|| ResolvedType::unknown("unknown"));
            self.expect('>');
            if tok.text == "array" { inner.array() } else { inner.map() }
        } else if tok.is_name() {
            self.pos += 1;
            if is_primitive(tok.text) || LOGICAL_TYPES.contains(&tok.text) {
                // decimal(9, 2)
                self.skip_parens();
                ResolvedType::primitive(tok.text)
            } else {
                let target = self.builder.qualify(tok.text, scope.namespace.as_deref());
                ResolvedType::named(&target)
            }
        } else {
            self.report(format!("Expected a type but found '{}'", tok.text), Some(tok));
            return Ok(None);
        };

        if self.consume_symbol('?') {
            return Ok(Some(resolved.nullable()));
        }
        Ok(Some(resolved))
    }

    fn parse_enum_body(&mut self, slot: Option<usize>) {
        self.expect('{');
        let mut symbols = Vec::new();
        while let Some(tok) = self.peek() {
            if tok.is_symbol('}') {
                break;
            }
            if tok.is_name() {
                symbols.push(tok.text.to_string());
            }
            self.pos += 1;
        }
        self.expect('}');

        // enum E { A, B } = A;
        if self.consume_symbol('=') {
            self.skip_default();
            self.consume_symbol(';');
        }

        if let Some(slot) = slot {
            self.builder.set_body(slot, EntityBody::Enum { symbols });
        }
    }

    fn parse_fixed_size(&mut self, slot: Option<usize>) {
        self.expect('(');
        let mut size = None;
        match self.peek() {
            Some(tok) if tok.kind == TokenKind::Num => {
                self.pos += 1;
                size = tok.text.parse::<u64>().ok();
                if size.is_none() {
                    self.report(format!("Invalid fixed size '{}'", tok.text), Some(tok));
                }
            }
            tok => {
                let found = tok.map_or("end of input", |t| t.text);
                self.report(format!("Expected fixed size but found '{found}'"), tok);
            }
        }
        self.expect(')');
        self.consume_symbol(';');

        if let Some(slot) = slot {
            self.builder.set_body(slot, EntityBody::Fixed { size });
        }
    }
}

fn is_declaration(tok: &Token<'_>) -> bool {
    tok.kind == TokenKind::Keyword && matches!(tok.text, "record" | "error" | "enum" | "fixed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{RelationshipKind, Severity};

    const USER_SERVICE: &str = r#"
protocol UserService {

  enum UserStatus {
    ACTIVE, INACTIVE, SUSPENDED
  }

  record Address {
    string street;
    union { null, string } country = null;
  }

  record User {
    long id;
    union { null, Address } address = null;
    UserStatus status;
    array<string> tags;
    map<Address> previous;
  }

  record UserEvent {
    @join(schema="UserService.User", field="id", cardinality="N:1")
    long user_id;
    array<User> related;
  }

  User getUser(long id) throws NotFound;
  void ping();
}
"#;

    #[test]
    fn test_parse_protocol() {
        let graph = parse_idl(USER_SERVICE);
        assert!(graph.diagnostics.is_empty(), "{:?}", graph.diagnostics);
        let ids: Vec<&str> = graph.entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["UserService.UserStatus", "UserService.Address", "UserService.User", "UserService.UserEvent"]
        );
        let status = &graph.entities[0];
        assert_eq!(status.kind(), EntityKind::Enum);
        assert_eq!(status.symbols(), ["ACTIVE", "INACTIVE", "SUSPENDED"]);
        assert_eq!(status.namespace.as_deref(), Some("UserService"));
    }

    #[test]
    fn test_field_types() {
        let graph = parse_idl(USER_SERVICE);
        let user = graph.entity("UserService.User").unwrap();
        assert_eq!(user.fields().len(), 5);

        let address = &user.field("address").unwrap().field_type;
        assert_eq!(address.display, "Address?");
        assert!(address.is_nullable);
        assert!(!address.is_union);
        assert_eq!(address.referenced_schema.as_deref(), Some("UserService.Address"));

        let tags = &user.field("tags").unwrap().field_type;
        assert!(tags.is_array);
        assert_eq!(tags.display, "string[]");

        let previous = &user.field("previous").unwrap().field_type;
        assert_eq!(previous.display, "map<Address>");
        assert!(previous.is_reference);
    }

    #[test]
    fn test_relationships() {
        let graph = parse_idl(USER_SERVICE);
        let from_user: Vec<_> = graph.relationships_from("UserService.User").collect();
        // address + status; the map never draws an edge
        assert_eq!(from_user.len(), 2);
        assert!(from_user.iter().all(|r| r.kind == RelationshipKind::Reference));

        let event: Vec<_> = graph.relationships_from("UserService.UserEvent").collect();
        assert_eq!(event.len(), 2);
        assert_eq!(event[0].kind, RelationshipKind::Join);
        assert_eq!(event[0].target_schema, "UserService.User");
        assert_eq!(event[0].target_field.as_deref(), Some("id"));
        assert_eq!(event[0].cardinality, Some(Cardinality::ManyToOne));
        assert_eq!(event[1].kind, RelationshipKind::Reference);
        assert_eq!(event[1].cardinality, Some(Cardinality::OneToMany));
    }

    #[test]
    fn test_forward_reference_is_qualified() {
        let graph = parse_idl("protocol P { record A { B b; } record B { int x; } }");
        assert_eq!(graph.relationships[0].target_schema, "P.B");
        assert!(graph.diagnostics.is_empty());
    }

    #[test]
    fn test_namespace_annotation_overrides_protocol() {
        let graph = parse_idl(r#"@namespace("com.acme") protocol P { record A { int x; } }"#);
        assert_eq!(graph.entities[0].id, "com.acme.A");
    }

    #[test]
    fn test_namespace_statement_in_body() {
        let input = r#"protocol P {
            record A { int x; }
            @namespace("other");
            record B { A a; }
        }"#;
        let graph = parse_idl(input);
        assert_eq!(graph.entities[1].id, "other.B");
        // bare names qualify against the namespace now in force
        assert_eq!(graph.relationships[0].target_schema, "other.A");
    }

    #[test]
    fn test_declaration_namespace_annotation() {
        let graph = parse_idl(r#"protocol P { @namespace("x") record A { int i; } record B { int j; } }"#);
        assert_eq!(graph.entities[0].id, "x.A");
        assert_eq!(graph.entities[1].id, "P.B");
    }

    #[test]
    fn test_nested_declarations() {
        let input = "record Outer { record Inner { int x; } enum Color { RED } Inner inner; fixed Hash(16); }";
        let graph = parse_idl(input);
        assert_eq!(graph.entities.len(), 4);
        let inner = graph.entity("Inner").unwrap();
        assert!(inner.is_nested);
        assert_eq!(inner.parent_schema.as_deref(), Some("Outer"));
        let nested: Vec<_> = graph
            .relationships
            .iter()
            .filter(|r| r.kind == RelationshipKind::Nested)
            .collect();
        assert_eq!(nested.len(), 3);
        assert_eq!(nested[0].label.as_deref(), Some("contains"));
        assert_eq!(graph.entity("Hash").unwrap().size(), Some(16));
        assert_eq!(graph.entity("Outer").unwrap().fields().len(), 1);
    }

    #[test]
    fn test_error_is_record() {
        let graph = parse_idl("error Boom { string message; }");
        assert_eq!(graph.entities[0].kind(), EntityKind::Record);
    }

    #[test]
    fn test_skips_unknown_annotations() {
        let input = r#"record A { @foo(bar, baz(1)) @order("ignore") string s; }"#;
        let graph = parse_idl(input);
        assert!(graph.diagnostics.is_empty());
        assert_eq!(graph.entities[0].fields()[0].name, "s");
    }

    #[test]
    fn test_missing_semicolon_reports_and_continues() {
        let graph = parse_idl("record A { string a string b; }");
        assert_eq!(graph.entities[0].fields().len(), 2);
        assert_eq!(graph.diagnostics.len(), 1);
        assert!(graph.diagnostics[0].range.is_some());
    }

    #[test]
    fn test_truncated_input_keeps_partial_graph() {
        let graph = parse_idl("record A { string a; string");
        assert_eq!(graph.entities.len(), 1);
        assert_eq!(graph.entities[0].fields().len(), 1);
        assert!(graph.has_errors());
        assert!(graph.diagnostics.iter().any(|d| d.message.starts_with("IDL parse error")));
    }

    #[test]
    fn test_duplicate_definition_first_wins() {
        let graph = parse_idl("record A { int x; } record A { string y; B b; }");
        assert_eq!(graph.entities.len(), 1);
        assert_eq!(graph.entities[0].fields()[0].name, "x");
        assert!(graph.relationships.is_empty());
        assert_eq!(graph.diagnostics.len(), 1);
    }

    #[test]
    fn test_reference_emitted_once() {
        let graph = parse_idl("record A { B b; B b; }");
        assert_eq!(graph.relationships.len(), 1);
    }

    #[test]
    fn test_doc_comments() {
        let input = "/** A person. */\nrecord P {\n  /** Full name. */\n  string name;\n}";
        let graph = parse_idl(input);
        assert_eq!(graph.entities[0].doc.as_deref(), Some("A person."));
        assert_eq!(graph.entities[0].fields()[0].doc.as_deref(), Some("Full name."));
    }

    #[test]
    fn test_logical_types_and_enum_default() {
        let input = "protocol P { enum E { A, B } = A; record R { decimal(9,2) amount; uuid id; date? day; E e; } }";
        let graph = parse_idl(input);
        assert!(graph.diagnostics.is_empty(), "{:?}", graph.diagnostics);
        let r = graph.entity("P.R").unwrap();
        assert_eq!(r.fields()[0].field_type.display, "decimal");
        assert_eq!(r.fields()[2].field_type.display, "date?");
        assert_eq!(graph.relationships[0].target_schema, "P.E");
    }

    #[test]
    fn test_top_level_namespace_statement() {
        let graph = parse_idl("namespace org.demo;\nrecord A { int x; }");
        assert_eq!(graph.entities[0].id, "org.demo.A");
    }

    #[test]
    fn test_union_with_many_members() {
        let graph = parse_idl("record A { union { null, string, B, C } v; }");
        let ty = &graph.entities[0].fields()[0].field_type;
        assert!(ty.is_union);
        assert_eq!(ty.union_types.as_ref().map(Vec::len), Some(4));
        assert_eq!(graph.relationships.len(), 1);
        assert_eq!(graph.relationships[0].target_schema, "B");
    }

    #[test]
    fn test_garbage_never_panics() {
        for input in ["", "}", "{{{", "record", "record {", "enum E {", "fixed F(", "union", "@", "protocol P { record A { union { ; } x; }"] {
            let graph = parse_idl(input);
            let _ = graph.entities.len();
        }
    }

    #[test]
    fn test_deep_nesting_is_cut_off() {
        let depth = 100_000;
        let inputs = [
            format!("record A {{ {}", "array<".repeat(depth)),
            format!("record A {{ {}", "union { ".repeat(depth)),
            format!("record A {{ {}", "record B { ".repeat(depth)),
            "protocol P { ".repeat(depth),
        ];
        for input in &inputs {
            let graph = parse_idl(input);
            let too_deep = graph
                .diagnostics
                .iter()
                .filter(|d| d.message.starts_with("Nesting deeper than"))
                .count();
            assert_eq!(too_deep, 1, "{}", &input[..40]);
            assert!(graph.diagnostics.iter().any(|d| d.message.starts_with("IDL parse error")));
        }
    }

    #[test]
    fn test_closed_deep_type_resumes_after_cutoff() {
        let n = MAX_DEPTH + 50;
        let input = format!("record A {{ {}int{} x; int y; }}", "array<".repeat(n), ">".repeat(n));
        let graph = parse_idl(&input);
        assert_eq!(graph.diagnostics.len(), 1, "{:?}", graph.diagnostics);
        let names: Vec<&str> = graph.entities[0].fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
        assert!(graph.entities[0].fields()[0].field_type.is_array);
    }

    #[test]
    fn test_large_record_parses_in_linear_time() {
        let mut input = String::from("record A {\n");
        for i in 0..5_000 {
            input.push_str(&format!("  int f{i};\n"));
        }
        input.push('}');
        let started = std::time::Instant::now();
        let graph = parse_idl(&input);
        assert_eq!(graph.entities[0].fields().len(), 5_000);
        assert!(started.elapsed() < std::time::Duration::from_secs(2), "{:?}", started.elapsed());

        // one diagnostic per line
        let garbage = "record A {\n".to_string() + &"  x y\n".repeat(10_000) + "}";
        let started = std::time::Instant::now();
        let graph = parse_idl(&garbage);
        assert!(graph.diagnostics.len() >= 10_000);
        assert_eq!(graph.diagnostics.last().and_then(|d| d.range).map(|r| r.start_line), Some(10_002));
        assert!(started.elapsed() < std::time::Duration::from_secs(2), "{:?}", started.elapsed());
    }

    #[test]
    fn test_join_with_unknown_cardinality_warns() {
        let graph = parse_idl(r#"record Order { @join(schema="User", field="id", cardinality="lots") long user_id; }"#);
        assert_eq!(graph.diagnostics.len(), 1);
        assert_eq!(graph.diagnostics[0].severity, Severity::Warning);
        assert_eq!(graph.diagnostics[0].message, "Unknown join cardinality 'lots'");
        assert_eq!(graph.relationships.len(), 1);
        let join = &graph.relationships[0];
        assert_eq!(join.kind, RelationshipKind::Join);
        assert_eq!(join.target_schema, "User");
        assert_eq!(join.target_field.as_deref(), Some("id"));
        assert_eq!(join.cardinality, None);
    }

    #[test]
    fn test_join_without_schema_warns() {
        let graph = parse_idl(r#"record Order { @join(field="id") long user_id; }"#);
        assert_eq!(graph.diagnostics.len(), 1);
        assert_eq!(graph.diagnostics[0].severity, Severity::Warning);
        assert_eq!(graph.diagnostics[0].message, "@join is missing a schema argument");
        assert!(graph.relationships.is_empty());
        assert_eq!(graph.entities[0].fields()[0].name, "user_id");
    }
}
