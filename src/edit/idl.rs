//! IDL back end: scoped text patches that leave everything outside the edited
//! region byte-for-byte intact.
//!
//! The declaration header is found with a keyword+name regex, its body with
//! brace matching over the token stream. Every candidate match must start on a
//! real code token, so text inside comments and string literals is never
//! touched.

use std::collections::HashMap;
use std::ops::Range;

use regex::Regex;
use serde_json::Value;
use tracing::trace;

use super::{EditError, EditOp, EditOptions, SchemaEditor};
use crate::graph::simple_name;
use crate::idl::{Lexer, Token, TokenKind, matching_brace};

#[derive(Debug, Clone)]
pub struct IdlEditor {
    indent_unit: String,
}

impl IdlEditor {
    pub fn new(options: &EditOptions) -> Self {
        Self {
            indent_unit: options.indent_unit.clone(),
        }
    }
}

impl Default for IdlEditor {
    fn default() -> Self {
        Self::new(&EditOptions::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decl {
    Record,
    Enum,
}

/// A located declaration: keyword offset plus the token indices of its braces.
#[derive(Debug, Clone, Copy)]
struct Body {
    header: usize,
    open: usize,
    close: usize,
}

/// A field statement inside a record body, as token indices.
#[derive(Debug, Clone, Copy)]
struct Statement {
    start: usize,
    name: usize,
    end: usize,
}

#[derive(Debug)]
struct Splice {
    range: Range<usize>,
    text: String,
}

impl Splice {
    fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: at..at,
            text: text.into(),
        }
    }

    fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

fn regex(pattern: &str) -> Result<Regex, EditError> {
    Regex::new(pattern).map_err(|e| EditError::PatternMismatch(e.to_string()))
}

/// Source text together with its tokens.
struct Source<'a> {
    text: &'a str,
    tokens: Vec<Token<'a>>,
    schema: &'a str,
}

impl<'a> Source<'a> {
    fn new(text: &'a str, schema: &'a str) -> Self {
        Self {
            text,
            tokens: Lexer::new(text).tokenize().tokens,
            schema,
        }
    }

    fn token_at(&self, offset: usize) -> Option<usize> {
        self.tokens.binary_search_by_key(&offset, |t| t.offset).ok()
    }

    fn is_code_at(&self, offset: usize) -> bool {
        self.token_at(offset)
            .is_some_and(|i| self.tokens[i].kind != TokenKind::Str)
    }

    fn field_missing(&self, field: &str) -> EditError {
        EditError::FieldNotFound {
            schema: self.schema.to_string(),
            field: field.to_string(),
        }
    }

    fn locate(&self, decl: Decl) -> Result<Body, EditError> {
        let name = regex::escape(simple_name(self.schema));
        let keywords = match decl {
            Decl::Record => "(?:record|error)",
            Decl::Enum => "enum",
        };
        let header = regex(&format!(r"\b{keywords}\s+(?:{name}|`{name}`)\s*\{{"))?;

        for m in header.find_iter(self.text) {
            let on_keyword = self
                .token_at(m.start())
                .is_some_and(|i| self.tokens[i].kind == TokenKind::Keyword);
            let Some(open) = self.token_at(m.end() - 1).filter(|_| on_keyword) else {
                continue;
            };
            let close = matching_brace(&self.tokens, open)
                .ok_or_else(|| EditError::PatternMismatch(format!("'{}' has no closing brace", self.schema)))?;
            trace!(schema = self.schema, offset = m.start(), "located declaration");
            return Ok(Body {
                header: m.start(),
                open,
                close,
            });
        }
        Err(EditError::SchemaNotFound(self.schema.to_string()))
    }

    /// Indices of tokens directly inside `body`, outside any nested braces.
    fn top_level(&self, body: Body) -> Vec<usize> {
        let mut depth = 0usize;
        let mut out = Vec::new();
        for i in body.open + 1..body.close {
            let tok = &self.tokens[i];
            if tok.is_symbol('{') {
                depth += 1;
            } else if tok.is_symbol('}') {
                depth = depth.saturating_sub(1);
            } else if depth == 0 {
                out.push(i);
            }
        }
        out
    }

    /// Field-name tokens: a top-level name directly followed by `;` or `=`.
    fn field_names(&self, body: Body, field: &str) -> Vec<usize> {
        self.top_level(body)
            .into_iter()
            .filter(|&i| {
                let tok = &self.tokens[i];
                tok.is_name()
                    && tok.text == field
                    && self
                        .tokens
                        .get(i + 1)
                        .is_some_and(|next| next.is_symbol(';') || next.is_symbol('='))
            })
            .collect()
    }

    fn statement(&self, body: Body, field: &str) -> Result<Statement, EditError> {
        let name = *self
            .field_names(body, field)
            .first()
            .ok_or_else(|| self.field_missing(field))?;

        let mut depth = 0usize;
        let end = (name + 1..body.close)
            .find(|&i| {
                let tok = &self.tokens[i];
                if tok.is_symbol('{') || tok.is_symbol('[') {
                    depth += 1;
                } else if tok.is_symbol('}') || tok.is_symbol(']') {
                    depth = depth.saturating_sub(1);
                }
                depth == 0 && tok.is_symbol(';')
            })
            .ok_or_else(|| EditError::PatternMismatch(format!("field '{field}' is not terminated")))?;

        // walk back to the previous statement boundary, stepping over union braces
        let pairs = brace_pairs(&self.tokens);
        let mut start = name;
        while start > body.open + 1 {
            let prev = start - 1;
            let tok = &self.tokens[prev];
            if tok.is_symbol(';') || tok.is_symbol('{') {
                break;
            }
            if tok.is_symbol('}') {
                match pairs.get(&prev) {
                    Some(&open) if open > 0 && self.tokens[open - 1].is_word("union") => {
                        start = open - 1;
                        continue;
                    }
                    _ => break,
                }
            }
            start = prev;
        }

        Ok(Statement { start, name, end })
    }

    fn line_start(&self, offset: usize) -> usize {
        self.text[..offset].rfind('\n').map_or(0, |i| i + 1)
    }

    fn indent_of(&self, offset: usize) -> &'a str {
        let text = self.text;
        let start = self.line_start(offset);
        let line = &text[start..];
        &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
    }

    /// Append an item (`string name;` or a symbol) at the end of a body.
    fn append(&self, body: Body, item: &str, indent_unit: &str, comma: bool) -> Vec<Splice> {
        let open = &self.tokens[body.open];
        let close = &self.tokens[body.close];
        let inner_indent = format!("{}{indent_unit}", self.indent_of(body.header));

        if body.close == body.open + 1 {
            let inner = &self.text[open.end..close.offset];
            if inner.contains('\n') {
                return vec![Splice::insert(open.end, format!("\n{inner_indent}{item}"))];
            }
            return vec![Splice::replace(open.end..close.offset, format!(" {item} "))];
        }

        let last = &self.tokens[body.close - 1];
        let needs_comma = comma && !last.is_symbol(',');
        let gap = &self.text[last.end..close.offset];

        match gap.find('\n') {
            Some(nl) => {
                let eol = if gap[..nl].ends_with('\r') { "\r\n" } else { "\n" };
                let line_end = last.end + nl + 1 - eol.len();
                let indent = if self.line_start(last.offset) <= open.offset {
                    inner_indent
                } else {
                    self.indent_of(last.offset).to_string()
                };
                let mut splices = Vec::new();
                if needs_comma {
                    splices.push(Splice::insert(last.end, ","));
                }
                splices.push(Splice::insert(line_end, format!("{eol}{indent}{item}")));
                splices
            }
            None => {
                let sep = if needs_comma { ", " } else { " " };
                vec![Splice::insert(last.end, format!("{sep}{item}"))]
            }
        }
    }

    /// Remove a statement with its doc comment, taking whole lines when nothing
    /// else is on them.
    fn remove(&self, stmt: Statement) -> Splice {
        let first = &self.tokens[stmt.start];
        let start = first.doc_offset.unwrap_or(first.offset);
        let end = self.tokens[stmt.end].end;
        let line_start = self.line_start(start);
        let line_end = self.text[end..].find('\n').map_or(self.text.len(), |i| end + i);

        if self.text[line_start..start].trim().is_empty() && self.text[end..line_end].trim().is_empty() {
            let line_end = (line_end + 1).min(self.text.len());
            return Splice::replace(line_start..line_end, "");
        }
        let rest = &self.text[end..];
        let trailing = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        Splice::replace(start..end + trailing, "")
    }

    fn update_type(&self, body: Body, field: &str, new_type: &str) -> Result<Splice, EditError> {
        let stmt = self.statement(body, field)?;
        let from = self.tokens[stmt.start].offset;
        let to = self.tokens[stmt.end].end;
        let region = &self.text[from..to];

        let name = format!(r"(?:`{0}`|\b{0}\b)", regex::escape(field));
        let ty = r"[A-Za-z_][\w.]*(?:\s*<[^;{}]*>|\s*\([^;{}()]*\))?";
        let patterns = [
            format!(r"union\s*\{{\s*null\s*,\s*({ty})\s*\}}\s*{name}\s*[=;]"),
            format!(r"({ty})\?\s*{name}\s*[=;]"),
            format!(r"\b({ty})\s+{name}\s*[=;]"),
        ];

        for pattern in &patterns {
            let re = regex(pattern)?;
            let hit = re
                .captures_iter(region)
                .filter_map(|c| c.get(1))
                .map(|g| from + g.start()..from + g.end())
                .find(|range| self.is_code_at(range.start));
            if let Some(range) = hit {
                return Ok(Splice::replace(range, new_type));
            }
        }
        Err(EditError::PatternMismatch(format!("type of '{field}' not recognized")))
    }

    fn update_default(&self, body: Body, field: &str, default: Option<&Value>) -> Result<Splice, EditError> {
        let stmt = self.statement(body, field)?;
        let name = &self.tokens[stmt.name];
        let end = self.tokens[stmt.end].end;
        let written = &self.text[name.offset..name.end];
        let text = match default {
            Some(value) => format!("{written} = {};", render_default(value)),
            None => format!("{written};"),
        };
        Ok(Splice::replace(name.offset..end, text))
    }

    fn rename_field(&self, body: Body, old: &str, new: &str) -> Result<Vec<Splice>, EditError> {
        let names = self.field_names(body, old);
        let splices = self.word_matches(body, old, &names, new)?;
        if splices.is_empty() {
            return Err(self.field_missing(old));
        }
        Ok(splices)
    }

    fn rename_symbol(&self, body: Body, old: &str, new: &str) -> Result<Vec<Splice>, EditError> {
        let symbols: Vec<usize> = self
            .top_level(body)
            .into_iter()
            .filter(|&i| self.tokens[i].is_name() && self.tokens[i].text == old)
            .collect();
        let mut splices = self.word_matches(body, old, &symbols, new)?;
        if splices.is_empty() {
            return Err(EditError::SymbolNotFound {
                schema: self.schema.to_string(),
                symbol: old.to_string(),
            });
        }

        // enum E { A, B } = A;
        let default = self.tokens.get(body.close + 2).filter(|t| {
            self.tokens[body.close + 1].is_symbol('=') && t.is_name() && t.text == old
        });
        if let Some(tok) = default {
            splices.push(self.renamed(tok.offset..tok.end, new));
        }
        Ok(splices)
    }

    /// Word-boundary matches of `word` in the body that land exactly on one of
    /// the `allowed` tokens.
    fn word_matches(&self, body: Body, word: &str, allowed: &[usize], new: &str) -> Result<Vec<Splice>, EditError> {
        let from = self.tokens[body.open].end;
        let to = self.tokens[body.close].offset;
        let re = regex(&format!(r"`{0}`|\b{0}\b", regex::escape(word)))?;
        Ok(re
            .find_iter(&self.text[from..to])
            .map(|m| from + m.start()..from + m.end())
            .filter(|range| {
                self.token_at(range.start)
                    .is_some_and(|i| allowed.contains(&i) && self.tokens[i].end == range.end)
            })
            .map(|range| self.renamed(range, new))
            .collect())
    }

    /// Replace the name at `range`, keeping backtick quoting.
    fn renamed(&self, range: Range<usize>, new: &str) -> Splice {
        if self.text[range.clone()].starts_with('`') {
            Splice::replace(range, format!("`{new}`"))
        } else {
            Splice::replace(range, new)
        }
    }
}

impl SchemaEditor for IdlEditor {
    fn apply(&self, text: &str, op: &EditOp) -> Result<String, EditError> {
        let source = Source::new(text, op.schema());

        let splices = match op {
            EditOp::AddField { name, type_name, .. } => {
                let body = source.locate(Decl::Record)?;
                source.append(body, &format!("{type_name} {name};"), &self.indent_unit, false)
            }
            EditOp::RemoveField { name, .. } => {
                let body = source.locate(Decl::Record)?;
                vec![source.remove(source.statement(body, name)?)]
            }
            EditOp::RenameField { old, new, .. } => {
                let body = source.locate(Decl::Record)?;
                source.rename_field(body, old, new)?
            }
            EditOp::UpdateFieldType { field, new_type, .. } => {
                let body = source.locate(Decl::Record)?;
                vec![source.update_type(body, field, new_type)?]
            }
            EditOp::UpdateFieldDefault { field, default, .. } => {
                let body = source.locate(Decl::Record)?;
                vec![source.update_default(body, field, default.as_ref())?]
            }
            EditOp::AddSymbol { symbol, .. } => {
                let body = source.locate(Decl::Enum)?;
                source.append(body, symbol, &self.indent_unit, true)
            }
            EditOp::RenameSymbol { old, new, .. } => {
                let body = source.locate(Decl::Enum)?;
                source.rename_symbol(body, old, new)?
            }
        };

        Ok(splice(text, splices))
    }
}

/// IDL literal for a default value. Arrays and objects become empty
/// placeholders.
fn render_default(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) => "[]".to_string(),
        Value::Object(_) => "{}".to_string(),
        Value::String(s) => Value::String(s.clone()).to_string(),
    }
}

/// Map from each `}` token index to its `{`.
fn brace_pairs(tokens: &[Token<'_>]) -> HashMap<usize, usize> {
    let mut stack = Vec::new();
    let mut pairs = HashMap::new();
    for (i, tok) in tokens.iter().enumerate() {
        if tok.is_symbol('{') {
            stack.push(i);
        } else if tok.is_symbol('}') {
            if let Some(open) = stack.pop() {
                pairs.insert(i, open);
            }
        }
    }
    pairs
}

fn splice(text: &str, mut splices: Vec<Splice>) -> String {
    splices.sort_by_key(|s| s.range.start);
    let mut out = String::with_capacity(text.len() + 64);
    let mut cursor = 0;
    for s in splices {
        if s.range.start < cursor {
            continue;
        }
        out.push_str(&text[cursor..s.range.start]);
        out.push_str(&s.text);
        cursor = s.range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(text: &str, op: EditOp) -> Result<String, EditError> {
        IdlEditor::default().apply(text, &op)
    }

    fn rename(schema: &str, old: &str, new: &str) -> EditOp {
        EditOp::RenameField {
            schema: schema.into(),
            old: old.into(),
            new: new.into(),
        }
    }

    fn add(schema: &str, name: &str, ty: &str) -> EditOp {
        EditOp::AddField {
            schema: schema.into(),
            name: name.into(),
            type_name: ty.into(),
        }
    }

    const SHOP: &str = "protocol Shop {
  /* record Order { is a comment } */
  record Order {
    // the id
    long id;
    union { null, string } note = null;
    Address? ship_to;
    array<Line> lines;
  }

  enum Status {
    NEW, PAID
  } = NEW;
}
";

    #[test]
    fn test_rename_in_body() {
        let out = apply("record Foo { string a; }", rename("Foo", "a", "b")).unwrap();
        assert_eq!(out, "record Foo { string b; }");
    }

    #[test]
    fn test_rename_missing_field() {
        assert!(matches!(
            apply("record Foo { string a; }", rename("Foo", "z", "b")),
            Err(EditError::FieldNotFound { .. })
        ));
        assert!(matches!(
            apply("record Foo { string a; }", rename("Bar", "a", "b")),
            Err(EditError::SchemaNotFound(_))
        ));
    }

    #[test]
    fn test_rename_leaves_other_records_and_strings() {
        let text = r#"record A { string id; }
record B { @join(field="id") long id; }"#;
        let out = apply(text, rename("B", "id", "key")).unwrap();
        assert_eq!(
            out,
            r#"record A { string id; }
record B { @join(field="id") long key; }"#
        );
    }

    #[test]
    fn test_header_inside_comment_is_skipped() {
        let out = apply(SHOP, add("Order", "total", "double")).unwrap();
        assert!(out.contains("/* record Order { is a comment } */"));
        assert!(out.contains("    array<Line> lines;\n    double total;\n  }"));
    }

    #[test]
    fn test_qualified_schema_name() {
        let out = apply(SHOP, rename("Shop.Order", "id", "order_id")).unwrap();
        assert!(out.contains("    long order_id;\n"));
        assert!(out.contains("// the id"));
    }

    #[test]
    fn test_add_field_single_line_and_empty() {
        assert_eq!(
            apply("record A { int x; }", add("A", "y", "long")).unwrap(),
            "record A { int x; long y; }"
        );
        assert_eq!(apply("record A {}", add("A", "y", "long")).unwrap(), "record A { long y; }");
        assert_eq!(
            apply("  record A {\n  }", add("A", "y", "long")).unwrap(),
            "  record A {\n    long y;\n  }"
        );
    }

    #[test]
    fn test_add_field_after_nested_record() {
        let text = "record A {\n  record B {\n    int x;\n  }\n}";
        let out = apply(text, add("A", "b", "B")).unwrap();
        assert_eq!(out, "record A {\n  record B {\n    int x;\n  }\n  B b;\n}");
    }

    #[test]
    fn test_add_field_keeps_crlf() {
        let text = "record A {\r\n  int x;\r\n}";
        let out = apply(text, add("A", "y", "int")).unwrap();
        assert_eq!(out, "record A {\r\n  int x;\r\n  int y;\r\n}");
    }

    #[test]
    fn test_add_symbol() {
        let out = apply(
            SHOP,
            EditOp::AddSymbol {
                schema: "Status".into(),
                symbol: "SHIPPED".into(),
            },
        )
        .unwrap();
        assert!(out.contains("    NEW, PAID,\n    SHIPPED\n  } = NEW;"));

        let out = apply(
            "enum E { A, }",
            EditOp::AddSymbol {
                schema: "E".into(),
                symbol: "B".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "enum E { A, B }");

        let out = apply(
            "enum E { A }",
            EditOp::AddSymbol {
                schema: "E".into(),
                symbol: "B".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "enum E { A, B }");
    }

    #[test]
    fn test_rename_symbol_updates_default() {
        let out = apply(
            SHOP,
            EditOp::RenameSymbol {
                schema: "Status".into(),
                old: "NEW".into(),
                new: "CREATED".into(),
            },
        )
        .unwrap();
        assert!(out.contains("    CREATED, PAID\n  } = CREATED;"));
    }

    #[test]
    fn test_remove_field_whole_line() {
        let out = apply(
            SHOP,
            EditOp::RemoveField {
                schema: "Order".into(),
                name: "note".into(),
            },
        )
        .unwrap();
        assert!(out.contains("    long id;\n    Address? ship_to;\n"));
    }

    #[test]
    fn test_remove_field_inline_with_annotation() {
        let out = apply(
            r#"record A { int x; @join(schema="B") long b_id; int y; }"#,
            EditOp::RemoveField {
                schema: "A".into(),
                name: "b_id".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "record A { int x; int y; }");
    }

    #[test]
    fn test_update_default() {
        let op = |default| EditOp::UpdateFieldDefault {
            schema: "Order".into(),
            field: "note".into(),
            default,
        };
        let out = apply(SHOP, op(Some(json!("n/a")))).unwrap();
        assert!(out.contains(r#"union { null, string } note = "n/a";"#));
        let out = apply(&out, op(None)).unwrap();
        assert!(out.contains("union { null, string } note;"));
        let out = apply(&out, op(Some(json!([1, 2])))).unwrap();
        assert!(out.contains("note = [];"));
    }

    #[test]
    fn test_update_type_patterns() {
        let op = |field: &str, new_type: &str| EditOp::UpdateFieldType {
            schema: "Order".into(),
            field: field.into(),
            new_type: new_type.into(),
        };
        let out = apply(SHOP, op("note", "bytes")).unwrap();
        assert!(out.contains("union { null, bytes } note = null;"));
        let out = apply(SHOP, op("ship_to", "Location")).unwrap();
        assert!(out.contains("Location? ship_to;"));
        let out = apply(SHOP, op("id", "string")).unwrap();
        assert!(out.contains("    string id;"));
        let out = apply(SHOP, op("lines", "array<Item>")).unwrap();
        assert!(out.contains("    array<Item> lines;"));
    }

    #[test]
    fn test_remove_field_takes_doc_comment() {
        let text = "record A {\n  /** id of the user */\n  string a;\n  int b;\n}\n";
        let out = apply(
            text,
            EditOp::RemoveField {
                schema: "A".into(),
                name: "a".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "record A {\n  int b;\n}\n");

        let graph = crate::idl::parse_idl(&out);
        assert_eq!(graph.entities[0].fields()[0].doc, None);
    }

    #[test]
    fn test_remove_inline_field_takes_doc_comment() {
        let out = apply(
            "record A { int x; /** b */ long b; int y; }",
            EditOp::RemoveField {
                schema: "A".into(),
                name: "b".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "record A { int x; int y; }");
    }

    #[test]
    fn test_backtick_quoted_names() {
        let text = "record `Order` {\n  string `error`;\n  int n = 1;\n}\n";
        let out = apply(text, add("Order", "total", "long")).unwrap();
        assert_eq!(out, "record `Order` {\n  string `error`;\n  int n = 1;\n  long total;\n}\n");

        let out = apply(text, rename("Order", "error", "failure")).unwrap();
        assert!(out.contains("  string `failure`;\n"));

        let out = apply(
            text,
            EditOp::UpdateFieldType {
                schema: "Order".into(),
                field: "error".into(),
                new_type: "bytes".into(),
            },
        )
        .unwrap();
        assert!(out.contains("  bytes `error`;\n"));

        let out = apply(
            text,
            EditOp::UpdateFieldDefault {
                schema: "Order".into(),
                field: "error".into(),
                default: Some(json!("none")),
            },
        )
        .unwrap();
        assert!(out.contains(r#"  string `error` = "none";"#));

        let out = apply(
            "enum `Kind` { `A`, B } = `A`;",
            EditOp::RenameSymbol {
                schema: "Kind".into(),
                old: "A".into(),
                new: "C".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "enum `Kind` { `C`, B } = `C`;");
    }

    #[test]
    fn test_update_parameterized_type() {
        let op = |field: &str, new_type: &str| EditOp::UpdateFieldType {
            schema: "P".into(),
            field: field.into(),
            new_type: new_type.into(),
        };
        let text = "record P {\n  decimal(9,2) amount;\n  decimal(4, 1)? rate;\n}";
        let out = apply(text, op("amount", "double")).unwrap();
        assert!(out.contains("  double amount;\n"));
        let out = apply(text, op("rate", "decimal(6,2)")).unwrap();
        assert!(out.contains("  decimal(6,2)? rate;\n"));
    }

    #[test]
    fn test_unterminated_body_is_mismatch() {
        assert!(matches!(
            apply("record A { int x;", add("A", "y", "int")),
            Err(EditError::PatternMismatch(_))
        ));
    }

    #[test]
    fn test_render_default() {
        assert_eq!(render_default(&json!(null)), "null");
        assert_eq!(render_default(&json!(false)), "false");
        assert_eq!(render_default(&json!(1.5)), "1.5");
        assert_eq!(render_default(&json!({"a": 1})), "{}");
        assert_eq!(render_default(&json!("say \"hi\"")), r#""say \"hi\"""#);
    }
}
