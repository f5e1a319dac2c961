pub mod builder;
pub mod detect;
pub mod edit;
pub mod graph;
pub mod idl;
pub mod ir;
pub mod json;
pub mod layout;
pub mod measure;

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use wasm_bindgen::prelude::*;

pub use detect::{SchemaFormat, detect_format};
pub use graph::SchemaGraph;

use ir::LayoutGraph;
use measure::NodeMetrics;

pub const UNKNOWN_FORMAT_MESSAGE: &str = "Could not detect schema format. Expected Avro JSON or Avro IDL.";

/// A parsed graph together with the format it was read as.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub graph: SchemaGraph,
    pub format: SchemaFormat,
}

/// Detect the format of `input` and parse it. Never fails.
pub fn parse_schema(input: &str) -> ParseResult {
    parse_as(input, SchemaFormat::detect(input))
}

/// Parse `input` with a known format.
pub fn parse_as(input: &str, format: SchemaFormat) -> ParseResult {
    let graph = match format {
        SchemaFormat::AvroJson => json::parse_json(input),
        SchemaFormat::AvroIdl => idl::parse_idl(input),
        SchemaFormat::Unknown => SchemaGraph::failed(UNKNOWN_FORMAT_MESSAGE),
    };
    debug!(format = format.as_str(), entities = graph.entities.len(), "parsed schema");
    ParseResult { graph, format }
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

fn format_arg(format: Option<String>, text: &str) -> SchemaFormat {
    SchemaFormat::resolve(format.as_deref().and_then(SchemaFormat::from_str), text)
}

/// Parse schema text to `{graph, format}`
#[wasm_bindgen(js_name = "parseSchema")]
pub fn parse_schema_js(input: &str) -> Result<JsValue, JsValue> {
    to_js(&parse_schema(input))
}

#[wasm_bindgen(js_name = "detectFormat")]
pub fn detect_format_js(input: &str) -> String {
    detect_format(input).as_str().to_string()
}

/// Parse and build layout engine input, collapsing the given entity ids
#[wasm_bindgen(js_name = "layoutInput")]
pub fn layout_input_js(input: &str, collapsed: Vec<String>) -> Result<JsValue, JsValue> {
    let result = parse_schema(input);
    let collapsed: HashSet<String> = collapsed.into_iter().collect();
    to_js(&LayoutGraph::from_graph(&result.graph, &collapsed, &NodeMetrics::default()))
}

#[wasm_bindgen(js_name = "addField")]
pub fn add_field_js(text: &str, format: Option<String>, schema: &str, name: &str, type_name: &str) -> String {
    edit::add_field(text, format_arg(format, text), schema, name, type_name)
}

#[wasm_bindgen(js_name = "removeField")]
pub fn remove_field_js(text: &str, format: Option<String>, schema: &str, name: &str) -> String {
    edit::remove_field(text, format_arg(format, text), schema, name)
}

#[wasm_bindgen(js_name = "renameField")]
pub fn rename_field_js(text: &str, format: Option<String>, schema: &str, old: &str, new: &str) -> String {
    edit::rename_field(text, format_arg(format, text), schema, old, new)
}

#[wasm_bindgen(js_name = "updateFieldType")]
pub fn update_field_type_js(text: &str, format: Option<String>, schema: &str, field: &str, new_type: &str) -> String {
    edit::update_field_type(text, format_arg(format, text), schema, field, new_type)
}

/// `default` is a JSON literal; text that is not valid JSON is taken as a
/// string. `undefined` removes the default.
#[wasm_bindgen(js_name = "updateFieldDefault")]
pub fn update_field_default_js(
    text: &str,
    format: Option<String>,
    schema: &str,
    field: &str,
    default: Option<String>,
) -> String {
    let default = default.map(|d| serde_json::from_str(&d).unwrap_or(Value::String(d)));
    edit::update_field_default(text, format_arg(format, text), schema, field, default)
}

#[wasm_bindgen(js_name = "addSymbol")]
pub fn add_symbol_js(text: &str, format: Option<String>, schema: &str, symbol: &str) -> String {
    edit::add_symbol(text, format_arg(format, text), schema, symbol)
}

#[wasm_bindgen(js_name = "renameSymbol")]
pub fn rename_symbol_js(text: &str, format: Option<String>, schema: &str, old: &str, new: &str) -> String {
    edit::rename_symbol(text, format_arg(format, text), schema, old, new)
}

#[wasm_bindgen(js_name = "uniqueFieldName")]
pub fn unique_field_name_js(existing: Vec<String>) -> String {
    edit::unique_field_name(&existing)
}

#[wasm_bindgen(js_name = "uniqueSymbolName")]
pub fn unique_symbol_name_js(existing: Vec<String>) -> String {
    edit::unique_symbol_name(&existing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schema_dispatch() {
        let json = parse_schema(r#"{"type":"enum","name":"E","symbols":["A"]}"#);
        assert_eq!(json.format, SchemaFormat::AvroJson);
        assert_eq!(json.graph.entities.len(), 1);

        let idl = parse_schema("enum E { A, B }");
        assert_eq!(idl.format, SchemaFormat::AvroIdl);
        assert_eq!(idl.graph.entities[0].symbols().len(), 2);
    }

    #[test]
    fn test_unknown_format() {
        let result = parse_schema("hello");
        assert_eq!(result.format, SchemaFormat::Unknown);
        assert!(result.graph.entities.is_empty());
        assert_eq!(result.graph.diagnostics[0].message, UNKNOWN_FORMAT_MESSAGE);
    }

    #[test]
    fn test_parse_result_serializes() {
        let result = parse_schema(r#"{"type":"record","name":"User","fields":[]}"#);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["format"], "avro-json");
        assert_eq!(json["graph"]["entities"][0]["id"], "User");
        assert!(json["graph"]["relationships"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_format_arg_detects_when_missing() {
        assert_eq!(format_arg(None, "record A {}"), SchemaFormat::AvroIdl);
        assert_eq!(format_arg(Some("json".into()), "record A {}"), SchemaFormat::AvroJson);
        assert_eq!(format_arg(Some("nonsense".into()), "record A {}"), SchemaFormat::AvroIdl);
    }
}
