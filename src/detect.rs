//! Schema format detection.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Concrete syntax of a schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SchemaFormat {
    /// JSON schema declarations (`.avsc`)
    #[serde(rename = "avro-json")]
    AvroJson,
    /// Protocol/IDL syntax (`.avdl`)
    #[serde(rename = "avro-idl")]
    AvroIdl,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

static JSON_TYPE_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""type"\s*:\s*"(?:record|enum|fixed)""#).expect("valid regex"));

static IDL_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"\bprotocol\s+\w+",
        r"\brecord\s+\w+\s*\{",
        r"\benum\s+\w+\s*\{",
        r"\bfixed\s+\w+\s*\(",
    ]
    .map(|p| Regex::new(p).expect("valid regex"))
});

impl SchemaFormat {
    /// Parse a format name as given on the command line or from JS.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" | "avsc" | "avro-json" => Some(Self::AvroJson),
            "idl" | "avdl" | "avro-idl" => Some(Self::AvroIdl),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AvroJson => "avro-json",
            Self::AvroIdl => "avro-idl",
            Self::Unknown => "unknown",
        }
    }

    /// Detect the format from document content.
    pub fn detect(content: &str) -> Self {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Self::Unknown;
        }

        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) if has_named_type(&value) => return Self::AvroJson,
                Ok(_) => {}
                // let the JSON frontend report the positioned syntax error
                Err(_) if JSON_TYPE_HINT.is_match(trimmed) => return Self::AvroJson,
                Err(_) => {}
            }
        }

        if IDL_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
            return Self::AvroIdl;
        }

        Self::Unknown
    }

    /// Resolve a caller-supplied format, detecting when none is given.
    pub fn resolve(format: Option<Self>, content: &str) -> Self {
        match format {
            Some(Self::Unknown) | None => Self::detect(content),
            Some(other) => other,
        }
    }
}

pub fn detect_format(content: &str) -> SchemaFormat {
    SchemaFormat::detect(content)
}

fn has_named_type(value: &Value) -> bool {
    let is_named = |v: &Value| {
        matches!(
            v.get("type").and_then(Value::as_str),
            Some("record" | "enum" | "fixed")
        )
    };
    match value {
        Value::Array(items) => items.iter().any(is_named),
        other => is_named(other),
    }
}
