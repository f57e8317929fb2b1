//! Error types for document encoding and decoding.

use thiserror::Error;

/// Errors from parsing a document or decoding a node into a value.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Document root must be an object, found {found}")]
    InvalidRoot { found: &'static str },

    #[error("Expected {expected} node for {kind}, found {found}")]
    UnexpectedNode {
        kind: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Missing component '{component}' for {kind}")]
    MissingComponent {
        kind: &'static str,
        component: &'static str,
    },

    #[error("Invalid {kind} scalar '{text}'")]
    InvalidScalar { kind: &'static str, text: String },

    #[error("Decoded {found} where {expected} was expected")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Short name of a JSON node type, used in error messages.
pub(crate) fn node_type(node: &serde_json::Value) -> &'static str {
    match node {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
