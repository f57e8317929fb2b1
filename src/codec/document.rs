//! The backing document: groups of named value nodes plus a version leaf.

use serde_json::{Map, Value};

use super::error::{CodecError, node_type};

/// Reserved top-level key holding the document version.
pub const VERSION_KEY: &str = "version";

/// In-memory form of the backing file.
///
/// Top-level keys are group names (object nodes) in insertion order, plus the
/// reserved [`VERSION_KEY`] leaf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse document text.
    ///
    /// Blank input yields an empty document; the backing file starts out empty
    /// before the first save.
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }

        match serde_json::from_str::<Value>(text)? {
            Value::Object(root) => Ok(Self { root }),
            other => Err(CodecError::InvalidRoot {
                found: node_type(&other),
            }),
        }
    }

    /// Render as pretty-printed JSON.
    pub fn to_pretty_string(&self) -> Result<String, CodecError> {
        let mut text = serde_json::to_string_pretty(&self.root)?;
        text.push('\n');
        Ok(text)
    }

    /// Append a group node. Replaces an existing group of the same name.
    pub fn insert_group(&mut self, name: impl Into<String>, items: Map<String, Value>) {
        self.root.insert(name.into(), Value::Object(items));
    }

    pub fn set_version(&mut self, version: i32) {
        self.root
            .insert(VERSION_KEY.to_string(), Value::String(version.to_string()));
    }

    /// Read the version leaf, if present.
    pub fn version(&self) -> Result<Option<i32>, CodecError> {
        let Some(node) = self.root.get(VERSION_KEY) else {
            return Ok(None);
        };

        let parsed = match node {
            Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
            Value::String(s) => s.trim().parse::<i32>().ok(),
            other => {
                return Err(CodecError::UnexpectedNode {
                    kind: VERSION_KEY,
                    expected: "scalar",
                    found: node_type(other),
                });
            }
        };

        parsed.map(Some).ok_or_else(|| CodecError::InvalidScalar {
            kind: VERSION_KEY,
            text: node.to_string(),
        })
    }

    /// Iterate group nodes in document order, skipping the version leaf.
    pub fn groups(&self) -> impl Iterator<Item = GroupNode<'_>> {
        self.root
            .iter()
            .filter(|(key, _)| key.as_str() != VERSION_KEY)
            .map(|(name, node)| GroupNode { name, node })
    }

    /// Look up a single group node.
    pub fn group(&self, name: &str) -> Option<GroupNode<'_>> {
        if name == VERSION_KEY {
            return None;
        }
        self.root
            .get_key_value(name)
            .map(|(name, node)| GroupNode { name, node })
    }

    pub fn group_count(&self) -> usize {
        self.groups().count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

/// A borrowed top-level group node.
#[derive(Debug, Clone, Copy)]
pub struct GroupNode<'a> {
    name: &'a str,
    node: &'a Value,
}

impl<'a> GroupNode<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Named item nodes in this group.
    ///
    /// A group node that is not an object has no items.
    pub fn items(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.node
            .as_object()
            .into_iter()
            .flat_map(|map| map.iter().map(|(name, node)| (name.as_str(), node)))
    }

    pub fn item(&self, name: &str) -> Option<&'a Value> {
        self.node.as_object().and_then(|map| map.get(name))
    }
}
