//! Value types supported by live variables and their node encoding.
//!
//! Scalars are written as text leaves (`"12.5"`, `"true"`). Composites are
//! objects with one text leaf per component, in a fixed order. Decoding is
//! lenient about scalar representation: native JSON numbers and booleans are
//! accepted alongside their text forms, so hand-edited files keep working.

use std::fmt;

use glam::{Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{CodecError, node_type};

/// RGB color with `f32` channels. Alpha is not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Uniform gray with every channel set to `value`.
    pub const fn gray(value: f32) -> Self {
        Self::new(value, value, value)
    }
}

/// Type tag for the values a variable can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Color,
}

impl ValueKind {
    /// Human-readable type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Vec2 => "vec2",
            ValueKind::Vec3 => "vec3",
            ValueKind::Vec4 => "vec4",
            ValueKind::Quat => "quat",
            ValueKind::Color => "color",
        }
    }

    /// Component names written for composite kinds, in document order.
    ///
    /// Empty for scalar kinds.
    pub fn components(&self) -> &'static [&'static str] {
        match self {
            ValueKind::Vec2 => &["x", "y"],
            ValueKind::Vec3 => &["x", "y", "z"],
            ValueKind::Vec4 => &["x", "y", "z", "w"],
            ValueKind::Quat => &["w", "x", "y", "z"],
            ValueKind::Color => &["r", "g", "b"],
            ValueKind::Bool | ValueKind::Int | ValueKind::Float | ValueKind::String => &[],
        }
    }

    pub fn is_composite(&self) -> bool {
        !self.components().is_empty()
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A variable's value, one variant per supported type.
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    Color(Color),
}

impl VarValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            VarValue::Bool(_) => ValueKind::Bool,
            VarValue::Int(_) => ValueKind::Int,
            VarValue::Float(_) => ValueKind::Float,
            VarValue::String(_) => ValueKind::String,
            VarValue::Vec2(_) => ValueKind::Vec2,
            VarValue::Vec3(_) => ValueKind::Vec3,
            VarValue::Vec4(_) => ValueKind::Vec4,
            VarValue::Quat(_) => ValueKind::Quat,
            VarValue::Color(_) => ValueKind::Color,
        }
    }

    /// Encode into a document node.
    pub fn encode(&self) -> Value {
        match self {
            VarValue::Bool(v) => Value::String(v.to_string()),
            VarValue::Int(v) => Value::String(v.to_string()),
            VarValue::Float(v) => Value::String(v.to_string()),
            VarValue::String(v) => Value::String(v.clone()),
            VarValue::Vec2(v) => composite(&[("x", v.x), ("y", v.y)]),
            VarValue::Vec3(v) => composite(&[("x", v.x), ("y", v.y), ("z", v.z)]),
            VarValue::Vec4(v) => composite(&[("x", v.x), ("y", v.y), ("z", v.z), ("w", v.w)]),
            VarValue::Quat(q) => composite(&[("w", q.w), ("x", q.x), ("y", q.y), ("z", q.z)]),
            VarValue::Color(c) => composite(&[("r", c.r), ("g", c.g), ("b", c.b)]),
        }
    }

    /// Decode a node written for `kind`.
    pub fn decode(kind: ValueKind, node: &Value) -> Result<Self, CodecError> {
        let value = match kind {
            ValueKind::Bool => VarValue::Bool(parse_bool(node)?),
            ValueKind::Int => VarValue::Int(parse_int(node)?),
            ValueKind::Float => VarValue::Float(parse_float(node, "float")?),
            ValueKind::String => VarValue::String(parse_string(node)?),
            ValueKind::Vec2 => {
                let [x, y] = components(kind, node)?;
                VarValue::Vec2(Vec2::new(x, y))
            }
            ValueKind::Vec3 => {
                let [x, y, z] = components(kind, node)?;
                VarValue::Vec3(Vec3::new(x, y, z))
            }
            ValueKind::Vec4 => {
                let [x, y, z, w] = components(kind, node)?;
                VarValue::Vec4(Vec4::new(x, y, z, w))
            }
            ValueKind::Quat => {
                let [w, x, y, z] = components(kind, node)?;
                VarValue::Quat(Quat::from_xyzw(x, y, z, w))
            }
            ValueKind::Color => {
                let [r, g, b] = components(kind, node)?;
                VarValue::Color(Color::new(r, g, b))
            }
        };
        Ok(value)
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Bool(v) => write!(f, "{v}"),
            VarValue::Int(v) => write!(f, "{v}"),
            VarValue::Float(v) => write!(f, "{v}"),
            VarValue::String(v) => write!(f, "{v:?}"),
            VarValue::Vec2(v) => write!(f, "({}, {})", v.x, v.y),
            VarValue::Vec3(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            VarValue::Vec4(v) => write!(f, "({}, {}, {}, {})", v.x, v.y, v.z, v.w),
            VarValue::Quat(q) => write!(f, "quat(w: {}, x: {}, y: {}, z: {})", q.w, q.x, q.y, q.z),
            VarValue::Color(c) => write!(f, "rgb({}, {}, {})", c.r, c.g, c.b),
        }
    }
}

fn composite(fields: &[(&str, f32)]) -> Value {
    let mut map = Map::with_capacity(fields.len());
    for (name, value) in fields {
        map.insert((*name).to_string(), Value::String(value.to_string()));
    }
    Value::Object(map)
}

/// Read the `N` components of a composite node in `kind.components()` order.
fn components<const N: usize>(kind: ValueKind, node: &Value) -> Result<[f32; N], CodecError> {
    let Value::Object(map) = node else {
        return Err(CodecError::UnexpectedNode {
            kind: kind.type_name(),
            expected: "object",
            found: node_type(node),
        });
    };

    let names = kind.components();
    debug_assert_eq!(names.len(), N);

    let mut out = [0.0; N];
    for (slot, &name) in out.iter_mut().zip(names) {
        let leaf = map.get(name).ok_or(CodecError::MissingComponent {
            kind: kind.type_name(),
            component: name,
        })?;
        *slot = parse_float(leaf, kind.type_name())?;
    }
    Ok(out)
}

fn parse_float(node: &Value, kind: &'static str) -> Result<f32, CodecError> {
    match node {
        Value::Number(n) => n
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| invalid(kind, n.to_string())),
        Value::String(s) => s.trim().parse::<f32>().map_err(|_| invalid(kind, s.clone())),
        other => Err(unexpected_scalar(kind, other)),
    }
}

fn parse_int(node: &Value) -> Result<i32, CodecError> {
    match node {
        Value::Number(n) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| invalid("int", n.to_string())),
        Value::String(s) => s.trim().parse::<i32>().map_err(|_| invalid("int", s.clone())),
        other => Err(unexpected_scalar("int", other)),
    }
}

fn parse_bool(node: &Value) -> Result<bool, CodecError> {
    match node {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(invalid("bool", n.to_string())),
        },
        Value::String(s) => match s.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(invalid("bool", s.clone())),
        },
        other => Err(unexpected_scalar("bool", other)),
    }
}

fn parse_string(node: &Value) -> Result<String, CodecError> {
    match node {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(unexpected_scalar("string", other)),
    }
}

fn invalid(kind: &'static str, text: String) -> CodecError {
    CodecError::InvalidScalar { kind, text }
}

fn unexpected_scalar(kind: &'static str, node: &Value) -> CodecError {
    CodecError::UnexpectedNode {
        kind,
        expected: "scalar",
        found: node_type(node),
    }
}
