//! Property values and their lowering into the wire data model.

use crate::error::{Error, Result};
use crate::intrinsic::{Intrinsic, Pseudo, Sub};
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

/// What a collected reference has to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `Ref` or a plain `Sub` placeholder: a resource, parameter or pseudo parameter.
    Any,
    /// `GetAtt`, `DependsOn` or a `${Name.Attribute}` placeholder.
    Resource,
    /// The table name of `FindInMap`.
    Mapping,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKind::Any => write!(f, "name"),
            ReferenceKind::Resource => write!(f, "resource"),
            ReferenceKind::Mapping => write!(f, "mapping"),
        }
    }
}

/// A property value attached to a resource, parameter default or output.
///
/// Numbers are held numerically and stringified when rendered, matching the
/// platform's convention of carrying ports and counts as strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Record(IndexMap<String, Value>),
    /// Pointer to another entity's logical name, or to a pseudo parameter.
    Ref(String),
    Intrinsic(Intrinsic),
    /// Opaque payload; only renderable directly under `Fn::Base64`.
    Bytes(Vec<u8>),
}

impl Value {
    /// Builds a reference to the given logical name.
    pub fn reference<S: Into<String>>(target: S) -> Self {
        Value::Ref(target.into())
    }

    /// Builds a nested record from `(key, value)` pairs, keeping their order.
    pub fn record<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Record(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Builds an ordered list.
    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Lowers the value into JSON data.
    ///
    /// # Arguments
    /// * `path` - Dotted location of the value, used in error messages
    ///
    /// # Errors
    /// * `Error::UnsupportedValue` for non-finite floats and for raw bytes
    ///   that are not wrapped in `Fn::Base64`
    pub fn to_json(&self, path: &str) -> Result<Json> {
        match self {
            Value::String(s) => Ok(Json::String(s.clone())),
            Value::Integer(i) => Ok(Json::String(i.to_string())),
            Value::Float(f) if f.is_finite() => Ok(Json::String(f.to_string())),
            Value::Float(f) => Err(Error::UnsupportedValue {
                path: path.to_string(),
                reason: format!("non-finite number {f}"),
            }),
            Value::Bool(b) => Ok(Json::Bool(*b)),
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| item.to_json(&format!("{path}[{i}]")))
                .collect::<Result<Vec<_>>>()
                .map(Json::Array),
            Value::Record(fields) => record_to_json(fields, path).map(Json::Object),
            Value::Ref(target) => {
                let mut obj = Map::new();
                obj.insert("Ref".to_string(), Json::String(target.clone()));
                Ok(Json::Object(obj))
            }
            Value::Intrinsic(function) => function.to_json(path),
            Value::Bytes(_) => Err(Error::UnsupportedValue {
                path: path.to_string(),
                reason: "raw bytes must be wrapped in Fn::Base64".to_string(),
            }),
        }
    }

    /// Converts JSON data, as found in a stack file, back into a value.
    ///
    /// Single-key objects named `Ref` or `Fn::*` become references and
    /// intrinsic functions; every other object becomes a nested record.
    ///
    /// # Errors
    /// * `Error::UnsupportedValue` for `null` and malformed intrinsics
    pub fn from_json(json: &Json, path: &str) -> Result<Self> {
        match json {
            Json::Null => Err(Error::UnsupportedValue {
                path: path.to_string(),
                reason: "null is not a valid property value".to_string(),
            }),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Value::Integer(i));
                }
                // Past i64, kept as its digits; numbers render as strings anyway.
                if let Some(u) = n.as_u64() {
                    return Ok(Value::String(u.to_string()));
                }
                n.as_f64().map(Value::Float).ok_or_else(|| Error::UnsupportedValue {
                    path: path.to_string(),
                    reason: format!("number {n} is out of range"),
                })
            }
            Json::String(s) => Ok(Value::String(s.clone())),
            Json::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| Value::from_json(item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Json::Object(obj) => {
                if obj.len() == 1 {
                    if let Some((key, inner)) = obj.iter().next() {
                        if key == "Ref" {
                            return match inner.as_str() {
                                Some(target) => Ok(Value::Ref(target.to_string())),
                                None => Err(Error::UnsupportedValue {
                                    path: path.to_string(),
                                    reason: "Ref expects a logical name".to_string(),
                                }),
                            };
                        }
                        if key.starts_with("Fn::") {
                            return Intrinsic::from_json(key, inner, path).map(Value::Intrinsic);
                        }
                    }
                }
                obj.iter()
                    .map(|(k, v)| Ok((k.clone(), Value::from_json(v, &format!("{path}.{k}"))?)))
                    .collect::<Result<IndexMap<_, _>>>()
                    .map(Value::Record)
            }
        }
    }

    /// Collects every logical name this value points at, with the kind of
    /// entity it has to name.
    pub fn collect_references(&self, out: &mut Vec<(ReferenceKind, String)>) {
        match self {
            Value::Ref(target) => out.push((ReferenceKind::Any, target.clone())),
            Value::List(items) => items.iter().for_each(|item| item.collect_references(out)),
            Value::Record(fields) => fields.values().for_each(|v| v.collect_references(out)),
            Value::Intrinsic(function) => function.collect_references(out),
            _ => {}
        }
    }
}

/// Lowers an ordered record, extending `path` with each key.
pub(crate) fn record_to_json(fields: &IndexMap<String, Value>, path: &str) -> Result<Map<String, Json>> {
    let mut obj = Map::new();
    for (key, value) in fields {
        obj.insert(key.clone(), value.to_json(&format!("{path}.{key}"))?);
    }
    Ok(obj)
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self {
        Value::Integer(i.into())
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(fields: IndexMap<String, Value>) -> Self {
        Value::Record(fields)
    }
}

impl From<Intrinsic> for Value {
    fn from(function: Intrinsic) -> Self {
        Value::Intrinsic(function)
    }
}

impl From<Sub> for Value {
    fn from(sub: Sub) -> Self {
        Value::Intrinsic(Intrinsic::Sub(sub))
    }
}

impl From<Pseudo> for Value {
    fn from(pseudo: Pseudo) -> Self {
        Value::Ref(pseudo.name().to_string())
    }
}
