//! The property type model: primitives, scalar-vs-set property types, and
//! the coerced runtime values held by views and mutations.
//!
//! Every node additionally carries the special properties `node_key`
//! (stable, user-assigned), `uid` (store-assigned), and the store's type
//! tag, which are not declared per-schema.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The closed set of storable primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Primitive {
    Str,
    Int,
    Bool,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Str => write!(f, "Str"),
            Primitive::Int => write!(f, "Int"),
            Primitive::Bool => write!(f, "Bool"),
        }
    }
}

/// A declared property: a primitive plus scalar/set cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyType {
    pub primitive: Primitive,
    /// `true` for an unordered-unique-collection property.
    pub is_set: bool,
}

impl PropertyType {
    pub fn str_prop() -> Self {
        PropertyType {
            primitive: Primitive::Str,
            is_set: false,
        }
    }

    pub fn int_prop() -> Self {
        PropertyType {
            primitive: Primitive::Int,
            is_set: false,
        }
    }

    pub fn bool_prop() -> Self {
        PropertyType {
            primitive: Primitive::Bool,
            is_set: false,
        }
    }

    pub fn str_set() -> Self {
        PropertyType {
            primitive: Primitive::Str,
            is_set: true,
        }
    }

    pub fn int_set() -> Self {
        PropertyType {
            primitive: Primitive::Int,
            is_set: true,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set {
            write!(f, "Set<{}>", self.primitive)
        } else {
            write!(f, "{}", self.primitive)
        }
    }
}

/// A coerced runtime property value.
///
/// Set values are stored as `BTreeSet` so membership is unique and
/// iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Str(String),
    Int(i64),
    Bool(bool),
    StrSet(BTreeSet<String>),
    IntSet(BTreeSet<i64>),
}

impl PropertyValue {
    /// Coerces a raw JSON value into `ty`, per-element for set types.
    ///
    /// Integers arriving as JSON strings are accepted (the store stringifies
    /// large ints); anything else of the wrong shape is an `InvalidValue`.
    pub fn coerce(value: &serde_json::Value, ty: &PropertyType) -> Result<Self, CoreError> {
        if ty.is_set {
            let items = match value {
                serde_json::Value::Array(items) => items.clone(),
                // A scalar row for a set property is a one-element set.
                other => vec![other.clone()],
            };
            match ty.primitive {
                Primitive::Str => {
                    let mut set = BTreeSet::new();
                    for item in &items {
                        set.insert(coerce_str(item, ty)?);
                    }
                    Ok(PropertyValue::StrSet(set))
                }
                Primitive::Int => {
                    let mut set = BTreeSet::new();
                    for item in &items {
                        set.insert(coerce_int(item, ty)?);
                    }
                    Ok(PropertyValue::IntSet(set))
                }
                Primitive::Bool => Err(invalid(ty, value)),
            }
        } else {
            match ty.primitive {
                Primitive::Str => Ok(PropertyValue::Str(coerce_str(value, ty)?)),
                Primitive::Int => Ok(PropertyValue::Int(coerce_int(value, ty)?)),
                Primitive::Bool => match value {
                    serde_json::Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
                    _ => Err(invalid(ty, value)),
                },
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Renders the value back into its JSON wire shape.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::Str(s) => serde_json::Value::String(s.clone()),
            PropertyValue::Int(i) => serde_json::Value::Number((*i).into()),
            PropertyValue::Bool(b) => serde_json::Value::Bool(*b),
            PropertyValue::StrSet(set) => {
                serde_json::Value::Array(set.iter().cloned().map(serde_json::Value::String).collect())
            }
            PropertyValue::IntSet(set) => serde_json::Value::Array(
                set.iter().map(|i| serde_json::Value::Number((*i).into())).collect(),
            ),
        }
    }
}

fn coerce_str(value: &serde_json::Value, ty: &PropertyType) -> Result<String, CoreError> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        _ => Err(invalid(ty, value)),
    }
}

fn coerce_int(value: &serde_json::Value, ty: &PropertyType) -> Result<i64, CoreError> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().ok_or_else(|| invalid(ty, value)),
        serde_json::Value::String(s) => s.parse::<i64>().map_err(|_| invalid(ty, value)),
        _ => Err(invalid(ty, value)),
    }
}

fn invalid(ty: &PropertyType, value: &serde_json::Value) -> CoreError {
    CoreError::InvalidValue {
        property_type: ty.to_string(),
        value: value.to_string(),
    }
}
