//! Values held by the stores.
//!
//! [`DynamicValue`] is the closed set of shapes the persistent store knows how
//! to round-trip. Every variant maps to exactly one [`TypeTag`].

use core::fmt;

use serde_json::{Map, Number, Value};

use crate::tag::TypeTag;

/// A scalar that can appear inside a [`DynamicValue::List`].
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A boolean.
    Bool(bool),
    /// A UTF-8 string.
    String(String),
    /// A signed 64-bit integer.
    Int(i64),
    /// A 64-bit float.
    Double(f64),
}

/// A value stored under a key.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    /// A boolean.
    Bool(bool),
    /// A UTF-8 string.
    String(String),
    /// A signed 64-bit integer.
    Int(i64),
    /// A 64-bit float. Stored through its decimal string form.
    Double(f64),
    /// An ordered list of primitives.
    List(Vec<Primitive>),
    /// A structured object, persisted as JSON text.
    Object(Map<String, Value>),
}

/// Error converting JSON into a [`DynamicValue`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// `null` has no stored representation.
    #[error("null cannot be stored")]
    Null,
    /// Lists may only hold booleans, strings and numbers.
    #[error("list element {index} is not a primitive")]
    NonPrimitiveElement { index: usize },
    /// A number too large for `i64` and not representable as `f64`.
    #[error("number {0} is out of range")]
    NumberOutOfRange(String),
}

impl Primitive {
    /// Convert to a JSON value. Non-finite doubles have no JSON form.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::String(s) => Some(Value::String(s.clone())),
            Self::Int(i) => Some(Value::Number((*i).into())),
            Self::Double(d) => Number::from_f64(*d).map(Value::Number),
        }
    }

    /// Convert a JSON scalar. Returns `None` for arrays, objects and `null`.
    ///
    /// Numbers written without a fraction or exponent become [`Primitive::Int`],
    /// everything else numeric becomes [`Primitive::Double`].
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => number_to_primitive(n),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

fn number_to_primitive(n: &Number) -> Option<Primitive> {
    if let Some(i) = n.as_i64() {
        Some(Primitive::Int(i))
    } else {
        // u64 above i64::MAX and true floats both land here.
        n.as_f64().map(Primitive::Double)
    }
}

impl DynamicValue {
    /// The tag persisted alongside this value.
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::Bool(_) => TypeTag::Bool,
            Self::String(_) => TypeTag::String,
            Self::Int(_) => TypeTag::Int,
            Self::Double(_) => TypeTag::Double,
            Self::List(_) => TypeTag::List,
            Self::Object(_) => TypeTag::Object,
        }
    }

    /// The boolean, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The text, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The double, if this is a `Double`.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// The elements, if this is a `List`.
    pub fn as_list(&self) -> Option<&[Primitive]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The JSON object, if this is an `Object`.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Render as JSON. Non-finite doubles become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::String(s) => Value::String(s.clone()),
            Self::Int(i) => Value::Number((*i).into()),
            Self::Double(d) => Number::from_f64(*d).map_or(Value::Null, Value::Number),
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .map(|p| p.to_json().unwrap_or(Value::Null))
                    .collect(),
            ),
            Self::Object(map) => Value::Object(map.clone()),
        }
    }

    /// Classify a JSON value into a [`DynamicValue`].
    ///
    /// Arrays must contain only scalars; objects are kept as-is.
    pub fn from_json(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Err(ValueError::Null),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::String(s) => Ok(Self::String(s)),
            Value::Number(n) => match number_to_primitive(&n) {
                Some(Primitive::Int(i)) => Ok(Self::Int(i)),
                Some(Primitive::Double(d)) => Ok(Self::Double(d)),
                _ => Err(ValueError::NumberOutOfRange(n.to_string())),
            },
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    Primitive::from_json(item).ok_or(ValueError::NonPrimitiveElement { index })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            Value::Object(map) => Ok(Self::Object(map)),
        }
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Double(d) => write!(f, "{d}"),
            Self::String(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────────

impl From<bool> for Primitive {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Primitive {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Primitive {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i64> for Primitive {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Primitive {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Primitive {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for DynamicValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for DynamicValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i64> for DynamicValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for DynamicValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for DynamicValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<Map<String, Value>> for DynamicValue {
    fn from(map: Map<String, Value>) -> Self {
        Self::Object(map)
    }
}

impl<T: Into<Primitive>> From<Vec<T>> for DynamicValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Primitive> for DynamicValue {
    fn from(p: Primitive) -> Self {
        match p {
            Primitive::Bool(b) => Self::Bool(b),
            Primitive::String(s) => Self::String(s),
            Primitive::Int(i) => Self::Int(i),
            Primitive::Double(d) => Self::Double(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_follow_variants() {
        assert_eq!(DynamicValue::from(true).tag(), TypeTag::Bool);
        assert_eq!(DynamicValue::from("x").tag(), TypeTag::String);
        assert_eq!(DynamicValue::from(12).tag(), TypeTag::Int);
        assert_eq!(DynamicValue::from(12.5).tag(), TypeTag::Double);
        assert_eq!(DynamicValue::from(vec![1, 2]).tag(), TypeTag::List);
        assert_eq!(DynamicValue::Object(Map::new()).tag(), TypeTag::Object);
    }

    #[test]
    fn json_numbers_split_on_literal_form() {
        assert_eq!(DynamicValue::from_json(json!(12)).unwrap(), DynamicValue::Int(12));
        assert_eq!(
            DynamicValue::from_json(json!(12.5)).unwrap(),
            DynamicValue::Double(12.5)
        );
        let big: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert!(matches!(
            DynamicValue::from_json(big).unwrap(),
            DynamicValue::Double(_)
        ));
    }

    #[test]
    fn json_arrays_must_be_flat() {
        let list = DynamicValue::from_json(json!([1, "a", true, 2.5])).unwrap();
        assert_eq!(
            list,
            DynamicValue::List(vec![
                Primitive::Int(1),
                Primitive::String("a".into()),
                Primitive::Bool(true),
                Primitive::Double(2.5),
            ])
        );

        let err = DynamicValue::from_json(json!([1, [2]])).unwrap_err();
        assert_eq!(err, ValueError::NonPrimitiveElement { index: 1 });
        assert_eq!(DynamicValue::from_json(Value::Null).unwrap_err(), ValueError::Null);
    }

    #[test]
    fn json_objects_are_kept_whole() {
        let obj = DynamicValue::from_json(json!({"a": "b", "c": 2})).unwrap();
        assert_eq!(obj.to_json(), json!({"a": "b", "c": 2}));
    }

    #[test]
    fn display_is_plain() {
        assert_eq!(DynamicValue::from("hi").to_string(), "hi");
        assert_eq!(DynamicValue::from(0.1).to_string(), "0.1");
        assert_eq!(DynamicValue::from(vec![1, 2]).to_string(), "[1,2]");
    }
}
