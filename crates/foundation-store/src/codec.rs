//! Text encodings used for values the property store cannot hold natively.
//!
//! Doubles are written as their shortest round-trip decimal string and parsed
//! back from it, so the value read is bit-identical to the value written
//! regardless of how a backend stores native floats. List elements and
//! objects are JSON text.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde_json::{Map, Value};

use crate::traits::Property;
use crate::value::{DynamicValue, Primitive};

/// Encode a value into the primitive it is persisted as.
pub(crate) fn encode(value: &DynamicValue) -> Result<Property, String> {
    Ok(match value {
        DynamicValue::Bool(b) => Property::Bool(*b),
        DynamicValue::String(s) => Property::String(s.clone()),
        DynamicValue::Int(i) => Property::Int(*i),
        DynamicValue::Double(d) => Property::String(encode_double(*d)),
        DynamicValue::List(items) => Property::List(encode_list(items)?),
        DynamicValue::Object(map) => Property::String(encode_object(map)?),
    })
}

pub(crate) fn encode_double(d: f64) -> String {
    d.to_string()
}

pub(crate) fn decode_double(text: &str) -> Result<f64, String> {
    text.trim()
        .parse::<f64>()
        .map_err(|e| format!("{text:?} is not a number: {e}"))
}

pub(crate) fn encode_list(items: &[Primitive]) -> Result<Vec<String>, String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.to_json()
                .map(|v| v.to_string())
                .ok_or_else(|| format!("list element {i} is not a finite number"))
        })
        .collect()
}

pub(crate) fn decode_list(items: &[String]) -> Result<Vec<Primitive>, String> {
    items
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let value: Value = serde_json::from_str(text)
                .map_err(|e| format!("list element {i} is not valid JSON: {e}"))?;
            Primitive::from_json(&value).ok_or_else(|| format!("list element {i} is not a primitive"))
        })
        .collect()
}

pub(crate) fn encode_object(map: &Map<String, Value>) -> Result<String, String> {
    serde_json::to_string(map).map_err(|e| e.to_string())
}

pub(crate) fn decode_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected a JSON object, found {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn doubles_are_exact() {
        for d in [0.1, 12.5, -0.0, 1e300, 5e-324, f64::MAX, 1.0 / 3.0] {
            let back = decode_double(&encode_double(d)).unwrap();
            assert_eq!(back.to_bits(), d.to_bits(), "{d}");
        }
        assert!(decode_double(&encode_double(f64::NAN)).unwrap().is_nan());
        assert_eq!(
            decode_double(&encode_double(f64::INFINITY)).unwrap(),
            f64::INFINITY
        );
        assert!(decode_double("twelve").is_err());
    }

    #[test]
    fn list_elements_keep_their_kind() {
        let items = vec![
            Primitive::Int(1),
            Primitive::Double(2.0),
            Primitive::String("3".into()),
            Primitive::Bool(false),
        ];
        let encoded = encode_list(&items).unwrap();
        assert_eq!(encoded, vec!["1", "2.0", "\"3\"", "false"]);
        assert_eq!(decode_list(&encoded).unwrap(), items);
    }

    #[test]
    fn non_finite_list_elements_are_rejected() {
        let err = encode_list(&[Primitive::Int(1), Primitive::Double(f64::NAN)]).unwrap_err();
        assert!(err.contains("element 1"));
    }

    #[test]
    fn malformed_list_elements_are_reported() {
        assert!(decode_list(&["{oops".to_string()]).is_err());
        assert!(decode_list(&["[1]".to_string()]).is_err());
    }

    #[test]
    fn objects_must_decode_to_objects() {
        let map = json!({"a": "b", "c": [1, 2]}).as_object().unwrap().clone();
        let text = encode_object(&map).unwrap();
        assert_eq!(decode_object(&text).unwrap(), map);
        assert!(decode_object("[1]").is_err());
        assert!(decode_object("{").is_err());
    }

    #[test]
    fn encode_picks_string_channel_for_doubles() {
        assert_eq!(
            encode(&DynamicValue::Double(12.5)).unwrap(),
            Property::String("12.5".into())
        );
        assert_eq!(encode(&DynamicValue::Int(12)).unwrap(), Property::Int(12));
    }
}
