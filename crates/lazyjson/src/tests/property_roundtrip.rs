use alloc::string::String;

use quickcheck::QuickCheck;

use crate::{Document, Value, parse};

/// Compares a decoded value with `serde_json`'s reading of the same text.
/// Numbers may differ in the last bit; `serde_json` does not round-trip
/// floats exactly without its `float_roundtrip` feature.
fn same(ours: &Value, theirs: &serde_json::Value) -> bool {
    match (ours, theirs) {
        (Value::Null, serde_json::Value::Null) => true,
        (Value::Bool(a), serde_json::Value::Bool(b)) => a == b,
        (Value::Number(a), serde_json::Value::Number(b)) => b
            .as_f64()
            .is_some_and(|b| (a - b).abs() <= f64::EPSILON * a.abs().max(b.abs())),
        (Value::String(a), serde_json::Value::String(b)) => a == b,
        (Value::Array(a), serde_json::Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same(x, y))
        }
        (Value::Object(a), serde_json::Value::Object(b)) => {
            a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| same(v, w)))
        }
        _ => false,
    }
}

fn to_serde(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n).map_or(serde_json::Value::Null, Into::into),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) => items.iter().map(to_serde).collect(),
        Value::Object(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), to_serde(v))).collect(),
        ),
    }
}

fn tests() -> u64 {
    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;
    tests
}

/// Property: text written by `Value`'s `Display` decodes back to the same
/// value, and the untouched document serializes to the exact input bytes.
#[test]
fn display_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(value: Value) -> bool {
        let src = value.to_string();
        let Ok(doc) = parse(src.as_str()) else {
            return false;
        };
        doc.root().unpack().ok() == Some(value) && doc.to_bytes().ok() == Some(src.into_bytes())
    }

    QuickCheck::new().tests(tests()).quickcheck(prop as fn(Value) -> bool);
}

/// Property: `serde_json`'s pretty output (different escaping and layout)
/// decodes to what `serde_json` itself reads from it, and a rewritten copy
/// of the tree decodes to the same again.
#[test]
fn serde_json_oracle_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(value: Value) -> bool {
        let Ok(src) = serde_json::to_string_pretty(&to_serde(&value)) else {
            return false;
        };
        let Ok(oracle) = serde_json::from_str::<serde_json::Value>(&src) else {
            return false;
        };
        let Ok(doc) = parse(src.as_str()) else {
            return false;
        };
        let Ok(decoded) = doc.root().unpack() else {
            return false;
        };
        if !same(&decoded, &oracle) {
            return false;
        }

        // Force a full re-render by replacing the root with a copy of itself.
        let mut copy = Document::new();
        let Ok(imported) = copy.import(&doc, doc.root_id()) else {
            return false;
        };
        if copy.set_root(imported).is_err() {
            return false;
        }
        let Ok(bytes) = copy.to_bytes() else {
            return false;
        };
        let Ok(text) = String::from_utf8(bytes) else {
            return false;
        };
        parse(text.as_str()).and_then(|d| d.root().unpack()).is_ok_and(|v| same(&v, &oracle))
    }

    QuickCheck::new().tests(tests()).quickcheck(prop as fn(Value) -> bool);
}
