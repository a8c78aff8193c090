//! Encoding of query results into cache values
//!
//! Values are a versioned JSON envelope:
//!
//! ```text
//! {"version":1,"rows":{"shape":"single","sets":[...]},"fields":[...]}
//! ```
//!
//! The shape tag comes from the executor, so a multi-result-set payload and a
//! single result set of array-valued rows decode back to what was stored.

use crate::cache::types::CacheValue;
use crate::error::CodecError;
use crate::result::{Field, QueryResult, ResultSource, Rows};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope version written by this build
pub const PAYLOAD_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    rows: &'a Rows,
    fields: &'a [Field],
}

#[derive(Deserialize)]
struct Envelope {
    rows: Rows,
    #[serde(default)]
    fields: Vec<Field>,
}

/// Encode a result for storage. The source annotation is not stored.
pub fn encode(result: &QueryResult) -> Result<CacheValue, CodecError> {
    let envelope = EnvelopeRef {
        version: PAYLOAD_VERSION,
        rows: &result.rows,
        fields: &result.fields,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decode a stored value and tag it as served from `key`
pub fn decode(value: &str, key: &str) -> Result<QueryResult, CodecError> {
    let raw: Value = serde_json::from_str(value)?;

    let version = match &raw {
        Value::Object(map) => map.get("version").and_then(Value::as_u64),
        Value::Array(_) => {
            return Err(CodecError::Shape(
                "bare row array without envelope".to_string(),
            ))
        }
        _ => {
            return Err(CodecError::Shape(
                "cached value is not a JSON object".to_string(),
            ))
        }
    };

    match version {
        Some(v) if v == u64::from(PAYLOAD_VERSION) => {}
        Some(v) => {
            return Err(CodecError::UnsupportedVersion {
                found: u32::try_from(v).unwrap_or(u32::MAX),
                expected: PAYLOAD_VERSION,
            })
        }
        None => return Err(CodecError::Shape("missing payload version".to_string())),
    }

    let envelope: Envelope = serde_json::from_value(raw)?;

    Ok(QueryResult {
        rows: envelope.rows,
        fields: envelope.fields,
        source: ResultSource::Cache {
            key: key.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_fields() -> Vec<Field> {
        vec![Field::new("1+2").with_type("BIGINT")]
    }

    #[test]
    fn test_single_round_trip() {
        let result = QueryResult::single(vec![json!({"1+2": 3})], sample_fields());

        let encoded = encode(&result).unwrap();
        let decoded = decode(&encoded, "sql.key").unwrap();

        assert_eq!(decoded.rows, result.rows);
        assert_eq!(decoded.fields, result.fields);
        assert_eq!(decoded.cache_hit(), Some("sql.key"));
    }

    #[test]
    fn test_multi_round_trip() {
        let result = QueryResult::multi(
            vec![vec![json!({"id": 1}), json!({"id": 2})], vec![json!({"affected": 2})]],
            sample_fields(),
        );

        let decoded = decode(&encode(&result).unwrap(), "sql.proc").unwrap();

        assert!(decoded.is_multi());
        assert_eq!(decoded.rows, result.rows);
        assert_eq!(decoded.cache_hit(), Some("sql.proc"));
    }

    #[test]
    fn test_array_valued_rows_stay_single() {
        let result = QueryResult::single(vec![json!([1, "a"]), json!([2, "b"])], vec![]);

        let decoded = decode(&encode(&result).unwrap(), "k").unwrap();

        assert!(!decoded.is_multi());
        assert_eq!(decoded.rows, result.rows);
    }

    #[test]
    fn test_encode_drops_source() {
        let result = QueryResult::single(vec![], vec![]).with_source(ResultSource::Cache {
            key: "old".to_string(),
        });
        let encoded = encode(&result).unwrap();
        assert!(!encoded.contains("old"));
    }

    #[test]
    fn test_decode_rejects_corrupt_values() {
        assert!(matches!(
            decode("{not json", "k"),
            Err(CodecError::Serialization(_))
        ));
        assert!(matches!(
            decode(r#"[{"1+2":3}]"#, "k"),
            Err(CodecError::Shape(_))
        ));
        assert!(matches!(decode("42", "k"), Err(CodecError::Shape(_))));
        assert!(matches!(
            decode(r#"{"rows":{"shape":"single","sets":[]}}"#, "k"),
            Err(CodecError::Shape(_))
        ));
    }

    #[test]
    fn test_decode_rejects_other_versions() {
        let value = r#"{"version":2,"rows":{"shape":"single","sets":[]},"fields":[]}"#;
        assert!(matches!(
            decode(value, "k"),
            Err(CodecError::UnsupportedVersion { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn test_decode_rejects_mislabelled_shape() {
        // multi requires every set to be an array
        let value = r#"{"version":1,"rows":{"shape":"multi","sets":[{"id":1}]},"fields":[]}"#;
        assert!(matches!(decode(value, "k"), Err(CodecError::Serialization(_))));
    }
}
