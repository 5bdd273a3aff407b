//! Extended JSON projections of BSON values.

use serde_json::{json, Map, Value};

use crate::{
    error::Result,
    extjson::{EncodeOptions, MAX_SAFE_INTEGER, MIN_SAFE_INTEGER},
    Binary,
    Bson,
    DbPointer,
    DbRef,
    JavaScriptCodeWithScope,
    Regex,
    Timestamp,
};

/// The canonical `$numberDouble` string for a finite or non-finite double.
pub(crate) fn canonical_double_string(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v.is_sign_negative() {
            "-Infinity".to_string()
        } else {
            "Infinity".to_string()
        }
    } else if v == 0.0 {
        if v.is_sign_negative() {
            "-0.0".to_string()
        } else {
            "0.0".to_string()
        }
    } else {
        let mut s = v.to_string();
        if !s.contains('.') && !s.contains('e') && !s.contains('E') {
            s.push_str(".0");
        }
        s
    }
}

/// The alphabetically sorted option string the Extended JSON projections of
/// regular expressions require.
fn sorted_options(options: &str) -> String {
    let mut chars: Vec<_> = options.chars().collect();
    chars.sort_unstable();
    chars.into_iter().collect()
}

impl Bson {
    /// Converts this value into its
    /// [relaxed Extended JSON representation](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/).
    ///
    /// Fails only when the tree contains a raw sub-document whose bytes do
    /// not decode.
    pub fn to_relaxed_extjson(&self) -> Result<Value> {
        self.extjson_value(&EncodeOptions {
            relaxed: true,
            legacy: false,
        })
    }

    /// Converts this value into its
    /// [canonical Extended JSON representation](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/).
    ///
    /// Fails only when the tree contains a raw sub-document whose bytes do
    /// not decode.
    pub fn to_canonical_extjson(&self) -> Result<Value> {
        self.extjson_value(&EncodeOptions {
            relaxed: false,
            legacy: false,
        })
    }

    pub(crate) fn extjson_value(&self, options: &EncodeOptions) -> Result<Value> {
        Ok(match self {
            Bson::Double(v) if !v.is_finite() => {
                json!({ "$numberDouble": canonical_double_string(*v) })
            }
            Bson::Double(v) if options.relaxed => json!(v),
            Bson::Double(v) => json!({ "$numberDouble": canonical_double_string(*v) }),
            Bson::String(v) => json!(v),
            Bson::Array(v) => Value::Array(
                v.iter()
                    .map(|b| b.extjson_value(options))
                    .collect::<Result<_>>()?,
            ),
            Bson::Document(v) => {
                let mut map = Map::new();
                for (k, v) in v {
                    map.insert(k.clone(), v.extjson_value(options)?);
                }
                Value::Object(map)
            }
            Bson::Boolean(v) => json!(v),
            Bson::Null => Value::Null,
            Bson::RegularExpression(Regex { pattern, options: o }) if options.legacy => json!({
                "$regex": pattern,
                "$options": sorted_options(o),
            }),
            Bson::RegularExpression(Regex { pattern, options: o }) => json!({
                "$regularExpression": {
                    "pattern": pattern,
                    "options": sorted_options(o),
                }
            }),
            Bson::JavaScriptCode(code) => json!({ "$code": code }),
            Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope }) => json!({
                "$code": code,
                "$scope": Bson::Document(scope.clone()).extjson_value(options)?,
            }),
            Bson::Int32(v) if options.relaxed => json!(v),
            Bson::Int32(v) => json!({ "$numberInt": v.to_string() }),
            Bson::Int64(v)
                if options.relaxed && (MIN_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(v) =>
            {
                json!(v)
            }
            Bson::Int64(v) => json!({ "$numberLong": v.to_string() }),
            Bson::Timestamp(Timestamp { time, increment }) => json!({
                "$timestamp": {
                    "t": time,
                    "i": increment,
                }
            }),
            Bson::Binary(Binary { subtype, bytes }) if options.legacy => {
                let tval: u8 = From::from(*subtype);
                json!({
                    "$binary": crate::base64::encode(bytes),
                    "$type": hex::encode([tval]),
                })
            }
            Bson::Binary(Binary { subtype, bytes }) => {
                let tval: u8 = From::from(*subtype);
                json!({
                    "$binary": {
                        "base64": crate::base64::encode(bytes),
                        "subType": hex::encode([tval]),
                    }
                })
            }
            Bson::ObjectId(v) => json!({ "$oid": v.to_hex() }),
            Bson::DateTime(v) if options.relaxed && v.is_rfc3339_representable() => {
                json!({ "$date": v.try_to_rfc3339_string()? })
            }
            Bson::DateTime(v) => json!({
                "$date": { "$numberLong": v.timestamp_millis().to_string() },
            }),
            Bson::Symbol(v) => json!({ "$symbol": v }),
            Bson::Decimal128(v) => json!({ "$numberDecimal": v.to_string() }),
            Bson::Undefined => json!({ "$undefined": true }),
            Bson::MinKey => json!({ "$minKey": 1 }),
            Bson::MaxKey => json!({ "$maxKey": 1 }),
            Bson::DbPointer(DbPointer { namespace, id }) => json!({
                "$dbPointer": {
                    "$ref": namespace,
                    "$id": {
                        "$oid": id.to_hex()
                    }
                }
            }),
            Bson::DbRef(DbRef {
                collection,
                id,
                db,
                extra,
            }) => {
                let mut map = Map::new();
                map.insert("$ref".to_string(), json!(collection));
                map.insert("$id".to_string(), id.extjson_value(options)?);
                if let Some(db) = db {
                    map.insert("$db".to_string(), json!(db));
                }
                for (k, v) in extra {
                    map.insert(k.clone(), v.extjson_value(options)?);
                }
                Value::Object(map)
            }
            Bson::RawDocument(raw) => Bson::Document(raw.decode()?).extjson_value(options)?,
        })
    }
}
