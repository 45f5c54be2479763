use rmpv::Value as MsgPackValue;
use serde_json::{Number, Value};

use super::UnmarshalError;

/// Decodes a MessagePack body into a JSON value.
///
/// MessagePack can express values that JSON cannot:
/// - map keys that are not strings use their JSON text, so the key `1` becomes `"1"`;
/// - `bin` payloads become arrays of byte values (`0..=255`), extension payloads too,
///   without their type tag;
/// - strings that are not valid UTF-8 are decoded lossily;
/// - non-finite floats become `null`.
pub(crate) fn decode_msgpack(bytes: &[u8]) -> Result<Value, UnmarshalError> {
    let mut reader = bytes;
    let value = rmpv::decode::read_value(&mut reader)?;
    Ok(to_json(value))
}

fn to_json(value: MsgPackValue) -> Value {
    match value {
        MsgPackValue::Nil => Value::Null,
        MsgPackValue::Boolean(value) => Value::Bool(value),
        MsgPackValue::Integer(value) => value
            .as_u64()
            .map(Number::from)
            .or_else(|| value.as_i64().map(Number::from))
            .map_or(Value::Null, Value::Number),
        MsgPackValue::F32(value) => float(f64::from(value)),
        MsgPackValue::F64(value) => float(value),
        MsgPackValue::String(value) => Value::String(utf8_lossy(&value)),
        MsgPackValue::Binary(bytes) | MsgPackValue::Ext(_, bytes) => {
            Value::Array(bytes.into_iter().map(Value::from).collect())
        }
        MsgPackValue::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        MsgPackValue::Map(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key_to_string(key), to_json(value)))
                .collect(),
        ),
    }
}

fn key_to_string(key: MsgPackValue) -> String {
    match key {
        MsgPackValue::String(key) => utf8_lossy(&key),
        other => to_json(other).to_string(),
    }
}

fn utf8_lossy(value: &rmpv::Utf8String) -> String {
    value
        .as_str()
        .map_or_else(|| String::from_utf8_lossy(value.as_bytes()).into_owned(), str::to_owned)
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}
