use serde_json::{Map, Value};

use super::{RefError, Spec};

/// Converts a decoded payload into the model described by `schema`.
///
/// Models are kept as JSON values. Unless
/// [`include_missing_properties`](super::SpecConfig::include_missing_properties)
/// is enabled, the value is returned unchanged; otherwise every property the
/// schema declares but the payload lacks is added with its `default`, or `null`.
///
/// # Errors
///
/// Fails if a `$ref` of the schema cannot be followed.
pub fn unmarshal_schema_object(spec: &Spec, schema: &Value, value: Value) -> Result<Value, RefError> {
    if !spec.config().include_missing_properties {
        return Ok(value);
    }
    fill_missing(spec, schema, value, 0)
}

const MAX_DEPTH: usize = 32;

fn fill_missing(spec: &Spec, schema: &Value, value: Value, depth: usize) -> Result<Value, RefError> {
    if depth > MAX_DEPTH {
        return Ok(value);
    }
    let schema = spec.deref(schema)?;

    match value {
        Value::Object(object) => {
            let properties = declared_properties(spec, schema)?;
            if properties.is_empty() {
                return Ok(Value::Object(object));
            }
            let mut object = object;
            for (name, property) in &properties {
                match object.remove(name) {
                    Some(item) => {
                        let item = fill_missing(spec, property, item, depth + 1)?;
                        object.insert(name.clone(), item);
                    }
                    None => {
                        let default = spec
                            .deref(property)?
                            .get("default")
                            .cloned()
                            .unwrap_or(Value::Null);
                        object.insert(name.clone(), default);
                    }
                }
            }
            Ok(Value::Object(object))
        }
        Value::Array(items) => {
            let Some(item_schema) = schema.get("items") else {
                return Ok(Value::Array(items));
            };
            items
                .into_iter()
                .map(|item| fill_missing(spec, item_schema, item, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        other => Ok(other),
    }
}

/// Properties of an object schema, `allOf` members included.
fn declared_properties(spec: &Spec, schema: &Value) -> Result<Map<String, Value>, RefError> {
    let mut result = Map::new();
    if let Some(members) = schema.get("allOf").and_then(Value::as_array) {
        for member in members {
            let member = spec.deref(member)?;
            result.extend(declared_properties(spec, member)?);
        }
    }
    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        result.extend(properties.iter().map(|(name, property)| (name.clone(), property.clone())));
    }
    Ok(result)
}
