use serde_json::Value;

use super::{RefError, Spec};

/// Validates decoded response payloads against their declared schema.
///
/// The default implementation is [`JsonSchemaValidator`]. A custom validator
/// can be installed with
/// [`SwaggerClientBuilder::with_validator`](crate::SwaggerClientBuilder::with_validator).
pub trait ResponseValidator: Send + Sync {
    /// Checks `value` against `schema`.
    ///
    /// `schema` may still contain `$ref`s, resolve them with
    /// [`Spec::resolve_schema`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the value does not conform.
    fn validate(&self, spec: &Spec, schema: &Value, value: &Value) -> Result<(), ValidationError>;
}

/// Why a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ValidationError {
    /// The declared schema is not a valid JSON schema.
    #[display("Invalid schema: {message}")]
    #[from(skip)]
    InvalidSchema {
        /// The compiler message.
        message: String,
    },

    /// The payload does not conform to the schema.
    #[display("Invalid value: {message}")]
    #[from(skip)]
    Invalid {
        /// The first violation found.
        message: String,
    },

    /// A reference in the schema cannot be followed.
    Unresolved(RefError),
}

/// Validates with the `jsonschema` crate.
///
/// References are inlined before compiling, and the Swagger `x-nullable`
/// and OpenAPI `nullable` extensions are translated into `null` types.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl ResponseValidator for JsonSchemaValidator {
    fn validate(&self, spec: &Spec, schema: &Value, value: &Value) -> Result<(), ValidationError> {
        let mut resolved = spec.resolve_schema(schema)?;
        apply_nullable(&mut resolved);

        let validator =
            jsonschema::validator_for(&resolved).map_err(|err| ValidationError::InvalidSchema {
                message: err.to_string(),
            })?;

        validator
            .validate(value)
            .map_err(|err| ValidationError::Invalid {
                message: err.to_string(),
            })
    }
}

fn apply_nullable(schema: &mut Value) {
    match schema {
        Value::Object(object) => {
            let nullable = ["x-nullable", "nullable"]
                .iter()
                .any(|key| object.get(*key).and_then(Value::as_bool) == Some(true));
            if nullable {
                let null = Value::from("null");
                let kinds = match object.get("type") {
                    Some(Value::String(kind)) => Some(vec![Value::from(kind.as_str()), null]),
                    Some(Value::Array(kinds)) if !kinds.contains(&null) => {
                        Some(kinds.iter().cloned().chain([null]).collect())
                    }
                    _ => None,
                };
                if let Some(kinds) = kinds {
                    object.insert("type".to_string(), Value::Array(kinds));
                }
            }
            for item in object.values_mut() {
                apply_nullable(item);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(apply_nullable),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::SpecConfig;

    fn petstore() -> Spec {
        Spec::from_document(
            json!({
                "swagger": "2.0",
                "definitions": {
                    "Pet": {
                        "type": "object",
                        "required": ["name"],
                        "properties": {
                            "name": {"type": "string"},
                            "tag": {"type": "string", "x-nullable": true}
                        }
                    }
                }
            }),
            None,
            SpecConfig::default(),
        )
    }

    #[test]
    fn should_accept_conforming_value() {
        let spec = petstore();
        let schema = json!({"$ref": "#/definitions/Pet"});

        let result = JsonSchemaValidator.validate(&spec, &schema, &json!({"name": "Rex", "tag": null}));

        assert_eq!(result, Ok(()));
    }

    #[test]
    fn should_reject_missing_required_property() {
        let spec = petstore();
        let schema = json!({"$ref": "#/definitions/Pet"});

        let error = JsonSchemaValidator
            .validate(&spec, &schema, &json!({"tag": "dog"}))
            .expect_err("invalid");

        let ValidationError::Invalid { message } = error else {
            panic!("expected a validation failure, got {error:?}");
        };
        assert!(message.contains("\"name\""), "{message}");
    }

    #[test]
    fn should_report_unresolved_reference() {
        let spec = petstore();
        let schema = json!({"$ref": "#/definitions/Missing"});

        let error = JsonSchemaValidator
            .validate(&spec, &schema, &json!({}))
            .expect_err("unresolved");

        assert!(matches!(error, ValidationError::Unresolved(_)));
    }

    #[test]
    fn should_translate_nullable_types() {
        let mut schema = json!({"type": "object", "properties": {"id": {"type": "integer", "nullable": true}}});

        apply_nullable(&mut schema);

        assert_eq!(
            schema,
            json!({"type": "object", "properties": {"id": {"type": ["integer", "null"], "nullable": true}}})
        );
    }
}
