use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;
use serde_json::Value;

use super::call::ParamStyle;
use super::response::{UnmarshalError, essence};
use crate::SwaggerClientError;
use crate::spec::Spec;

/// Where a parameter goes in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ParameterLocation {
    /// Substituted in the path template.
    #[display("path")]
    Path,
    /// Appended to the query string.
    #[display("query")]
    Query,
    /// Sent as a header.
    #[display("header")]
    Header,
    /// Sent in the `Cookie` header.
    #[display("cookie")]
    Cookie,
    /// A field of an url-encoded form body.
    #[display("formData")]
    FormData,
    /// The JSON request body.
    #[display("body")]
    Body,
}

impl ParameterLocation {
    fn parse(location: &str) -> Option<Self> {
        let result = match location {
            "path" => Self::Path,
            "query" => Self::Query,
            "header" => Self::Header,
            "cookie" => Self::Cookie,
            "formData" => Self::FormData,
            "body" => Self::Body,
            _ => return None,
        };
        Some(result)
    }
}

/// A declared parameter of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    /// The parameter name.
    pub name: String,
    /// Where it goes.
    pub location: ParameterLocation,
    /// Whether a value must be provided (directly or through a default).
    pub required: bool,
    /// The declared default value.
    pub default: Option<Value>,
    /// How array values are serialized.
    pub style: ParamStyle,
    /// The schema of the value, when declared.
    pub schema: Option<Value>,
}

impl ParameterSpec {
    fn from_swagger(spec: &Spec, parameter: &Value) -> Result<Self, SwaggerClientError> {
        let name = parameter
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SwaggerClientError::InvalidSpec {
                reason: format!("parameter without name: {parameter}"),
            })?;
        let location = parameter
            .get("in")
            .and_then(Value::as_str)
            .and_then(ParameterLocation::parse)
            .ok_or_else(|| SwaggerClientError::InvalidSpec {
                reason: format!("parameter '{name}' has an invalid location"),
            })?;

        let schema = match parameter.get("schema") {
            Some(schema) => Some(schema.clone()),
            None if location == ParameterLocation::Body => None,
            None => Some(parameter.clone()),
        };
        let default = parameter.get("default").cloned().or_else(|| {
            let schema = spec.deref(parameter.get("schema")?).ok()?;
            schema.get("default").cloned()
        });

        let style = if spec.is_openapi_3() {
            ParamStyle::from_openapi(location, parameter)
        } else {
            ParamStyle::from_collection_format(parameter.get("collectionFormat").and_then(Value::as_str))
        };

        Ok(Self {
            name: name.to_string(),
            location,
            required: location == ParameterLocation::Path
                || parameter.get("required").and_then(Value::as_bool) == Some(true),
            default,
            style,
            schema,
        })
    }
}

/// An OpenAPI 3 request body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodySpec {
    /// Whether a body must be provided.
    pub required: bool,
    /// The first declared media type.
    pub content_type: Option<String>,
    /// The schema of that media type.
    pub schema: Option<Value>,
}

/// Everything needed to call an operation and read its responses.
///
/// Built once per operation when the client is created; response objects
/// are dereferenced at that time.
#[derive(derive_more::Debug, Clone)]
pub struct OperationDescriptor {
    #[debug(skip)]
    spec: Arc<Spec>,
    operation_id: String,
    method: Method,
    path_name: String,
    parameters: Vec<ParameterSpec>,
    request_body: Option<RequestBodySpec>,
    responses: IndexMap<String, Value>,
    tags: Vec<String>,
    consumes: Vec<String>,
}

impl OperationDescriptor {
    pub(crate) fn build(
        spec: &Arc<Spec>,
        method: Method,
        path_name: &str,
        path_item: &Value,
        operation: &Value,
    ) -> Result<Self, SwaggerClientError> {
        let operation_id = operation
            .get("operationId")
            .and_then(Value::as_str)
            .map_or_else(
                || sanitize_name(&format!("{}_{path_name}", method.as_str().to_ascii_lowercase())),
                ToString::to_string,
            );

        let mut parameters = IndexMap::<(String, ParameterLocation), ParameterSpec>::new();
        let declared = [path_item, operation]
            .into_iter()
            .filter_map(|item| item.get("parameters").and_then(Value::as_array))
            .flatten();
        for parameter in declared {
            let parameter = ParameterSpec::from_swagger(spec, spec.deref(parameter)?)?;
            parameters.insert((parameter.name.clone(), parameter.location), parameter);
        }

        let request_body = operation
            .get("requestBody")
            .map(|body| spec.deref(body))
            .transpose()?
            .map(|body| {
                let (content_type, media) = body
                    .get("content")
                    .and_then(Value::as_object)
                    .and_then(|content| content.iter().next())
                    .map_or((None, None), |(name, media)| (Some(name.clone()), Some(media)));
                RequestBodySpec {
                    required: body.get("required").and_then(Value::as_bool) == Some(true),
                    content_type,
                    schema: media.and_then(|media| media.get("schema")).cloned(),
                }
            });

        let mut responses = IndexMap::new();
        if let Some(declared) = operation.get("responses").and_then(Value::as_object) {
            for (status, response) in declared {
                responses.insert(status.clone(), spec.deref(response)?.clone());
            }
        }

        let strings = |key: &str| -> Vec<String> {
            operation
                .get(key)
                .or_else(|| spec.document().get(key))
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).map(String::from).collect())
                .unwrap_or_default()
        };
        let tags = operation
            .get("tags")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();

        Ok(Self {
            spec: Arc::clone(spec),
            operation_id,
            method,
            path_name: path_name.to_string(),
            parameters: parameters.into_values().collect(),
            request_body,
            responses,
            tags,
            consumes: strings("consumes"),
        })
    }

    /// The owning specification.
    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    /// The operation id, or a name derived from method and path.
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path template, e.g. `/pet/{petId}`.
    pub fn path_name(&self) -> &str {
        &self.path_name
    }

    /// Declared parameters, path-level ones included.
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// The OpenAPI 3 request body, if declared.
    pub fn request_body(&self) -> Option<&RequestBodySpec> {
        self.request_body.as_ref()
    }

    /// Declared responses, keyed by status (`"200"`, `"4XX"`, `"default"`).
    pub fn responses(&self) -> &IndexMap<String, Value> {
        &self.responses
    }

    /// The operation tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Media types the operation accepts (Swagger 2.0 `consumes`).
    pub fn consumes(&self) -> &[String] {
        &self.consumes
    }

    /// Finds the response declared for `status`.
    ///
    /// Looks for the exact code, then a range like `4XX`, then `default`.
    ///
    /// # Errors
    ///
    /// Returns [`UnmarshalError::MatchingResponseNotFound`] when nothing matches.
    pub fn response_spec(&self, status: u16) -> Result<&Value, UnmarshalError> {
        let exact = status.to_string();
        let range = format!("{}XX", status / 100);
        self.responses
            .get(&exact)
            .or_else(|| {
                self.responses
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(&range))
                    .map(|(_, response)| response)
            })
            .or_else(|| self.responses.get("default"))
            .ok_or_else(|| UnmarshalError::MatchingResponseNotFound {
                status,
                operation: self.operation_id.clone(),
            })
    }

    /// Finds the schema of a declared response for the received content type.
    ///
    /// Swagger 2.0 responses have a single `schema`; OpenAPI 3 responses pick
    /// the media type matching `content_type`, or the first one.
    pub fn response_schema<'a>(&self, response_spec: &'a Value, content_type: Option<&str>) -> Option<&'a Value> {
        if let Some(schema) = response_spec.get("schema") {
            return Some(schema);
        }
        let content = response_spec.get("content")?.as_object()?;
        let received = content_type.map(essence);
        let media = received
            .and_then(|received| {
                content
                    .iter()
                    .find(|(name, _)| essence(name) == received)
                    .map(|(_, media)| media)
            })
            .or_else(|| content.values().next())?;
        media.get("schema")
    }
}

/// Turns a free-form string into an identifier.
///
/// Non word characters become `_`, repeated `_` collapse, leading and
/// trailing `_` are dropped.
pub(crate) fn sanitize_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for ch in name.chars() {
        let ch = if ch.is_alphanumeric() || ch == '_' { ch } else { '_' };
        if ch == '_' && result.ends_with('_') {
            continue;
        }
        result.push(ch);
    }
    result.trim_matches('_').to_string()
}
