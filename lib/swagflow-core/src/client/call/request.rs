use bytes::Bytes;
use headers::{ContentType, HeaderMapExt};
use http::header::COOKIE;
use http::{HeaderMap, HeaderName, HeaderValue};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::CallParams;
use super::param::{to_query_values, to_string_value};
use crate::SwaggerClientError;
use crate::client::operation::{OperationDescriptor, ParameterLocation};
use crate::client::response::APP_JSON;
use crate::client::transport::TransportRequest;

/// Characters kept as is in path parameter values.
const PATH_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// Name of the OpenAPI 3 request body parameter.
pub(crate) const BODY_PARAM: &str = "body";

#[derive(Debug, Default)]
struct RequestParts {
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    cookies: Vec<String>,
    form: Vec<(String, String)>,
    body: Option<Value>,
    body_content_type: Option<String>,
}

/// Builds the HTTP request of an operation call.
///
/// `headers` are sent first; header parameters replace them.
pub(crate) fn build_request(
    api_url: &Url,
    operation: &OperationDescriptor,
    mut params: CallParams,
    headers: &HeaderMap,
) -> Result<TransportRequest, SwaggerClientError> {
    let mut parts = RequestParts {
        path: operation.path_name().to_string(),
        headers: headers.clone(),
        ..RequestParts::default()
    };

    for parameter in operation.parameters() {
        let value = params
            .take(&parameter.name)
            .filter(|value| !value.is_null())
            .or_else(|| parameter.default.clone());
        let Some(value) = value else {
            if parameter.required {
                return Err(missing(operation, &parameter.name));
            }
            continue;
        };
        let name = parameter.name.as_str();

        match parameter.location {
            ParameterLocation::Path => {
                let text = to_string_value(name, &value, parameter.style)?;
                let encoded = utf8_percent_encode(&text, PATH_VALUE).to_string();
                parts.path = parts.path.replace(&format!("{{{name}}}"), &encoded);
            }
            ParameterLocation::Query => {
                for item in to_query_values(name, &value, parameter.style)? {
                    parts.query.push((name.to_string(), item));
                }
            }
            ParameterLocation::Header => {
                let text = to_string_value(name, &value, parameter.style)?;
                let header = HeaderName::from_bytes(name.as_bytes())?;
                parts.headers.insert(header, HeaderValue::from_str(&text)?);
            }
            ParameterLocation::Cookie => {
                let text = to_string_value(name, &value, parameter.style)?;
                parts.cookies.push(format!("{name}={text}"));
            }
            ParameterLocation::FormData => {
                for item in to_query_values(name, &value, parameter.style)? {
                    parts.form.push((name.to_string(), item));
                }
            }
            ParameterLocation::Body => {
                parts.body = Some(value);
                parts.body_content_type = operation.consumes().first().cloned();
            }
        }
    }

    if let Some(request_body) = operation.request_body() {
        match params.take(BODY_PARAM).filter(|value| !value.is_null()) {
            Some(value) => {
                parts.body = Some(value);
                parts.body_content_type.clone_from(&request_body.content_type);
            }
            None if request_body.required => return Err(missing(operation, BODY_PARAM)),
            None => {}
        }
    }

    if let Some(unknown) = params.names().next() {
        return Err(SwaggerClientError::UnknownParameter {
            operation: operation.operation_id().to_string(),
            name: unknown.to_string(),
        });
    }

    parts.into_request(api_url, operation)
}

fn missing(operation: &OperationDescriptor, name: &str) -> SwaggerClientError {
    SwaggerClientError::MissingParameter {
        operation: operation.operation_id().to_string(),
        name: name.to_string(),
    }
}

impl RequestParts {
    fn into_request(
        self,
        api_url: &Url,
        operation: &OperationDescriptor,
    ) -> Result<TransportRequest, SwaggerClientError> {
        let Self {
            path,
            query,
            mut headers,
            cookies,
            form,
            body,
            body_content_type,
        } = self;

        let mut url = api_url.clone();
        let base = api_url.path().trim_end_matches('/');
        url.set_path(&format!("{base}{path}"));
        if !query.is_empty() {
            url.set_query(Some(&serde_urlencoded::to_string(&query)?));
        }

        if !cookies.is_empty() {
            headers.insert(COOKIE, HeaderValue::from_str(&cookies.join("; "))?);
        }

        let body = match (body, form.is_empty()) {
            (Some(body), _) => Some(encode_body(&body, body_content_type.as_deref(), &mut headers)?),
            (None, false) => {
                headers.typed_insert(ContentType::form_url_encoded());
                Some(Bytes::from(serde_urlencoded::to_string(&form)?))
            }
            (None, true) => None,
        };

        debug!(
            operation = operation.operation_id(),
            method = %operation.method(),
            %url,
            "request built"
        );
        Ok(TransportRequest {
            method: operation.method().clone(),
            url,
            headers,
            body,
        })
    }
}

fn encode_body(body: &Value, content_type: Option<&str>, headers: &mut HeaderMap) -> Result<Bytes, SwaggerClientError> {
    if content_type == Some(FORM_URL_ENCODED)
        && let Value::Object(fields) = body
    {
        let fields = fields
            .iter()
            .map(|(name, value)| Ok((name.as_str(), to_string_value(name, value, super::ParamStyle::Csv)?)))
            .collect::<Result<Vec<_>, SwaggerClientError>>()?;
        headers.typed_insert(ContentType::form_url_encoded());
        return Ok(Bytes::from(serde_urlencoded::to_string(&fields)?));
    }

    match content_type {
        Some(content_type) if content_type != APP_JSON && content_type.ends_with("+json") => {
            headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        }
        _ => headers.typed_insert(ContentType::json()),
    }
    Ok(Bytes::from(serde_json::to_vec(body)?))
}
