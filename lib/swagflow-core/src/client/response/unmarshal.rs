use serde_json::Value;
use tracing::{debug, warn};

use super::msgpack::decode_msgpack;
use super::{ContentKind, HttpError, IncomingResponse, UnmarshalError};
use crate::client::future::ResponseCallback;
use crate::client::operation::OperationDescriptor;
use crate::spec::unmarshal_schema_object;

/// Runs the response callbacks when dropped.
///
/// Callbacks run in order, exactly once, whether unmarshalling succeeded or
/// failed. They are skipped while unwinding from a panic: a callback
/// panicking during an unwind would abort the process.
pub(crate) struct CallbackGuard<'a> {
    response: &'a IncomingResponse,
    operation: &'a OperationDescriptor,
    callbacks: &'a [ResponseCallback],
    armed: bool,
}

impl<'a> CallbackGuard<'a> {
    fn armed(
        response: &'a IncomingResponse,
        operation: &'a OperationDescriptor,
        callbacks: &'a [ResponseCallback],
    ) -> Self {
        let mut guard = Self::disarmed(response, operation, callbacks);
        guard.arm();
        guard
    }

    /// A guard that runs nothing until [`arm`](Self::arm) is called.
    pub(crate) fn disarmed(
        response: &'a IncomingResponse,
        operation: &'a OperationDescriptor,
        callbacks: &'a [ResponseCallback],
    ) -> Self {
        Self {
            response,
            operation,
            callbacks,
            armed: false,
        }
    }

    pub(crate) fn arm(&mut self) {
        self.armed = true;
    }
}

impl Drop for CallbackGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if std::thread::panicking() {
            warn!(operation = self.operation.operation_id(), "panicking, response callbacks skipped");
            return;
        }
        for callback in self.callbacks {
            callback(self.response, self.operation);
        }
    }
}

/// Turns a response into the result of `operation`.
///
/// - `5xx` statuses fail immediately, without decoding the body;
/// - the body is decoded according to the declared response for the status;
/// - every callback runs once, in order, before anything is returned;
/// - statuses outside `2xx` fail with an [`HttpError`] carrying the decoded payload.
///
/// # Errors
///
/// Fails with [`UnmarshalError::Http`] for error statuses, and with the other
/// variants when the body cannot be decoded or validated.
pub fn unmarshal_response(
    response: &IncomingResponse,
    operation: &OperationDescriptor,
    callbacks: &[ResponseCallback],
) -> Result<Option<Value>, UnmarshalError> {
    let result = {
        let _guard = CallbackGuard::armed(response, operation, callbacks);
        raise_on_unexpected(response).and_then(|()| {
            unmarshal_response_inner(response, operation).map_err(|error| match error {
                UnmarshalError::MatchingResponseNotFound { .. } => {
                    UnmarshalError::Http(HttpError::new(response.clone()).caused_by(error))
                }
                other => other,
            })
        })
    };

    let value = result?;
    raise_on_expected(response, value)
}

fn raise_on_unexpected(response: &IncomingResponse) -> Result<(), UnmarshalError> {
    if response.status().is_server_error() {
        warn!(status = %response.status(), "server error");
        return Err(UnmarshalError::Http(HttpError::new(response.clone())));
    }
    Ok(())
}

fn raise_on_expected(
    response: &IncomingResponse,
    value: Option<Value>,
) -> Result<Option<Value>, UnmarshalError> {
    if response.status().is_success() {
        return Ok(value);
    }
    debug!(status = %response.status(), "declared error response");
    Err(UnmarshalError::Http(
        HttpError::new(response.clone()).with_swagger_result(value),
    ))
}

/// Decodes the body of a response, without looking at its status class.
///
/// Returns `None` when the declared response has no schema. JSON and
/// MessagePack bodies are decoded, validated when enabled, then converted
/// with [`unmarshal_schema_object`]. Any other content is returned as text.
///
/// # Errors
///
/// Fails when no response is declared for the status, or when the body
/// cannot be decoded or validated.
pub fn unmarshal_response_inner(
    response: &IncomingResponse,
    operation: &OperationDescriptor,
) -> Result<Option<Value>, UnmarshalError> {
    let response_spec = operation.response_spec(response.status().as_u16())?;
    let content_type = response.content_type();
    let Some(schema) = operation.response_schema(response_spec, content_type) else {
        return Ok(None);
    };

    let value = match ContentKind::classify(content_type.unwrap_or_default()) {
        ContentKind::Json => response.json()?,
        ContentKind::MsgPack => decode_msgpack(response.raw_bytes())?,
        ContentKind::Text => return Ok(Some(Value::String(response.text()))),
    };

    let spec = operation.spec();
    let schema = spec.deref(schema)?;
    if spec.config().validate_responses {
        spec.validator().validate(spec, schema, &value)?;
    }

    Ok(Some(unmarshal_schema_object(spec, schema, value)?))
}
