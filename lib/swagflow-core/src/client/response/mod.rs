//! Responses, and their conversion into results.
//!
//! This module provides:
//!
//! - [`IncomingResponse`] - Status, headers and body of a completed request
//! - [`HttpError`] - A response reported as an error
//! - [`UnmarshalError`] - Everything that can fail after the response arrived
//! - [`unmarshal_response`] - Decode, validate and convert a response for an operation

mod incoming;
pub use self::incoming::IncomingResponse;

mod error;
pub use self::error::{HttpError, UnmarshalError};

mod content;
pub(crate) use self::content::{APP_JSON, ContentKind, essence};

mod msgpack;

mod unmarshal;
pub(crate) use self::unmarshal::CallbackGuard;
pub use self::unmarshal::{unmarshal_response, unmarshal_response_inner};
