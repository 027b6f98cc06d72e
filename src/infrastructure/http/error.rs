//! Classification of HTTP failures into transport errors.

use crate::domain::errors::TransportError;

/// Build the transport error for a non-success status code.
///
/// The body (when readable) is carried verbatim so the presentation layer
/// can show whatever detail the backend provided.
pub fn from_status(status: reqwest::StatusCode, body: String) -> TransportError {
    TransportError::Status {
        status: status.as_u16(),
        message: if body.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            body
        },
    }
}

/// Build the transport error for a request that never produced a response.
pub fn from_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}
