//! Service implementations for the EKDSend API.
//!
//! Each service builds paths and queries for one resource and leaves
//! sending, retrying and error mapping to the shared executor.

mod calls;
mod emails;
mod sms;

pub use calls::CallsService;
pub use emails::EmailsService;
pub use sms::SmsService;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::errors::{EkdSendError, EkdSendResult};

/// Bytes left as-is in a single path segment (RFC 3986 unreserved).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Rejects an empty resource id before it reaches the network.
fn require_id<'a>(id: &'a str, param: &str) -> EkdSendResult<&'a str> {
    if id.trim().is_empty() {
        Err(EkdSendError::invalid_param(
            format!("{} is required", param),
            param,
        ))
    } else {
        Ok(id)
    }
}

/// Builds `{collection}/{id}` with the id encoded as one path segment.
///
/// `.` and `..` are refused since URL parsing would resolve them away.
fn resource_path(collection: &str, id: &str, param: &str) -> EkdSendResult<String> {
    let id = require_id(id, param)?;
    if id == "." || id == ".." {
        return Err(EkdSendError::invalid_param(
            format!("{} is not a valid id", param),
            param,
        ));
    }
    Ok(format!(
        "{}/{}",
        collection,
        utf8_percent_encode(id, PATH_SEGMENT)
    ))
}
