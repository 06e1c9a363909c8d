//! Decoding of the `{ok, result | error}` response envelope

use serde_json::Value;

use crate::binder::{Bind, bind, bind_list};
use crate::error::{ApiError, ApiErrorDetail, ApiResult};

/// Decode a response body and return its `result`
///
/// Malformed JSON is a [`ApiError::Decode`]. Anything other than
/// `ok == true` with a non-null `result` is an [`ApiError::Rejected`]
/// carrying the raw body.
pub fn decode_envelope(body: &[u8]) -> ApiResult<Value> {
    let envelope: Value = serde_json::from_slice(body)?;

    let ok = envelope.get("ok").and_then(Value::as_bool) == Some(true);
    if ok {
        if let Value::Object(mut map) = envelope {
            if let Some(result) = map.remove("result").filter(|r| !r.is_null()) {
                return Ok(result);
            }
        }
        return Err(rejected(body, None));
    }

    let detail = envelope
        .get("error")
        .and_then(|error| bind::<ApiErrorDetail>(error).ok());
    Err(rejected(body, detail))
}

/// Decode a response whose `result` is a single record
pub fn decode_result<T: Bind>(body: &[u8]) -> ApiResult<T> {
    Ok(bind(&decode_envelope(body)?)?)
}

/// Decode a response whose `result` is a list of records
pub fn decode_list<T: Bind>(body: &[u8]) -> ApiResult<Vec<T>> {
    Ok(bind_list(&decode_envelope(body)?)?)
}

/// Extract `items` from a paged `result`
///
/// A result without `items` yields an empty list.
pub fn decode_items<T: Bind>(result: &Value) -> ApiResult<Vec<T>> {
    match result.get("items") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(items) => Ok(bind_list(items)?),
    }
}

fn rejected(body: &[u8], error: Option<ApiErrorDetail>) -> ApiError {
    ApiError::Rejected {
        body: String::from_utf8_lossy(body).into_owned(),
        error,
    }
}
