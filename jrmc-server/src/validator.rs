//! Request validation
//!
//! First stage of dispatch: turn an arbitrary decoded JSON value into a
//! canonical [`Request`]. Checks, in order:
//!
//! 1. the value is an object with string `resource` and `method` fields
//! 2. `params`, when present, is an array (absent becomes `[]`)
//!
//! Anything else in the object is ignored.

use jrmc_core::{DispatchError, Request};
use serde_json::{Map, Value};

/// Validate a decoded request
///
/// # Examples
///
/// ```rust
/// use jrmc_server::validator::validate;
/// use serde_json::json;
///
/// let request = validate(json!({"id": 1, "resource": "/math", "method": "triple"})).unwrap();
/// assert!(request.params.is_empty());
///
/// let err = validate(json!({"resource": "/math"})).unwrap_err();
/// assert_eq!(err.to_string(), "resource and method are required");
/// ```
pub fn validate(value: Value) -> Result<Request, DispatchError> {
    let Value::Object(mut map) = value else {
        return Err(DispatchError::missing_fields());
    };

    let (Some(resource), Some(method)) = (take_string(&mut map, "resource"), take_string(&mut map, "method")) else {
        return Err(DispatchError::missing_fields());
    };

    let params = match map.remove("params") {
        None => Vec::new(),
        Some(Value::Array(params)) => params,
        Some(_) => return Err(DispatchError::params_not_a_list()),
    };

    Ok(Request {
        id: map.remove("id"),
        resource,
        method,
        params,
    })
}

/// The id of a request, read before validation so that even rejected
/// requests are answered with it
pub fn request_id(value: &Value) -> Option<Value> {
    value.get("id").cloned()
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
