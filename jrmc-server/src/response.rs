//! Response envelope construction
//!
//! The last dispatch stage and the only place a [`DispatchError`] becomes a
//! string.

use jrmc_core::{DispatchError, Response};
use serde_json::Value;

/// Build the envelope for a finished dispatch
///
/// The id is passed through as given: `None` produces a response without an
/// `id` key, `Some(Value::Null)` echoes `"id": null`.
pub fn build(id: Option<Value>, outcome: Result<Value, DispatchError>) -> Response {
    match outcome {
        Ok(result) => Response::success(id, result),
        Err(error) => Response::error(id, error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let response = build(Some(json!(1)), Ok(json!(30)));
        assert_eq!(response.into_value(), json!({"id": 1, "result": 30}));
    }

    #[test]
    fn test_error_envelope_uses_display() {
        let response = build(Some(json!(4)), Err(DispatchError::not_exposed("secret")));
        assert_eq!(
            response.into_value(),
            json!({"id": 4, "error": "No such method: secret!"})
        );
    }

    #[test]
    fn test_id_passthrough() {
        assert_eq!(build(None, Ok(json!(1))).into_value(), json!({"result": 1}));
        assert_eq!(
            build(Some(Value::Null), Ok(json!(1))).into_value(),
            json!({"id": null, "result": 1})
        );
        assert_eq!(
            build(Some(json!({"k": [1]})), Ok(json!(1))).into_value(),
            json!({"id": {"k": [1]}, "result": 1})
        );
    }
}
