//! JSON-RMC envelope types
//!
//! A remote method call is one request envelope answered by one response
//! envelope:
//!
//! ```text
//! request:  {"id"?: any, "resource": string, "method": string, "params"?: array}
//! response: {"id"?: any, "result": any}  or  {"id"?: any, "error": string}
//! ```
//!
//! # Request IDs
//!
//! The `id` is opaque: any JSON value is accepted and echoed back untouched,
//! `null` included. A request without an `id` gets a response without one.
//! That is why the id is an `Option<Value>` rather than a dedicated enum: an
//! explicit `"id": null` is `Some(Value::Null)` and survives a round trip.
//!
//! # Result xor error
//!
//! `Response` stores its payload in [`Outcome`], so a response carrying both a
//! `result` and an `error` (or neither) cannot be constructed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Deserialize a field that is present in the input as `Some`, even when its
/// value is `null`. Combined with `#[serde(default)]` an absent field is `None`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Canonical JSON-RMC request
///
/// Servers build it through validation of a decoded JSON value; clients build
/// it directly and encode it.
///
/// # Examples
///
/// ```rust
/// use jrmc_core::Request;
/// use serde_json::json;
///
/// let request = Request::new("/math", "triple", vec![json!(10)]).with_id(json!(1));
/// assert_eq!(request.resource, "/math");
/// assert_eq!(request.id, Some(json!(1)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation value echoed into the response
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub id: Option<Value>,
    /// Slash-delimited path of the target node
    pub resource: String,
    /// Name of the member to call on the target node
    pub method: String,
    /// Positional arguments, empty when the request omitted them
    #[serde(default)]
    pub params: Vec<Value>,
}

impl Request {
    /// Create a request without an id
    pub fn new(resource: impl Into<String>, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            id: None,
            resource: resource.into(),
            method: method.into(),
            params,
        }
    }

    /// Attach a correlation id
    pub fn with_id(mut self, id: Value) -> Self {
        self.id = Some(id);
        self
    }
}

/// Payload of a response: a result or an error message, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// The method returned this value
    #[serde(rename = "result")]
    Result(Value),
    /// Some stage failed; the human-readable reason
    #[serde(rename = "error")]
    Error(String),
}

/// JSON-RMC response envelope
///
/// # Examples
///
/// ```rust
/// use jrmc_core::Response;
/// use serde_json::json;
///
/// let response = Response::success(Some(json!(1)), json!(30));
/// assert_eq!(response.into_value(), json!({"id": 1, "result": 30}));
///
/// let response = Response::error(None, "Resource not found: /nope");
/// assert_eq!(response.into_value(), json!({"error": "Resource not found: /nope"}));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The request's id, present iff the request had one
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub id: Option<Value>,
    /// Result or error
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    /// Successful response carrying `result`
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            id,
            outcome: Outcome::Result(result),
        }
    }

    /// Failed response carrying `message`
    pub fn error(id: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            id,
            outcome: Outcome::Error(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Result(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    /// The result value, if this is a success
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    /// The error message, if this is a failure
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(message) => Some(message),
        }
    }

    /// Convert into the decoded JSON object form
    pub fn into_value(self) -> Value {
        let mut map = Map::new();
        if let Some(id) = self.id {
            map.insert("id".to_string(), id);
        }
        match self.outcome {
            Outcome::Result(value) => map.insert("result".to_string(), value),
            Outcome::Error(message) => map.insert("error".to_string(), Value::String(message)),
        };
        Value::Object(map)
    }
}

impl From<Response> for Value {
    fn from(response: Response) -> Self {
        response.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization_skips_missing_id() {
        let request = Request::new("/math", "triple", vec![json!(10)]);
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(json.contains("\"resource\":\"/math\""));
        assert!(json.contains("\"params\":[10]"));
    }

    #[test]
    fn test_request_deserialization_defaults_params() {
        let request: Request =
            serde_json::from_value(json!({"resource": "/", "method": "ping"})).unwrap();
        assert!(request.params.is_empty());
        assert_eq!(request.id, None);
    }

    #[test]
    fn test_request_null_id_is_present() {
        let request: Request =
            serde_json::from_value(json!({"id": null, "resource": "/", "method": "ping"}))
                .unwrap();
        assert_eq!(request.id, Some(Value::Null));
    }

    #[test]
    fn test_response_success_serialization() {
        let response = Response::success(Some(json!("abc")), json!({"x": 1}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"id": "abc", "result": {"x": 1}}));
        assert!(response.is_success());
        assert!(!response.is_error());
    }

    #[test]
    fn test_response_error_without_id() {
        let response = Response::error(None, "boom");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"error": "boom"}));
        assert_eq!(response.error_message(), Some("boom"));
        assert_eq!(response.result(), None);
    }

    #[test]
    fn test_response_null_result_is_still_a_result() {
        let response = Response::success(Some(json!(7)), Value::Null);
        assert_eq!(response.clone().into_value(), json!({"id": 7, "result": null}));

        let decoded: Response = serde_json::from_value(json!({"id": 7, "result": null})).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_response_deserialization() {
        let decoded: Response =
            serde_json::from_value(json!({"id": 3, "error": "Resource not found: /nope"}))
                .unwrap();
        assert_eq!(decoded.id, Some(json!(3)));
        assert_eq!(decoded.error_message(), Some("Resource not found: /nope"));
    }

    #[test]
    fn test_into_value_matches_serde() {
        let response = Response::success(Some(Value::Null), json!([1, 2]));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            response.clone().into_value()
        );
    }
}
