//! Codec for JSON-RMC envelopes
//!
//! The dispatch engine works on already-decoded `serde_json::Value`s. This
//! module is the thin layer between raw text and those values, used by the
//! transports and by `handle_str` in the server crate.
//!
//! # Error Mapping
//!
//! - Text that is not JSON at all -> `Error::Parse`. This is the only failure
//!   a server cannot answer with an envelope.
//! - JSON of the wrong shape for a typed decode -> `Error::Serialization`.
//!
//! # Examples
//!
//! ```rust
//! use jrmc_core::{codec, Request};
//! use serde_json::json;
//!
//! let request = Request::new("/math", "triple", vec![json!(10)]).with_id(json!(1));
//! let text = codec::encode_request(&request).unwrap();
//!
//! let decoded = codec::decode(&text).unwrap();
//! assert_eq!(decoded["method"], "triple");
//! ```

use crate::error::{Error, Result};
use crate::types::{Request, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Encode any serializable value to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode raw text into a generic JSON value
///
/// No envelope validation happens here; that is the dispatch engine's job,
/// so a structurally wrong request still gets a proper error response.
pub fn decode(data: &str) -> Result<Value> {
    serde_json::from_str(data).map_err(|e| Error::Parse(e.to_string()))
}

/// Decode raw text directly into a typed value
pub fn decode_as<'de, T: Deserialize<'de>>(data: &'de str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a request envelope
pub fn encode_request(req: &Request) -> Result<String> {
    encode(req)
}

/// Encode a response envelope
pub fn encode_response(resp: &Response) -> Result<String> {
    encode(resp)
}

/// Decode a response envelope, as a client does
pub fn decode_response(data: &str) -> Result<Response> {
    decode_as(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_invalid_json() {
        match decode("not valid json") {
            Err(Error::Parse(_)) => {}
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_empty_string() {
        assert!(matches!(decode(""), Err(Error::Parse(_))));
    }

    #[test]
    fn test_decode_accepts_any_json_shape() {
        // Shape problems are reported by dispatch, not by the codec
        assert_eq!(decode("[1, 2]").unwrap(), json!([1, 2]));
        assert_eq!(decode("42").unwrap(), json!(42));
        assert_eq!(decode(r#"{"method":"x"}"#).unwrap(), json!({"method": "x"}));
    }

    #[test]
    fn test_encode_response_shapes() {
        let ok = encode_response(&Response::success(Some(json!(1)), json!(30))).unwrap();
        assert_eq!(decode(&ok).unwrap(), json!({"id": 1, "result": 30}));

        let err = encode_response(&Response::error(None, "boom")).unwrap();
        assert_eq!(decode(&err).unwrap(), json!({"error": "boom"}));
    }

    #[test]
    fn test_decode_response_error_envelope() {
        let response = decode_response(r#"{"id":"a","error":"No such method: x!"}"#).unwrap();
        assert_eq!(response.id, Some(json!("a")));
        assert_eq!(response.error_message(), Some("No such method: x!"));
    }

    #[test]
    fn test_decode_response_rejects_foreign_shape() {
        let result = decode_response(r#"{"id":1,"status":"ok"}"#);
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_encode_request_keeps_param_order() {
        let request = Request::new("a/b", "m", vec![json!("x"), json!(2), json!(null)]);
        let text = encode_request(&request).unwrap();
        assert!(text.contains(r#""params":["x",2,null]"#));
    }
}
