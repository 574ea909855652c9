//! JSON encoding and decoding of request and response bodies, and the
//! validation contract request payloads implement.

use std::any::type_name;
use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::response::Response;
use crate::status::Status;

/// Field name → description of what is wrong with it. Empty means valid.
pub type Problems = BTreeMap<String, String>;

/// A request payload that can check itself.
///
/// At most one problem is reported per field. `ctx` is the request context,
/// available to checks that need to consult other services.
pub trait Validator {
    fn valid(&self, ctx: &Context) -> Problems;
}

/// The body could not be serialized into a response.
#[derive(Debug, thiserror::Error)]
#[error("encode json: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// The request body was empty, malformed, or the wrong shape.
#[derive(Debug, thiserror::Error)]
#[error("decode json: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Failure of [`decode_valid`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeValidError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid {type_name}: {} problems", problems.len())]
    Invalid {
        type_name: &'static str,
        problems: Problems,
    },
}

/// Serializes `value` as the JSON body of a `status` response.
pub fn encode<T: Serialize + ?Sized>(status: Status, value: &T) -> Result<Response, EncodeError> {
    let body = serde_json::to_vec(value)?;
    Ok(Response::builder().status(status).json(body))
}

/// Deserializes a JSON request body.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}

/// Decodes a JSON request body, then validates it.
///
/// A decode failure is returned before validation runs.
pub fn decode_valid<T>(ctx: &Context, body: &[u8]) -> Result<T, DecodeValidError>
where
    T: DeserializeOwned + Validator,
{
    let value: T = decode(body)?;
    let problems = value.valid(ctx);
    if !problems.is_empty() {
        return Err(DecodeValidError::Invalid { type_name: type_name::<T>(), problems });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    impl Validator for Named {
        fn valid(&self, _ctx: &Context) -> Problems {
            let mut problems = Problems::new();
            if self.name.is_empty() {
                problems.insert("name".to_owned(), "name is required".to_owned());
            }
            problems
        }
    }

    #[test]
    fn encode_sets_status_and_content_type() {
        let res = encode(Status::Created, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(res.status_code(), 201);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.body(), br#"{"a":1}"#);
    }

    #[test]
    fn decode_rejects_bad_bodies() {
        assert!(decode::<Named>(b"").is_err());
        assert!(decode::<Named>(b"not json").is_err());
        assert!(decode::<Named>(br#"{"name": 7}"#).is_err());
        assert_eq!(decode::<Named>(br#"{"name":"x"}"#).unwrap().name, "x");
    }

    #[test]
    fn decode_valid_reports_problems() {
        let ctx = Context::background();
        match decode_valid::<Named>(&ctx, br#"{"name":""}"#) {
            Err(DecodeValidError::Invalid { problems, .. }) => {
                assert_eq!(problems["name"], "name is required");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn decode_failure_skips_validation() {
        let err = decode_valid::<Named>(&Context::background(), b"{").unwrap_err();
        assert!(matches!(err, DecodeValidError::Decode(_)));
    }

    #[test]
    fn valid_value_passes_through() {
        let named = decode_valid::<Named>(&Context::background(), br#"{"name":"x"}"#).unwrap();
        assert_eq!(named.name, "x");
    }
}
