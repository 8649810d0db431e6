//! Request extractors that report bad input as `request_validation` errors
//! instead of axum's plain-text rejections.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::{
    error::{Error, FieldError},
    validation::validate_object_id,
};

/// JSON body extractor. Syntax errors, missing fields and wrong types become
/// a 400 naming the field when serde reports one.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(json_rejection_to_error(rejection)),
        }
    }
}

fn json_rejection_to_error(rejection: JsonRejection) -> Error {
    let detail = rejection.body_text();
    let path = match &rejection {
        JsonRejection::JsonDataError(_) => field_from_serde_message(&detail).unwrap_or("body"),
        JsonRejection::MissingJsonContentType(_) => "headers/content-type",
        _ => "body",
    };
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => "must be application/json".to_string(),
        _ => detail.clone(),
    };

    Error::Validation {
        message: format!("request/{} {}", path, message),
        errors: vec![FieldError {
            path: path.to_string(),
            message,
        }],
    }
}

/// Picks the field name out of serde messages such as
/// "missing field `email`" or "body.hours: invalid type ...".
fn field_from_serde_message(message: &str) -> Option<&str> {
    if let Some(start) = message.find("missing field `") {
        let rest = &message[start + "missing field `".len()..];
        return rest.find('`').map(|end| &rest[..end]);
    }

    // axum prefixes data errors with the failing path: "...: <path>: <reason>"
    let (_, rest) = message.split_once(": ")?;
    let (path, _) = rest.split_once(": ")?;
    let path = path.trim();
    (!path.is_empty() && !path.contains(' ')).then_some(path)
}

/// `{id}` path segment holding a 24-hex object id.
#[derive(Debug, Clone)]
pub struct ObjectIdPath(pub String);

impl<S> FromRequestParts<S> for ObjectIdPath
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e: PathRejection| Error::validation("id", e.body_text()))?;

        validate_object_id("id", &id)?;
        Ok(ObjectIdPath(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_from_missing_field_message() {
        let message = "Failed to deserialize the JSON body into the target type: missing field `email` at line 1 column 2";
        assert_eq!(field_from_serde_message(message), Some("email"));
    }

    #[test]
    fn test_field_from_path_prefixed_message() {
        let message = "Failed to deserialize the JSON body into the target type: hours: invalid type: string \"x\", expected f64 at line 1 column 12";
        assert_eq!(field_from_serde_message(message), Some("hours"));
    }

    #[test]
    fn test_no_field_in_message() {
        assert_eq!(field_from_serde_message("Expected request with `Content-Type: application/json`"), None);
    }
}
