//! JSON body extractor that answers bad bodies in the validation error shape.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Field under which a body-level rejection is reported.
pub const BODY_FIELD: &str = "body";

/// Drop-in replacement for [`Json`] on request bodies.
///
/// A body that is not valid JSON, or whose shape does not match `T`, becomes
/// a 422 `{"message", "errors": {"body": [..]}}` instead of axum's plain-text
/// rejection.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                tracing::debug!(error = %e.body_text(), "JSON body has the wrong shape");
                Self::field(BODY_FIELD, "The request body has fields of the wrong type.")
            }
            JsonRejection::JsonSyntaxError(e) => {
                tracing::debug!(error = %e.body_text(), "JSON body does not parse");
                Self::field(BODY_FIELD, "The request body must be valid JSON.")
            }
            JsonRejection::MissingJsonContentType(_) => Self::field(
                BODY_FIELD,
                "The request body must be sent as application/json.",
            ),
            other => Self::BadRequest(other.body_text()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{StatusCode, header},
        routing::post,
    };
    use serde::Deserialize;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    #[derive(Deserialize)]
    struct Form {
        name: String,
    }

    async fn echo(JsonBody(form): JsonBody<Form>) -> String {
        form.name
    }

    async fn post_body(content_type: &str, body: &'static str) -> (StatusCode, Vec<u8>) {
        let response = Router::new()
            .route("/", post(echo))
            .oneshot(
                axum::http::Request::post("/")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn body_errors(bytes: &[u8]) -> Value {
        let body: Value = serde_json::from_slice(bytes).unwrap();
        assert!(body["message"].is_string());
        body["errors"][BODY_FIELD].clone()
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let (status, bytes) = post_body("application/json", r#"{"name":"Siti"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"Siti");
    }

    #[tokio::test]
    async fn test_type_mismatch_is_validation_error() {
        let (status, bytes) = post_body("application/json", r#"{"name":1.5}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_errors(&bytes),
            serde_json::json!(["The request body has fields of the wrong type."])
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let (status, bytes) = post_body("application/json", r#"{"name":"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_errors(&bytes).is_array());
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_validation_error() {
        let (status, bytes) = post_body("text/plain", r#"{"name":"Siti"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_errors(&bytes).is_array());
    }
}
