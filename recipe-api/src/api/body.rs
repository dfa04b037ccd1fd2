//! Request body extraction for write endpoints
//!
//! Writes accept JSON, urlencoded forms and multipart forms. Form fields all
//! arrive as strings; when a key repeats, the last value wins.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

/// Body encodings understood by [`Payload`]
#[derive(Debug, Clone, PartialEq, Eq)]
enum BodyKind {
    Json,
    UrlEncoded,
    Multipart,
    Unsupported(String),
}

impl BodyKind {
    /// Classify a `Content-Type` header value
    ///
    /// A missing header is treated as JSON so the JSON extractor reports it.
    fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return BodyKind::Json;
        };
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "application/json" => BodyKind::Json,
            "application/x-www-form-urlencoded" => BodyKind::UrlEncoded,
            "multipart/form-data" => BodyKind::Multipart,
            m if m.starts_with("application/") && m.ends_with("+json") => BodyKind::Json,
            _ => BodyKind::Unsupported(mime),
        }
    }
}

/// Deserialized request body in any supported encoding
#[derive(Debug)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());

        match BodyKind::from_content_type(content_type) {
            BodyKind::Json => {
                let Json(value) = Json::<T>::from_request(req, state).await?;
                Ok(Payload(value))
            }
            BodyKind::UrlEncoded => {
                let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                from_fields(fields)
            }
            BodyKind::Multipart => {
                let mut multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;

                let mut fields = Vec::new();
                while let Some(field) = multipart
                    .next_field()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?
                {
                    let Some(name) = field.name().map(str::to_string) else {
                        continue;
                    };
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    fields.push((name, text));
                }
                from_fields(fields)
            }
            BodyKind::Unsupported(mime) => Err(ApiError::UnsupportedMediaType(format!(
                "Unsupported media type \"{}\" in request.",
                mime
            ))),
        }
    }
}

/// Build a payload from form fields
fn from_fields<T: DeserializeOwned>(fields: Vec<(String, String)>) -> ApiResult<Payload<T>> {
    let object: Map<String, Value> = fields
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();

    serde_json::from_value(Value::Object(object))
        .map(Payload)
        .map_err(|e| ApiError::BadRequest(format!("Form parse error - {}", e)))
}
