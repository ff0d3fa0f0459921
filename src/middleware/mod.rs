mod upload;

use axum::{
    Form, Json,
    body::Body,
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, request::Parts},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};

use crate::{AppState, error::AppError, models::FormData};

pub use upload::{is_image, stored_file_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Multipart,
    UrlEncoded,
    Json,
    Other,
}

impl BodyKind {
    fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime == "multipart/form-data" {
            BodyKind::Multipart
        } else if mime == "application/x-www-form-urlencoded" {
            BodyKind::UrlEncoded
        } else if mime == "application/json" || mime.ends_with("+json") {
            BodyKind::Json
        } else {
            BodyKind::Other
        }
    }
}

/// Parses the request body into [`FormData`] and stores it in the request
/// extensions. Accepted image parts are written to the upload directory.
///
/// Runs at most once per request: if `FormData` is already attached the
/// request passes through untouched.
pub async fn form_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.extensions().get::<FormData>().is_some() {
        return Ok(next.run(req).await);
    }

    let (mut parts, body) = req.into_parts();
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let (form, body) = match BodyKind::from_content_type(content_type) {
        BodyKind::Multipart => {
            let multipart = Multipart::from_request(sub_request(&parts, body), &())
                .await
                .map_err(|e| AppError::UploadError(e.body_text()))?;
            (read_multipart(multipart, &state).await?, Body::empty())
        }
        BodyKind::UrlEncoded => {
            let Form(pairs) =
                Form::<Vec<(String, String)>>::from_request(sub_request(&parts, body), &())
                    .await
                    .map_err(|e| AppError::UploadError(e.body_text()))?;
            (form_from_pairs(pairs), Body::empty())
        }
        BodyKind::Json => {
            let Json(object) =
                Json::<Map<String, Value>>::from_request(sub_request(&parts, body), &())
                    .await
                    .map_err(|e| AppError::UploadError(e.body_text()))?;
            let form = FormData {
                fields: object.into_iter().collect(),
                ..FormData::default()
            };
            (form, Body::empty())
        }
        BodyKind::Other => (FormData::default(), body),
    };

    parts.extensions.insert(form);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// A request carrying only what body extractors look at: method, uri,
/// headers and the body-limit extension.
fn sub_request(parts: &Parts, body: Body) -> Request {
    let mut req = Request::new(body);
    *req.method_mut() = parts.method.clone();
    *req.uri_mut() = parts.uri.clone();
    *req.headers_mut() = parts.headers.clone();
    *req.extensions_mut() = parts.extensions.clone();
    req
}

fn form_from_pairs(pairs: Vec<(String, String)>) -> FormData {
    let mut form = FormData::default();
    for (key, value) in pairs {
        form.fields.insert(key, Value::String(value));
    }
    form
}

async fn read_multipart(mut multipart: Multipart, state: &AppState) -> Result<FormData, AppError> {
    let mut form = FormData::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::UploadError(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        // Only a filename makes a part a file; its content type does not.
        let Some(file_name) = field.file_name().map(str::to_string) else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::UploadError(e.body_text()))?;
            form.fields.insert(name, Value::String(text));
            continue;
        };

        // An empty file input still sends a part, with `filename=""`.
        if file_name.is_empty() {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !is_image(&content_type) {
            tracing::debug!(
                field = %name,
                file = %file_name,
                content_type = %content_type,
                "Dropping non-image upload"
            );
            continue;
        }

        let file = upload::save_field(field, name.clone(), file_name, content_type, &state.uploads)
            .await?;
        form.files.insert(name, file);
    }

    Ok(form)
}
