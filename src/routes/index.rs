use axum::Json;
use serde_json::{Value, json};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello from server!" }))
}

pub async fn api_root() -> Json<Value> {
    Json(json!({ "message": "Hello world!" }))
}
