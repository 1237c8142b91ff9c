use axum::http::header;
use axum::response::IntoResponse;

/// Returns the `OpenAPI` document in YAML, stamped with the crate version.
pub async fn openapi_yaml() -> impl IntoResponse {
    let document = include_str!("../../openapi.yaml");
    let version = env!("CARGO_PKG_VERSION");
    let body = document.replace("version: 0.0.0", &format!("version: {version}"));

    ([(header::CONTENT_TYPE, "text/yaml")], body)
}
