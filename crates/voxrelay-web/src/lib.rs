//! Browser voice client, baked into the binary as static assets.
//!
//! Uses `rust-embed` to embed the `ui/` directory. The `debug-embed`
//! feature embeds the assets in debug builds too, so the binary is
//! self-contained regardless of profile.

use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "ui/"]
struct UiAssets;

/// Build an axum `Router` that serves the embedded voice client.
///
/// Register this **after** `/ws/voice` and `/health` so those routes take
/// priority over the catch-all.
pub fn ui_router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/{*path}", get(static_handler))
}

async fn index_handler() -> impl IntoResponse {
    serve_file("index.html")
}

async fn static_handler(Path(path): Path<String>) -> impl IntoResponse {
    serve_file(&path)
}

fn serve_file(path: &str) -> Response {
    match UiAssets::get(path) {
        Some(asset) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                asset.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, Html("<h1>404</h1>")).into_response(),
    }
}
