//! HTTP bridge from a web board to a GTP engine (GNU Go or KataGo).

pub mod config;
pub mod engine;
pub mod error;
pub mod routes;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Extension, Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;

pub fn router(config: Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/next-move", post(routes::next_move::next_move))
        .layer(Extension(config))
        .layer(cors)
}

/// Serve the bridge on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, config: Config) -> std::io::Result<()> {
    axum::serve(listener, router(config)).await
}
