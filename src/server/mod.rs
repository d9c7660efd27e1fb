//! アップロード変換サーバー
//!
//! - `POST /uploads`: multipart でステージングへ保存
//! - `POST /convert`: ステージング上のファイルをWebPへ変換
//! - `GET /uploads/{name}`, `GET /webp/{name}`: ファイル配信

pub mod convert;
pub mod storage;
pub mod upload;

use std::convert::Infallible;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info};
use webp_converter_common::ErrorResponse;

use crate::config::Config;
use crate::error::{ConverterError, Result};
pub use storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
}

/// クライアントに返すエラー。詳細はログにだけ残す。
#[derive(Debug)]
pub enum ApiError {
    Upload(String),
    Convert(String),
    InvalidLevel,
}

impl ApiError {
    pub fn upload(e: impl Display) -> Self {
        ApiError::Upload(e.to_string())
    }

    pub fn convert(e: impl Display) -> Self {
        ApiError::Convert(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Upload(detail) => {
                error!(%detail, "upload failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to upload files.")
            }
            ApiError::Convert(detail) => {
                error!(%detail, "convert failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to convert files.")
            }
            ApiError::InvalidLevel => (StatusCode::BAD_REQUEST, "Invalid compression level."),
        };

        let body = ErrorResponse {
            error: message.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// ルーターを組み立てる（ディレクトリが無ければ作成）
pub fn app(config: &Config) -> Result<Router> {
    let storage = Storage::new(config.staging_dir.clone(), config.output_dir.clone());
    storage.ensure_dirs()?;

    let state = AppState {
        storage: Arc::new(storage),
    };

    let router = Router::new()
        .route("/uploads", post(upload::upload))
        .route("/uploads/{name}", get(staged_file))
        .route("/convert", post(convert::convert))
        .route("/webp/{name}", get(webp_file))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state);

    // フロントエンドがあれば残りのパスで配信
    let router = match &config.public_dir {
        Some(public) if public.is_dir() => router.fallback_service(ServeDir::new(public)),
        _ => router,
    };

    Ok(router)
}

/// 設定のホスト/ポートで待ち受ける
pub async fn serve(config: &Config) -> Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|e| ConverterError::Config(format!("{}:{} で待ち受けできません: {}", config.host, config.port, e)))?;
    let address: SocketAddr = listener.local_addr()?;

    info!(url = %format!("http://{}/", address), "starting a HTTP server");
    serve_listener(listener, config).await
}

/// バインド済みのリスナーで待ち受ける
pub async fn serve_listener(listener: TcpListener, config: &Config) -> Result<()> {
    let router = app(config)?;
    axum::serve(listener, router).await?;
    Ok(())
}

async fn staged_file(State(state): State<AppState>, Path(name): Path<String>, request: Request) -> Response {
    match state.storage.staged_path(&name) {
        Ok(path) => send_file(path, request).await,
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn webp_file(State(state): State<AppState>, Path(name): Path<String>, request: Request) -> Response {
    match state.storage.webp_path(&name) {
        Ok(path) => send_file(path, request).await,
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn send_file(path: std::path::PathBuf, request: Request<Body>) -> Response {
    let result: std::result::Result<_, Infallible> = ServeFile::new(path).oneshot(request).await;
    match result {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
