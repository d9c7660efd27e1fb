use axum::extract::State;
use axum::Json;
use tracing::{info, warn};
use webp_converter_common::{CompressionQuality, ConvertRequest, ConvertedFileInfo, FilesResponse};

use super::storage::Storage;
use super::{ApiError, AppState};
use crate::encoder::encode_webp;
use crate::error::{ConverterError, Result};

/// `POST /convert`
///
/// `files` が指定されていればその一覧を、無ければステージング全体を変換する。
/// ファイル単位の失敗はログに残してスキップする。
pub async fn convert(
    State(state): State<AppState>,
    Json(request): Json<ConvertRequest>,
) -> std::result::Result<Json<FilesResponse<ConvertedFileInfo>>, ApiError> {
    let quality = request
        .compression_level
        .to_quality()
        .ok_or(ApiError::InvalidLevel)?;

    let sources: Vec<String> = if request.files.is_empty() {
        state.storage.staged_files().await.map_err(ApiError::convert)?
    } else {
        request.files.into_iter().map(|f| f.file_name).collect()
    };

    info!(count = sources.len(), %quality, "converting staged files");

    let mut files = Vec::new();
    for source in &sources {
        match convert_file(&state.storage, source, quality).await {
            Ok(info) => {
                info!(file = %source, output = %info.file_name, size = info.size, "converted");
                files.push(info);
            }
            Err(e) => warn!(file = %source, error = %e, "conversion failed, skipping"),
        }
    }

    Ok(Json(FilesResponse { files }))
}

async fn convert_file(storage: &Storage, source: &str, quality: CompressionQuality) -> Result<ConvertedFileInfo> {
    let input = tokio::fs::read(storage.staged_path(source)?).await?;
    let (file_name, output) = storage.output_path(source)?;

    let bytes = tokio::task::spawn_blocking(move || encode_webp(&input, quality.value() as f32, None))
        .await
        .map_err(|e| ConverterError::Encode(e.to_string()))??;

    tokio::fs::write(&output, &bytes).await?;
    let size = tokio::fs::metadata(&output).await?.len();

    Ok(ConvertedFileInfo { file_name, size })
}
