use axum::extract::{Multipart, State};
use axum::Json;
use tracing::{debug, info};
use webp_converter_common::{FilesResponse, UploadedFileInfo, UPLOAD_FIELD};

use super::storage::sanitize_file_name;
use super::{ApiError, AppState};

/// `POST /uploads`
///
/// 途中で失敗しても保存済みのファイルは残る。
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<FilesResponse<UploadedFileInfo>>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(ApiError::upload)? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "skipping unexpected field");
            continue;
        }
        let Some(original_name) = field.file_name().map(str::to_string) else {
            debug!("skipping part without file name");
            continue;
        };

        let file_name = sanitize_file_name(&original_name).map_err(ApiError::upload)?;
        let bytes = field.bytes().await.map_err(ApiError::upload)?;
        let size = state.storage.save_upload(&file_name, &bytes).await.map_err(ApiError::upload)?;

        info!(file = %file_name, size, "upload stored");
        files.push(UploadedFileInfo {
            original_name,
            file_name,
            size,
        });
    }

    Ok(Json(FilesResponse { files }))
}
