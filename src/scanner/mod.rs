use crate::error::{ConverterError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "JPG", "JPEG", "PNG", "WEBP"];

/// 引数のパスを入力ファイル一覧に展開する
///
/// - ファイル: そのまま（形式の検証はレジストリ側で行う）
/// - フォルダ: 直下の画像ファイルのみ、ファイル名順
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_dir() {
            inputs.extend(scan_folder(path)?);
        } else if path.is_file() {
            inputs.push(path.clone());
        } else {
            return Err(ConverterError::FileNotFound(path.display().to_string()));
        }
    }

    Ok(inputs)
}

pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(ConverterError::FileNotFound(folder.display().to_string()));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .map(|ext| is_image_extension(&ext.to_string_lossy()))
                .unwrap_or(false)
        })
        .collect();

    // ファイル名でソート
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(images)
}

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext)
}
