//! 表示用の行データ（RowViewState）
//!
//! UploadedFile・ConvertedArtifact・変換状態から毎回導出する。

use crate::types::{ConvertedArtifact, Locator, UploadedFile};

pub const PENDING: &str = "Pending";
pub const FAILED: &str = "Failed";

/// 変換状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStatus {
    Pending,
    InFlight { progress: u8 },
    Converted,
    Failed { reason: String },
}

/// ダウンロードボタンの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    Disabled,
    Enabled { locator: Locator, file_name: String },
}

impl DownloadState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, DownloadState::Enabled { .. })
    }
}

/// テーブル1行分の表示状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowViewState {
    pub file_name: String,
    pub original_size: String,
    pub converted_size: String,
    pub compression: String,
    pub download: DownloadState,
    /// 変換中のみ 0-100
    pub progress: Option<u8>,
}

impl RowViewState {
    pub fn derive(
        file: &UploadedFile,
        artifact: Option<&ConvertedArtifact>,
        status: &ConversionStatus,
    ) -> Self {
        let download = match artifact {
            Some(a) => DownloadState::Enabled {
                locator: a.locator.clone(),
                file_name: a.file_name.clone(),
            },
            None => DownloadState::Disabled,
        };

        let (converted_size, compression) = match (status, artifact) {
            (ConversionStatus::Failed { .. }, _) => (FAILED.to_string(), FAILED.to_string()),
            (ConversionStatus::Converted, Some(a)) => (
                format_size(a.size_bytes),
                format_compression(file.size_bytes, a.size_bytes),
            ),
            _ => (PENDING.to_string(), PENDING.to_string()),
        };

        let progress = match status {
            ConversionStatus::InFlight { progress } => Some(*progress),
            _ => None,
        };

        Self {
            file_name: file.name.clone(),
            original_size: format_size(file.size_bytes),
            converted_size,
            compression,
            download,
            progress,
        }
    }
}

/// サイズ表示（KB、小数2桁）
pub fn format_size(size: u64) -> String {
    format!("{:.2} KB", size as f64 / 1024.0)
}

/// 圧縮率 `(1 - converted / original) * 100` を小数2桁に丸める
pub fn compression_ratio(original: u64, converted: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let ratio = (1.0 - converted as f64 / original as f64) * 100.0;
    (ratio * 100.0).round() / 100.0
}

/// 圧縮率の表示（縮小は `-50.00%`、増加は `+329.64%`）
pub fn format_compression(original: u64, converted: u64) -> String {
    let ratio = compression_ratio(original, converted);
    if ratio > 0.0 {
        format!("-{:.2}%", ratio)
    } else if ratio < 0.0 {
        format!("+{:.2}%", -ratio)
    } else {
        "0.00%".to_string()
    }
}

/// ファイル件数と合計サイズの表示
pub fn format_summary(count: usize, total_size: u64) -> String {
    format!("{} files, total size: {}", count, format_size(total_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MimeType;

    fn file(size: u64) -> UploadedFile {
        UploadedFile {
            id: 1,
            name: "a.png".to_string(),
            size_bytes: size,
            mime_type: MimeType::Png,
            payload: vec![0u8; 0].into(),
        }
    }

    fn artifact(size: u64) -> ConvertedArtifact {
        ConvertedArtifact {
            source_name: "a.png".to_string(),
            file_name: "a.webp".to_string(),
            size_bytes: size,
            locator: Locator::new("blob:1/a.webp"),
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 KB");
        assert_eq!(format_size(2000), "1.95 KB");
        assert_eq!(format_size(1024000), "1000.00 KB");
    }

    #[test]
    fn test_compression_ratio_half() {
        assert_eq!(compression_ratio(1024000, 512000), 50.0);
        assert_eq!(format_compression(1024000, 512000), "-50.00%");
    }

    #[test]
    fn test_compression_ratio_growth() {
        assert_eq!(compression_ratio(1000, 1500), -50.0);
        assert_eq!(format_compression(1000, 1500), "+50.00%");
        assert_eq!(format_compression(14677, 63058), "+329.64%");
        assert_eq!(format_compression(1000, 1000), "0.00%");
    }

    #[test]
    fn test_compression_ratio_rounding() {
        assert_eq!(compression_ratio(3, 1), 66.67);
        assert_eq!(compression_ratio(0, 10), 0.0);
    }

    #[test]
    fn test_format_summary() {
        assert_eq!(format_summary(2, 2048), "2 files, total size: 2.00 KB");
    }

    #[test]
    fn test_row_pending() {
        let row = RowViewState::derive(&file(2000), None, &ConversionStatus::Pending);
        assert_eq!(row.converted_size, PENDING);
        assert_eq!(row.compression, PENDING);
        assert_eq!(row.download, DownloadState::Disabled);
        assert_eq!(row.progress, None);
    }

    #[test]
    fn test_row_converted() {
        let row = RowViewState::derive(&file(1024000), Some(&artifact(512000)), &ConversionStatus::Converted);
        assert_eq!(row.converted_size, "500.00 KB");
        assert_eq!(row.compression, "-50.00%");
        assert!(row.download.is_enabled());
    }

    #[test]
    fn test_row_failed_is_terminal() {
        let status = ConversionStatus::Failed { reason: "boom".into() };
        let row = RowViewState::derive(&file(2000), None, &status);
        assert_eq!(row.converted_size, FAILED);
        assert_eq!(row.compression, FAILED);
        assert_eq!(row.progress, None);
    }

    #[test]
    fn test_row_in_flight_keeps_previous_download() {
        let status = ConversionStatus::InFlight { progress: 40 };
        let row = RowViewState::derive(&file(2000), Some(&artifact(1000)), &status);
        assert_eq!(row.progress, Some(40));
        assert_eq!(row.compression, PENDING);
        assert!(row.download.is_enabled());
    }
}
