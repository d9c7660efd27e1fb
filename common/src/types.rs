//! 変換対象・変換結果の型定義
//!
//! クライアントとサーバーで共有される型:
//! - IncomingFile: ドロップ/選択されたファイル（未検証）
//! - UploadedFile: レジストリに登録されたファイル
//! - ConvertedArtifact: WebP変換結果
//! - UploadedFileInfo / ConvertedFileInfo / ConvertRequest: HTTPのJSON形式

use crate::error::{Error, Result};
use crate::registry::MAX_FILE_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// 受け付ける画像形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeType {
    Jpeg,
    Png,
    Webp,
}

impl MimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::Jpeg => "image/jpeg",
            MimeType::Png => "image/png",
            MimeType::Webp => "image/webp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MimeType::Jpeg => "JPEG",
            MimeType::Png => "PNG",
            MimeType::Webp => "WEBP",
        }
    }

    pub fn parse(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(MimeType::Jpeg),
            "image/png" => Some(MimeType::Png),
            "image/webp" => Some(MimeType::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 拡張子からMIMEタイプを推定（ブラウザの `File.type` 相当）
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// 出力ファイル名 `<stem>.webp`
pub fn webp_file_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());
    format!("{}.webp", stem)
}

/// ドロップ/選択されたファイル（検証前）
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub mime_type: String,
    pub payload: Arc<[u8]>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, payload: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    /// ファイルを読み込んで作成
    ///
    /// 上限を超えるファイルは読み込まずに `TooLarge` を返す。
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let size = std::fs::metadata(path)?.len();
        if size > MAX_FILE_SIZE {
            return Err(Error::TooLarge { name, size });
        }

        let payload = std::fs::read(path)?;
        Ok(Self::new(name, mime_from_path(path), payload))
    }

    pub fn size_bytes(&self) -> u64 {
        self.payload.len() as u64
    }
}

/// レジストリに登録済みのファイル。作成後は変更されない。
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// 登録ごとに一意なID（同名の再登録と区別する）
    pub id: u64,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: MimeType,
    pub payload: Arc<[u8]>,
}

/// 変換結果の参照先（blob URL、ファイルパス、サーバーパス）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// WebP変換結果
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedArtifact {
    pub source_name: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub locator: Locator,
}

/// 圧縮品質（0-100）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompressionQuality(u8);

impl CompressionQuality {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Result<Self> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::QualityRange(value))
        }
    }

    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// 0.0-1.0スケール
    pub fn as_unit(&self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for CompressionQuality {
    fn default() -> Self {
        Self(80)
    }
}

impl fmt::Display for CompressionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================
// HTTP JSON形式
// =============================================

/// `POST /uploads` の multipart フィールド名
pub const UPLOAD_FIELD: &str = "images";

/// `POST /uploads` のレスポンス要素
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileInfo {
    pub original_name: String,
    pub file_name: String,
    pub size: u64,
}

/// `POST /convert` のレスポンス要素
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedFileInfo {
    pub file_name: String,
    pub size: u64,
}

/// `POST /convert` のファイル指定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub file_name: String,
}

/// `{ files: [...] }` 形式のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesResponse<T> {
    pub files: Vec<T>,
}

/// `{ error: "..." }` 形式のエラーレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// 圧縮レベル。スライダーの値が文字列のまま送られてくる場合がある。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompressionLevel {
    Number(f64),
    Text(String),
}

impl CompressionLevel {
    /// 整数の品質値に変換（先頭の整数部分のみ解釈、0-100に丸める）
    pub fn to_quality(&self) -> Option<CompressionQuality> {
        let value = match self {
            CompressionLevel::Number(n) if n.is_finite() => n.trunc() as i64,
            CompressionLevel::Number(_) => return None,
            CompressionLevel::Text(s) => parse_leading_int(s)?,
        };
        Some(CompressionQuality::clamped(value))
    }
}

impl From<CompressionQuality> for CompressionLevel {
    fn from(quality: CompressionQuality) -> Self {
        CompressionLevel::Number(quality.value() as f64)
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}

/// `POST /convert` のリクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub compression_level: CompressionLevel,
    #[serde(default)]
    pub files: Vec<FileRef>,
}
