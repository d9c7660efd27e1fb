//! ステージング/出力ディレクトリ
//!
//! 両ディレクトリはプロセス全体で共有し、ロックは取らない。

use std::path::{Path, PathBuf};

use tokio::fs;
use webp_converter_common::webp_file_name;

use crate::error::{ConverterError, Result};

#[derive(Debug, Clone)]
pub struct Storage {
    uploads: PathBuf,
    webp: PathBuf,
}

impl Storage {
    pub fn new(uploads: impl Into<PathBuf>, webp: impl Into<PathBuf>) -> Self {
        Self {
            uploads: uploads.into(),
            webp: webp.into(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads
    }

    pub fn webp_dir(&self) -> &Path {
        &self.webp
    }

    /// 起動時に両ディレクトリを作成
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.uploads)?;
        std::fs::create_dir_all(&self.webp)?;
        Ok(())
    }

    /// アップロードを元のファイル名で保存（同名は上書き）し、バイト数を返す
    pub async fn save_upload(&self, file_name: &str, bytes: &[u8]) -> Result<u64> {
        let path = self.staged_path(file_name)?;
        fs::write(&path, bytes).await?;
        Ok(bytes.len() as u64)
    }

    /// ステージング内の通常ファイル名（列挙順）
    pub async fn staged_files(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.uploads).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    pub fn staged_path(&self, file_name: &str) -> Result<PathBuf> {
        Ok(self.uploads.join(sanitize_file_name(file_name)?))
    }

    pub fn webp_path(&self, file_name: &str) -> Result<PathBuf> {
        Ok(self.webp.join(sanitize_file_name(file_name)?))
    }

    /// 元ファイル名に対応する出力パス（`<stem>.webp`）
    pub fn output_path(&self, source_name: &str) -> Result<(String, PathBuf)> {
        let output_name = webp_file_name(&sanitize_file_name(source_name)?);
        let path = self.webp.join(&output_name);
        Ok((output_name, path))
    }
}

/// パス区切りを含む名前は最後の要素だけ使う
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();

    if last.is_empty() || last == "." || last == ".." || last.contains('\0') {
        return Err(ConverterError::InvalidFileName(name.to_string()));
    }

    Ok(last.to_string())
}
