//! 変換結果の保存先
//!
//! - DirLocators: ローカル変換の出力フォルダ
//! - RemoteLocators: サーバー上の `/webp/<name>`

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use reqwest::Url;
use tracing::{debug, warn};
use webp_converter_common::{Error, Locator, LocatorStore, Result};

/// 変換結果をディレクトリに書き出すストア
///
/// 同名の出力が公開中の場合は `<stem>-<n>.webp` にずらす。
/// 解放時にファイルを削除する。
#[derive(Debug)]
pub struct DirLocators {
    dir: PathBuf,
    live: HashSet<PathBuf>,
}

impl DirLocators {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            live: HashSet::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn free_path(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !self.live.contains(&candidate) {
            return candidate;
        }

        let path = Path::new(file_name);
        let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        let ext = path.extension().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();

        (1u32..)
            .map(|n| self.dir.join(format!("{}-{}.{}", stem, n, ext)))
            .find(|p| !self.live.contains(p))
            .unwrap_or(candidate)
    }
}

impl LocatorStore for DirLocators {
    fn publish(&mut self, file_name: &str, payload: &[u8]) -> Result<Locator> {
        let path = self.free_path(file_name);
        std::fs::write(&path, payload)?;
        debug!(path = %path.display(), size = payload.len(), "artifact written");

        let locator = Locator::new(path.display().to_string());
        self.live.insert(path);
        Ok(locator)
    }

    fn release(&mut self, locator: &Locator) {
        let path = PathBuf::from(locator.as_str());
        if !self.live.remove(&path) {
            return;
        }
        if let Err(e) = std::fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "failed to remove released artifact");
        }
    }
}

/// サーバー上の `/webp/<name>` を参照するストア（実体はサーバーが持つ）
#[derive(Debug, Clone)]
pub struct RemoteLocators {
    base: Url,
    released: Vec<Locator>,
}

impl RemoteLocators {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            released: Vec::new(),
        }
    }

    pub fn released(&self) -> &[Locator] {
        &self.released
    }
}

impl LocatorStore for RemoteLocators {
    fn publish(&mut self, file_name: &str, _payload: &[u8]) -> Result<Locator> {
        let url = self
            .base
            .join(&format!("webp/{}", file_name))
            .map_err(|e| Error::Locator(format!("bad artifact url: {}", e)))?;
        Ok(Locator::new(url.to_string()))
    }

    fn release(&mut self, locator: &Locator) {
        self.released.push(locator.clone());
    }
}
