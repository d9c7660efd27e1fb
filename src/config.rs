use crate::error::{ConverterError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const PORT_ENV: &str = "WEBP_CONVERTER_PORT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// アップロードされたファイルの置き場
    pub staging_dir: PathBuf,
    /// 変換後のWebP置き場
    pub output_dir: PathBuf,
    /// フロントエンドの静的ファイル（存在すれば配信）
    pub public_dir: Option<PathBuf>,
    /// リクエストボディの上限（バイト）
    pub max_body_bytes: usize,
    pub default_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            staging_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("webp"),
            public_dir: Some(PathBuf::from("public")),
            max_body_bytes: 64 * 1024 * 1024,
            default_quality: 80,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み（無ければデフォルト）、環境変数で上書き
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(std::env::var(PORT_ENV).ok().as_deref())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConverterError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("webp-converter").join("config.json"))
    }

    /// 環境変数のポート指定を優先
    fn apply_env(&mut self, port: Option<&str>) -> Result<()> {
        if let Some(port) = port {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConverterError::Config(format!("{} が不正です: {}", PORT_ENV, port)))?;
        }
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<()> {
        self.port = port;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.staging_dir, PathBuf::from("uploads"));
        assert_eq!(config.output_dir, PathBuf::from("webp"));
        assert_eq!(config.default_quality, 80);
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            port: 8080,
            public_dir: None,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.port, 8080);
        assert_eq!(loaded.public_dir, None);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"port": 4000}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.staging_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_env_port_override() {
        let mut config = Config::default();
        config.apply_env(Some("5050")).unwrap();
        assert_eq!(config.port, 5050);

        config.apply_env(None).unwrap();
        assert_eq!(config.port, 5050);

        assert!(matches!(config.apply_env(Some("abc")), Err(ConverterError::Config(_))));
    }
}
