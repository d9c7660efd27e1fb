//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid file type: {name}. Only {allowed} are allowed.")]
    InvalidType { name: String, allowed: String },

    #[error("File too large: {name}. Maximum size is 5MB.")]
    TooLarge { name: String, size: u64 },

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Compression gave up after {attempts} attempts: {reason}")]
    Exhausted { attempts: u32, reason: String },

    #[error("Compression level out of range: {0}")]
    QualityRange(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Locator error: {0}")]
    Locator(String),
}

impl Error {
    /// 取り込み時の検証エラーかどうか
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidType { .. } | Error::TooLarge { .. })
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_type() {
        let error = Error::InvalidType {
            name: "b.txt".to_string(),
            allowed: "JPEG and PNG".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid file type: b.txt. Only JPEG and PNG are allowed."
        );
    }

    #[test]
    fn test_error_display_too_large() {
        let error = Error::TooLarge {
            name: "huge.png".to_string(),
            size: 6 * 1024 * 1024,
        };
        let display = format!("{}", error);
        assert!(display.contains("huge.png"));
        assert!(display.contains("5MB"));
    }

    #[test]
    fn test_error_is_validation() {
        assert!(Error::TooLarge { name: "a".into(), size: 1 }.is_validation());
        assert!(!Error::Compression("boom".into()).is_validation());
        assert!(!Error::Exhausted { attempts: 3, reason: "x".into() }.is_validation());
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn test_error_display_locator() {
        let error = Error::Locator("bad artifact url".into());
        assert_eq!(error.to_string(), "Locator error: bad artifact url");
        assert!(!error.is_validation());
    }
}
