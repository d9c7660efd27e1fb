use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("変換するファイルがありません")]
    NoFilesToConvert,

    #[error("不正なファイル名: {0}")]
    InvalidFileName(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("WebPエンコードエラー: {0}")]
    Encode(String),

    #[error("通信エラー: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("サーバーエラー ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] webp_converter_common::Error),
}

pub type Result<T> = std::result::Result<T, ConverterError>;
