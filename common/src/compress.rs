//! 圧縮リクエストとリトライ方針
//!
//! 圧縮処理そのものは `Compressor` の実装側が担当する。
//! ここでは試行ごとの品質計算と、結果の受理判定だけを行う。

use crate::error::{Error, Result};
use crate::types::CompressionQuality;

/// 最大試行回数（初回を含む）
pub const MAX_ATTEMPTS: u32 = 3;

/// 試行ごとに下げる品質（0.0-1.0スケール）
pub const QUALITY_STEP: f32 = 0.1;

/// 出力サイズ上限（MB）
pub const MAX_SIZE_MB: f32 = 1.0;

/// 長辺の最大ピクセル数
pub const MAX_WIDTH_OR_HEIGHT: u32 = 1920;

/// 圧縮リクエスト
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOptions {
    pub file_type: &'static str,
    /// 0.0-1.0
    pub initial_quality: f32,
    pub max_size_mb: f32,
    pub max_width_or_height: u32,
    /// バックグラウンドスレッドでのエンコードを許可
    pub use_web_worker: bool,
}

impl CompressionOptions {
    pub fn new(quality: CompressionQuality) -> Self {
        Self {
            file_type: "image/webp",
            initial_quality: quality.as_unit(),
            max_size_mb: MAX_SIZE_MB,
            max_width_or_height: MAX_WIDTH_OR_HEIGHT,
            use_web_worker: true,
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        (self.max_size_mb * 1024.0 * 1024.0) as u64
    }

    /// 指定試行の品質を持つコピーを返す（元のオプションは変更しない）
    pub fn for_attempt(&self, attempt: u32) -> Self {
        Self {
            initial_quality: quality_for_attempt(self.initial_quality, attempt),
            ..self.clone()
        }
    }
}

/// 試行番号（0始まり）に対する品質
pub fn quality_for_attempt(initial_quality: f32, attempt: u32) -> f32 {
    (initial_quality - QUALITY_STEP * attempt as f32).clamp(0.0, 1.0)
}

/// 画像を圧縮する外部処理
pub trait Compressor: Send + Sync {
    fn compress(&self, input: &[u8], options: &CompressionOptions) -> Result<Vec<u8>>;
}

impl<F> Compressor for F
where
    F: Fn(&[u8], &CompressionOptions) -> Result<Vec<u8>> + Send + Sync,
{
    fn compress(&self, input: &[u8], options: &CompressionOptions) -> Result<Vec<u8>> {
        self(input, options)
    }
}

/// 1回の試行の結果
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Smaller { size: u64 },
    NotSmaller { size: u64 },
    Failed { reason: String },
}

/// 試行の通知（進捗表示用）
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// 0始まり
    pub index: u32,
    pub quality: f32,
}

/// 受理された圧縮結果
#[derive(Debug, Clone, PartialEq)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub quality: f32,
    pub attempts: u32,
}

/// 入力より小さい結果が出るまで品質を下げて再試行する
///
/// `on_attempt` は各試行の直前に、`on_outcome` は直後に呼ばれる。
/// 全試行で失敗した場合は `Error::Exhausted` を返す。
pub fn compress_with_retries<C>(
    compressor: &C,
    input: &[u8],
    options: &CompressionOptions,
    mut on_attempt: impl FnMut(&Attempt),
    mut on_outcome: impl FnMut(&Attempt, &AttemptOutcome),
) -> Result<Compressed>
where
    C: Compressor + ?Sized,
{
    let input_size = input.len() as u64;
    let mut last_reason = String::from("no attempt made");

    for index in 0..MAX_ATTEMPTS {
        let attempt_options = options.for_attempt(index);
        let attempt = Attempt {
            index,
            quality: attempt_options.initial_quality,
        };
        on_attempt(&attempt);

        match compressor.compress(input, &attempt_options) {
            Ok(bytes) if (bytes.len() as u64) < input_size => {
                on_outcome(&attempt, &AttemptOutcome::Smaller { size: bytes.len() as u64 });
                return Ok(Compressed {
                    bytes,
                    quality: attempt.quality,
                    attempts: index + 1,
                });
            }
            Ok(bytes) => {
                let size = bytes.len() as u64;
                last_reason = format!("output {} bytes is not smaller than input {} bytes", size, input_size);
                on_outcome(&attempt, &AttemptOutcome::NotSmaller { size });
            }
            Err(e) => {
                last_reason = e.to_string();
                on_outcome(&attempt, &AttemptOutcome::Failed { reason: last_reason.clone() });
            }
        }
    }

    Err(Error::Exhausted {
        attempts: MAX_ATTEMPTS,
        reason: last_reason,
    })
}
