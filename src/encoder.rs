//! WebPエンコード
//!
//! デコードは `image`、lossyエンコードは `webp`（libwebp）を使う。

use crate::error::{ConverterError, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use webp_converter_common::{CompressionOptions, Compressor};

/// 画像をWebPにエンコードする
///
/// - `quality`: 0-100
/// - `max_dimension`: 指定時は長辺がこの値を超えないよう縮小（縦横比は維持）
pub fn encode_webp(input: &[u8], quality: f32, max_dimension: Option<u32>) -> Result<Vec<u8>> {
    let img = image::load_from_memory(input)?;

    let img = match max_dimension {
        Some(max) if img.width() > max || img.height() > max => img.resize(max, max, FilterType::Lanczos3),
        _ => img,
    };

    // libwebp に渡せるのは RGB8 / RGBA8 のみ
    let img = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let encoder = webp::Encoder::from_image(&img).map_err(|e| ConverterError::Encode(e.to_string()))?;
    let memory = encoder.encode(quality.clamp(0.0, 100.0));

    Ok(memory.to_vec())
}

/// クライアント側の圧縮処理
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpCompressor;

impl Compressor for WebpCompressor {
    fn compress(
        &self,
        input: &[u8],
        options: &CompressionOptions,
    ) -> webp_converter_common::Result<Vec<u8>> {
        use webp_converter_common::Error;

        if options.file_type != "image/webp" {
            return Err(Error::Compression(format!("unsupported output type: {}", options.file_type)));
        }

        let bytes = encode_webp(
            input,
            options.initial_quality * 100.0,
            Some(options.max_width_or_height),
        )
        .map_err(|e| Error::Compression(e.to_string()))?;

        let limit = options.max_size_bytes();
        if bytes.len() as u64 > limit {
            return Err(Error::Compression(format!(
                "output {} bytes exceeds limit {} bytes",
                bytes.len(),
                limit
            )));
        }

        Ok(bytes)
    }
}
