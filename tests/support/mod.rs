//! 結合テスト用のヘルパー

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tokio::net::TcpListener;
use webp_converter::config::Config;
use webp_converter::server;

/// 写真に近いPNG（グラデーション＋弱いノイズ）。PNGでは縮みにくい。
pub fn photo_png(width: u32, height: u32) -> Vec<u8> {
    let mut seed: u32 = 0x1234_5678;
    let img = RgbImage::from_fn(width, height, |x, y| {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let noise = (seed >> 28) as u8;
        Rgb([
            ((x * 2) % 256) as u8 ^ noise,
            ((y * 2) % 256) as u8 ^ noise,
            128u8.wrapping_add(noise),
        ])
    });

    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode png");
    buf.into_inner()
}

pub fn test_config(root: &Path) -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        staging_dir: root.join("uploads"),
        output_dir: root.join("webp"),
        public_dir: None,
        ..Default::default()
    }
}

/// 空きポートでサーバーを起動し、ベースURLを返す
pub async fn spawn_server(config: &Config) -> String {
    let router = server::app(config).expect("Failed to build router");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let address = listener.local_addr().expect("Failed to read address");

    tokio::spawn(async move { axum::serve(listener, router).await });

    format!("http://{}", address)
}
