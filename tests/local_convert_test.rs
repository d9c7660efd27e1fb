//! ローカル変換の結合テスト

mod support;

use std::path::PathBuf;
use std::sync::Arc;

use support::photo_png;
use tempfile::tempdir;
use webp_converter::client::{convert_all, driver, DirLocators};
use webp_converter::encoder::WebpCompressor;
use webp_converter::scanner;
use webp_converter_common::{
    Admission, ConversionStatus, Error, FileRegistry, IncomingFile, JobOutcome, Session,
};

/// a.png は登録され、b.txt は拒否される。変換後は出力フォルダに a.webp ができる。
#[tokio::test]
async fn test_folder_to_webp() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("photos");
    let output = dir.path().join("out");
    std::fs::create_dir(&input).unwrap();

    let png = photo_png(128, 128);
    std::fs::write(input.join("a.png"), &png).unwrap();
    let txt = input.join("b.txt");
    std::fs::write(&txt, "hello").unwrap();

    // フォルダ展開では画像のみ、明示したファイルはそのまま渡る
    let paths = scanner::collect_inputs(&[input.clone(), txt]).unwrap();
    assert_eq!(paths, vec![input.join("a.png"), input.join("b.txt")]);

    let mut registry = FileRegistry::new(DirLocators::new(&output).unwrap());
    let admissions = registry.accept_all(paths.iter().map(|p| IncomingFile::from_path(p).unwrap()));

    assert!(matches!(admissions[0].1, Ok(Admission::Registered)));
    assert!(matches!(admissions[1].1, Err(Error::InvalidType { .. })));
    assert_eq!(registry.names(), vec!["a.png".to_string()]);

    let session = driver::shared(Session::new(registry));
    let outcomes = convert_all(&session, Arc::new(WebpCompressor), |_, _| {}).await.unwrap();

    assert_eq!(outcomes.len(), 1);
    let JobOutcome::Converted(artifact) = &outcomes[0].1 else {
        panic!("expected conversion to succeed: {:?}", outcomes[0].1);
    };
    assert_eq!(artifact.file_name, "a.webp");
    assert!(artifact.size_bytes < png.len() as u64);

    let written = std::fs::read(PathBuf::from(artifact.locator.as_str())).unwrap();
    assert_eq!(written.len() as u64, artifact.size_bytes);
    assert_eq!(&written[8..12], b"WEBP");

    let session = session.lock().unwrap();
    let entry = session.registry().get("a.png").unwrap();
    assert_eq!(entry.status, ConversionStatus::Converted);
    assert!(entry.row().compression.starts_with('-'));
}

/// 削除すると出力ファイルも消える
#[tokio::test]
async fn test_remove_deletes_written_artifact() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("out");

    let mut registry = FileRegistry::new(DirLocators::new(&output).unwrap());
    registry
        .accept(IncomingFile::new("a.png", "image/png", photo_png(128, 128)))
        .unwrap();

    let session = driver::shared(Session::new(registry));
    convert_all(&session, Arc::new(WebpCompressor), |_, _| {}).await.unwrap();
    assert!(output.join("a.webp").exists());

    let mut session = session.lock().unwrap();
    assert!(session.registry_mut().remove("a.png"));
    assert!(!output.join("a.webp").exists());
    assert!(session.registry().is_empty());
}
