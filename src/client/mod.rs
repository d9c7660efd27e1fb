//! クライアント側の変換ドライバ
//!
//! - driver: ローカル圧縮（ファイルごとに並行実行）
//! - remote: サーバーへアップロードして変換
//! - locators: 変換結果の保存先

pub mod driver;
pub mod locators;
pub mod remote;

pub use driver::{convert_all, SharedSession};
pub use locators::{DirLocators, RemoteLocators};
pub use remote::{convert_remote, RemoteClient};
