use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "webp-converter")]
#[command(about = "JPEG/PNG → WebP 変換ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// アップロード変換サーバーを起動
    Serve {
        /// 待ち受けポート（デフォルト: 設定値）
        #[arg(short, long)]
        port: Option<u16>,

        /// アップロードの保存先
        #[arg(long)]
        staging_dir: Option<PathBuf>,

        /// 変換後WebPの保存先
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// フロントエンドの静的ファイル
        #[arg(long)]
        public_dir: Option<PathBuf>,
    },

    /// 画像をローカルでWebPに変換
    Convert {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// 品質 (0-100)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
        quality: Option<u8>,

        /// 出力フォルダ
        #[arg(short, long, default_value = "webp")]
        output: PathBuf,

        /// WebPの入力も受け付ける
        #[arg(long)]
        allow_webp: bool,
    },

    /// サーバーにアップロードして変換
    Remote {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// サーバーURL
        #[arg(short, long, default_value = "http://127.0.0.1:3000")]
        server: String,

        /// 品質 (0-100)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
        quality: Option<u8>,
    },

    /// 設定を表示/編集
    Config {
        /// 待ち受けポートを設定
        #[arg(long)]
        set_port: Option<u16>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert() {
        let cli = Cli::parse_from(["webp-converter", "convert", "a.png", "photos", "-q", "60"]);
        match cli.command {
            Commands::Convert { paths, quality, output, allow_webp } => {
                assert_eq!(paths, vec![PathBuf::from("a.png"), PathBuf::from("photos")]);
                assert_eq!(quality, Some(60));
                assert_eq!(output, PathBuf::from("webp"));
                assert!(!allow_webp);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["webp-converter", "convert", "a.png", "-q", "101"]).is_err());
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::parse_from(["webp-converter", "serve", "--port", "8080", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Serve { port: Some(8080), .. }));
    }
}
