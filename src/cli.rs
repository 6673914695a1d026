use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "product-lens")]
#[command(about = "商品画像のラベル検出・商品説明生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像を解析してラベルと商品説明を出力
    Analyze {
        /// 画像ファイル（JPEG/PNG、4MB未満）
        #[arg(required = true)]
        image: PathBuf,

        /// モデルバージョンID（省略時は設定値または先頭の稼働中バージョン）
        #[arg(short, long)]
        model: Option<String>,

        /// 稼働中バージョンから対話式で選択
        #[arg(short, long)]
        pick: bool,

        /// 解析結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// モデルバージョン一覧を表示（起動・停止の要求も可）
    Models {
        /// 指定バージョンを起動
        #[arg(long, value_name = "ID", conflicts_with = "stop")]
        start: Option<String>,

        /// 起動時の最小推論ユニット数
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        units: u32,

        /// 指定バージョンを停止
        #[arg(long, value_name = "ID")]
        stop: Option<String>,
    },

    /// 設定
    Config {
        /// 既定のモデルバージョンを設定
        #[arg(long)]
        set_model: Option<String>,

        /// 商品説明生成モデルを設定
        #[arg(long)]
        set_description_model: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_models_start_with_units() {
        let args = ["product-lens", "models", "--start", "arn:v1", "--units", "3"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Models { start, units, stop } => {
                assert_eq!(start.as_deref(), Some("arn:v1"));
                assert_eq!(units, 3);
                assert!(stop.is_none());
            }
            _ => panic!("expected models command"),
        }
    }

    #[test]
    fn test_models_defaults_to_listing() {
        let cli = Cli::try_parse_from(["product-lens", "models"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Models { start: None, units: 1, stop: None }
        ));
    }

    #[test]
    fn test_models_rejects_zero_units_and_start_with_stop() {
        let zero_units = ["product-lens", "models", "--start", "a", "--units", "0"];
        assert!(Cli::try_parse_from(zero_units).is_err());

        let both = ["product-lens", "models", "--start", "a", "--stop", "b"];
        assert!(Cli::try_parse_from(both).is_err());
    }
}
