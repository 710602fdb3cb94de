use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "yarn-matcher")]
#[command(about = "編み図の指定糸と手持ちの糸在庫を照合するツール", long_about = None)]
pub struct Cli {
    /// 省略時は match
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// 編み図JSONを在庫と照合してHTMLレポートを生成
    Match(MatchArgs),

    /// 在庫テーブルの接続設定
    Config {
        /// APIトークンを設定
        #[arg(long)]
        set_token: Option<String>,

        /// ベースIDを設定
        #[arg(long)]
        set_base: Option<String>,

        /// テーブル名を設定
        #[arg(long)]
        set_table: Option<String>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct MatchArgs {
    /// 編み図JSONファイル（省略時は貼り付け入力）
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// 番手の許容相対誤差（デフォルト: 設定値 0.15）
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// 要件ごとの候補数（デフォルト: 設定値 3）
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// レポートの出力ディレクトリ
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// 生成後にブラウザで開かない
    #[arg(long)]
    pub no_open: bool,
}

impl Cli {
    /// サブコマンド省略時は引数なしの match とみなす
    pub fn command_or_default(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Match(MatchArgs::default()))
    }
}
