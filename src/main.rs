use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, MatchArgs};
use config::Config;
use tracing_subscriber::EnvFilter;
use yarn_matcher::inventory::AirtableReader;
use yarn_matcher::matcher::MatchOptions;
use yarn_matcher::{cli, config, export, pipeline, prompt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("エラー: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load().context("設定を読み込めません")?;

    match cli.command_or_default() {
        Commands::Match(args) => run_match(&config, args).await,

        Commands::Config { set_token, set_base, set_table, show } => {
            let has_updates = set_token.is_some() || set_base.is_some() || set_table.is_some();

            if let Some(token) = set_token {
                config.api_token = Some(token);
            }
            if let Some(base) = set_base {
                config.base_identifier = Some(base);
            }
            if let Some(table) = set_table {
                config.table_name = table;
            }
            if !has_updates && !show {
                prompt::prompt_credentials(&mut config)?;
            }
            if has_updates || !show {
                config.save().context("設定を保存できません")?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show {
                println!("設定:");
                println!("  APIトークン: {}", config.masked_token());
                println!("  ベースID: {}", config.base_identifier.as_deref().unwrap_or("未設定"));
                println!("  テーブル: {}", config.table_name);
                println!("  API URL: {}", config.api_url);
                println!("  出力先: {}", config.reports_dir.display());
                println!("  許容誤差: {}", config.threshold);
                println!("  候補数: {}", config.top_k);
            }
            Ok(())
        }
    }
}

async fn run_match(config: &Config, args: MatchArgs) -> Result<()> {
    println!("🧶 yarn-matcher - 在庫照合\n");

    // 認証情報は入力を求める前に確認する
    let reader = AirtableReader::new(config.inventory_config()?)?;

    let text = match &args.input {
        Some(path) => prompt::read_pattern_file(path)
            .with_context(|| format!("編み図JSONを読み込めません: {}", path.display()))?,
        None => prompt::prompt_pattern_json()?,
    };

    let options = MatchOptions {
        threshold: args.threshold.unwrap_or(config.threshold),
        top_k: args.top_k.unwrap_or(config.top_k),
        ..MatchOptions::default()
    };
    let output_dir = args.output_dir.unwrap_or_else(|| config.reports_dir.clone());

    let outcome = pipeline::run_match(&text, &reader, &options, &output_dir).await?;

    let unmatched = outcome.unmatched_labels();
    if !unmatched.is_empty() {
        println!("\n⚠ 在庫に近い糸がない要件: {}", unmatched.join(", "));
    }

    if !args.no_open && !export::open_report(&outcome.report_path) {
        println!("レポートを開けませんでした。ブラウザで直接開いてください: {}", outcome.report_path.display());
    }

    println!("\n✅ 完了");
    Ok(())
}
