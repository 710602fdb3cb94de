//! 編み図JSONの入力と対話式の設定

use crate::config::Config;
use crate::error::{Result, YarnMatcherError};
use dialoguer::{Input, Password};
use std::io::BufRead;
use std::path::Path;

/// 入力の終わりを示す行
pub const END_MARKER: &str = "END";

/// EOFか `END` だけの行まで読み、前後の空白を除いた本文を返す
pub fn read_until_end<R: BufRead>(reader: R) -> Result<String> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim() == END_MARKER {
            break;
        }
        lines.push(line);
    }

    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        return Err(YarnMatcherError::EmptyInput);
    }
    Ok(text)
}

/// 標準入力から編み図JSONを受け取る
pub fn prompt_pattern_json() -> Result<String> {
    println!("編み図の解析結果JSONを貼り付けてください。");
    println!("入力後、`{}` だけの行を入力するか Ctrl+D で確定します。", END_MARKER);
    println!("---");

    let stdin = std::io::stdin();
    let text = read_until_end(stdin.lock())?;
    println!("---");
    Ok(text)
}

/// ファイルから編み図JSONを読む
pub fn read_pattern_file(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    read_until_end(content.as_bytes())
}

/// 認証情報を対話式で設定する（空欄は現在の値を維持）
pub fn prompt_credentials(config: &mut Config) -> Result<()> {
    println!("在庫テーブルの接続設定（空欄で現在の値を維持）");
    println!("  現在のトークン: {}", config.masked_token());

    let token = Password::new()
        .with_prompt("APIトークン")
        .allow_empty_password(true)
        .interact()
        .map_err(|e| YarnMatcherError::Prompt(e.to_string()))?;
    if !token.trim().is_empty() {
        config.api_token = Some(token.trim().to_string());
    }

    let base: String = Input::new()
        .with_prompt("ベースID")
        .with_initial_text(config.base_identifier.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .map_err(|e| YarnMatcherError::Prompt(e.to_string()))?;
    if !base.trim().is_empty() {
        config.base_identifier = Some(base.trim().to_string());
    }

    let table: String = Input::new()
        .with_prompt("テーブル名")
        .default(config.table_name.clone())
        .interact_text()
        .map_err(|e| YarnMatcherError::Prompt(e.to_string()))?;
    config.table_name = table.trim().to_string();

    Ok(())
}
