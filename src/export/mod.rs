//! 照合結果のレポート出力

pub mod html;

pub use html::{color_hex, render_html};

use crate::error::{Result, YarnMatcherError};
use crate::matcher::RequirementMatches;
use chrono::{DateTime, Local, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use yarn_matcher_common::{PatternRequirement, StashYarn};

lazy_static! {
    static ref NON_WORD_RE: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref SEPARATOR_RE: Regex = Regex::new(r"[-\s]+").unwrap();
}

const SLUG_MAX_LEN: usize = 50;

/// レポート1件分の入力
#[derive(Debug, Clone)]
pub struct MatchReport<'a> {
    pub pattern: &'a PatternRequirement,
    pub stash: &'a [StashYarn],
    pub matches: &'a [RequirementMatches],
    pub generated_at: DateTime<Local>,
}

impl<'a> MatchReport<'a> {
    pub fn new(
        pattern: &'a PatternRequirement,
        stash: &'a [StashYarn],
        matches: &'a [RequirementMatches],
    ) -> Self {
        Self {
            pattern,
            stash,
            matches,
            generated_at: Local::now(),
        }
    }
}

/// ファイル名用に編み図名を変換
pub fn slugify(text: &str) -> String {
    let stripped = NON_WORD_RE.replace_all(text, "");
    let joined = SEPARATOR_RE.replace_all(stripped.trim(), "-");
    let slug: String = joined
        .to_lowercase()
        .trim_matches('-')
        .chars()
        .take(SLUG_MAX_LEN)
        .collect();
    let slug = slug.trim_end_matches('-').to_string();

    if slug.is_empty() {
        "pattern".to_string()
    } else {
        slug
    }
}

/// `dir/pattern_match_{slug}_{YYYY-MM-DD}.html`
pub fn report_path(dir: &Path, pattern_name: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!(
        "pattern_match_{}_{}.html",
        slugify(pattern_name),
        date.format("%Y-%m-%d")
    ))
}

/// レポートを書き出してパスを返す
pub fn write_report(report: &MatchReport, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| {
        YarnMatcherError::Report(format!("出力先を作成できません {}: {}", dir.display(), e))
    })?;

    let path = report_path(dir, &report.pattern.pattern_name, report.generated_at.date_naive());
    let html = render_html(report);
    std::fs::write(&path, html).map_err(|e| {
        YarnMatcherError::Report(format!("書き込みに失敗しました {}: {}", path.display(), e))
    })?;

    tracing::info!(path = %path.display(), "レポートを書き出しました");
    Ok(path)
}

/// 既定のアプリでレポートを開く（失敗しても警告のみ）
pub fn open_report(path: &Path) -> bool {
    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(path).status()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").arg("/C").arg("start").arg("").arg(path).status()
    } else {
        Command::new("xdg-open").arg(path).status()
    };

    match result {
        Ok(status) if status.success() => true,
        Ok(status) => {
            tracing::warn!(%status, path = %path.display(), "レポートを開けませんでした");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "レポートを開けませんでした");
            false
        }
    }
}
