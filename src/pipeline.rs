//! 照合の一連の流れ
//!
//! 解析・正規化・在庫取得がすべて成功してから照合に進み、途中で失敗した場合は
//! レポートを書き出さない。

use crate::error::Result;
use crate::export::{self, MatchReport};
use crate::inventory::StashSource;
use crate::matcher::{self, MatchOptions, RequirementMatches};
use std::path::{Path, PathBuf};
use yarn_matcher_common::{parse_pattern, resolve, PatternRequirement};

/// 実行結果
#[derive(Debug)]
pub struct MatchOutcome {
    pub pattern: PatternRequirement,
    pub matches: Vec<RequirementMatches>,
    pub stash_size: usize,
    pub report_path: PathBuf,
}

impl MatchOutcome {
    /// 候補も代替候補も1件もなかった要件の表示名
    pub fn unmatched_labels(&self) -> Vec<&str> {
        self.matches
            .iter()
            .filter(|m| m.is_unmatched() && !m.has_substitutes())
            .map(|m| m.requirement.label.as_str())
            .collect()
    }
}

/// 編み図JSONを照合してレポートを書き出す
pub async fn run_match(
    pattern_text: &str,
    source: &dyn StashSource,
    options: &MatchOptions,
    output_dir: &Path,
) -> Result<MatchOutcome> {
    println!("[1/4] 編み図を解析中...");
    let pattern = parse_pattern(pattern_text)?;
    let requirements = resolve(&pattern)?;
    print_pattern_summary(&pattern);
    println!("✔ {}件の要件\n", requirements.len());

    println!("[2/4] 在庫を取得中... ({})", source.name());
    let stash = source.fetch_all().await?;
    println!("✔ {}件の糸\n", stash.len());

    println!("[3/4] 照合中...");
    let matches = matcher::match_all(&requirements, &stash, options);
    for m in &matches {
        match m.best() {
            Some(best) => println!(
                "  {} → {}件 (最良 誤差 {:.1}%)",
                m.requirement.label,
                m.candidates.len(),
                best.relative_error * 100.0
            ),
            None if m.has_substitutes() => println!(
                "  {} → 代替候補 {}件",
                m.requirement.label,
                m.single_substitutes.len() + m.pair_substitutes.len()
            ),
            None => println!("  ⚠ {} → 許容範囲内の在庫がありません", m.requirement.label),
        }
    }
    println!("✔ 照合完了\n");

    println!("[4/4] レポートを生成中...");
    let report = MatchReport::new(&pattern, &stash, &matches);
    let report_path = export::write_report(&report, output_dir)?;
    println!("✔ レポート出力: {}", report_path.display());

    Ok(MatchOutcome {
        pattern,
        matches,
        stash_size: stash.len(),
        report_path,
    })
}

fn print_pattern_summary(pattern: &PatternRequirement) {
    println!("  編み図: {}", pattern.pattern_name);
    if !pattern.designer_name.is_empty() {
        println!("  デザイナー: {}", pattern.designer_name);
    }
    println!("  太さ: {}", pattern.original_yarn_weight);
    for yarn in &pattern.yarns {
        let held = yarn
            .held_together_with
            .as_deref()
            .map(|p| format!(" (+ {})", p))
            .unwrap_or_default();
        println!("  - {}: {:.2} yd/g{}", yarn.yarn_name, yarn.grist, held);
    }
}
