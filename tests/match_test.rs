//! 照合パイプラインの統合テスト
//!
//! メモリ上の在庫を使い、解析からレポート出力までを通しで検証する

use async_trait::async_trait;
use serde_json::json;
use tempfile::tempdir;
use yarn_matcher::error::{Result, YarnMatcherError};
use yarn_matcher::inventory::{InMemoryStash, StashSource};
use yarn_matcher::matcher::MatchOptions;
use yarn_matcher::pipeline::run_match;
use yarn_matcher_common::{StashYarn, WeightCategory};

fn stash_yarn(id: &str, name: &str, weight: &str, grist: f64, yards: f64) -> StashYarn {
    StashYarn {
        record_id: id.into(),
        name: name.into(),
        weight: WeightCategory::parse(weight),
        weight_label: weight.into(),
        grist,
        available_grams: None,
        available_yards: Some(yards),
        color: "Navy".into(),
    }
}

fn single_pattern() -> String {
    json!({
        "pattern_name": "Sunday Socks",
        "designer_name": "A. Knitter",
        "size": "M",
        "original_yarn_weight": "Fingering",
        "needle_sizes": ["US 1 (2.25mm)"],
        "yarns": [{
            "yarn_name": "Sock Base",
            "grist_yd_per_g": "150yd/50g",
            "grams_needed": 100,
            "yards_needed": 300,
            "color": "Navy",
            "held_together_with": null
        }],
        "notes": ""
    })
    .to_string()
}

fn held_together_pattern() -> String {
    json!({
        "pattern_name": "Mohair Cloud Sweater",
        "designer_name": "B. Designer",
        "size": "L",
        "original_yarn_weight": "Worsted",
        "needle_sizes": ["US 8 (5mm)"],
        "yarns": [
            {
                "yarn_name": "Lace A",
                "grist_yd_per_g": 8,
                "grams_needed": 100,
                "yards_needed": 800,
                "color": "Grey",
                "held_together_with": "Lace B"
            },
            {
                "yarn_name": "Lace B",
                "grist_yd_per_g": 8,
                "grams_needed": 100,
                "yards_needed": 800,
                "color": "Grey",
                "held_together_with": "Lace A"
            }
        ],
        "notes": "Hold one strand of each throughout."
    })
    .to_string()
}

struct UnavailableStash;

#[async_trait]
impl StashSource for UnavailableStash {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn fetch_all(&self) -> Result<Vec<StashYarn>> {
        Err(YarnMatcherError::InventoryUnavailable("接続できません".into()))
    }
}

/// 目標 3.0 yd/g に対し 2.9 は採用、2.5 は許容範囲外
#[tokio::test]
async fn test_single_requirement_ranking() {
    let dir = tempdir().expect("Failed to create temp dir");
    let stash = InMemoryStash::new(vec![
        stash_yarn("recFar", "Far Away Sport", "Fingering", 2.5, 500.0),
        stash_yarn("recSport", "Plump Sport", "Sport", 3.05, 500.0),
        stash_yarn("recClose", "Close Fingering", "Fingering", 2.9, 500.0),
    ]);

    let outcome = run_match(&single_pattern(), &stash, &MatchOptions::default(), dir.path())
        .await
        .unwrap();

    assert_eq!(outcome.matches.len(), 1);
    let matches = &outcome.matches[0];
    assert!((matches.requirement.target_grist - 3.0).abs() < 1e-9);

    let ids: Vec<&str> = matches
        .candidates
        .iter()
        .map(|c| c.record_ids[0].as_str())
        .collect();
    assert_eq!(ids, vec!["recClose", "recSport"]);
    assert!((matches.candidates[0].relative_error - 0.1 / 3.0).abs() < 1e-9);
    assert!(outcome.unmatched_labels().is_empty());

    let html = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert!(html.contains("Close Fingering"));
    assert!(!html.contains("Far Away Sport"));
    assert!(outcome
        .report_path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("pattern_match_sunday-socks_"));
}

/// 8 yd/g の2本引き揃えは 4 yd/g として照合する
#[tokio::test]
async fn test_held_together_requirement() {
    let dir = tempdir().expect("Failed to create temp dir");
    let stash = InMemoryStash::new(vec![
        stash_yarn("recA", "Kid Silk", "Lace", 8.1, 1000.0),
        stash_yarn("recW", "Worsted Wool", "Worsted", 4.0, 900.0),
        stash_yarn("recB", "Alpaca Lace", "Lace", 7.9, 1000.0),
    ]);

    let outcome = run_match(&held_together_pattern(), &stash, &MatchOptions::default(), dir.path())
        .await
        .unwrap();

    assert_eq!(outcome.matches.len(), 1);
    let matches = &outcome.matches[0];
    assert!(matches.requirement.is_combined);
    assert!((matches.requirement.target_grist - 4.0).abs() < 1e-9);

    assert_eq!(matches.candidates.len(), 1);
    assert_eq!(matches.candidates[0].record_ids, vec!["recA", "recB"]);
    assert!(matches.candidates[0].candidate_grist < 7.9);

    assert_eq!(matches.single_substitutes.len(), 1);
    assert_eq!(matches.single_substitutes[0].record_ids, vec!["recW"]);

    let html = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert!(html.contains("Held Together"));
    assert!(html.contains("Combo: Kid Silk + Alpaca Lace"));
}

/// yarns がない入力はレポートを作らずに失敗する
#[tokio::test]
async fn test_missing_yarns_writes_no_report() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_dir = dir.path().join("reports");
    let input = json!({
        "pattern_name": "Broken",
        "designer_name": "",
        "size": "",
        "original_yarn_weight": "DK",
        "needle_sizes": []
    })
    .to_string();

    let err = run_match(&input, &InMemoryStash::default(), &MatchOptions::default(), &output_dir)
        .await
        .unwrap_err();

    assert!(err.is_malformed_pattern());
    match err {
        YarnMatcherError::Common(inner) => assert_eq!(inner.field(), Some("yarns")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!output_dir.exists());
}

/// 在庫が空でも全要件を未照合としてレポートを出す
#[tokio::test]
async fn test_empty_inventory_marks_all_unmatched() {
    let dir = tempdir().expect("Failed to create temp dir");

    let outcome = run_match(
        &held_together_pattern(),
        &InMemoryStash::default(),
        &MatchOptions::default(),
        dir.path(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.stash_size, 0);
    assert!(outcome.matches.iter().all(|m| m.is_unmatched()));
    assert_eq!(outcome.unmatched_labels(), vec!["Lace A + Lace B"]);

    let html = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert!(html.contains("No matches found in your stash"));
}

/// 在庫取得に失敗したらレポートを作らない
#[tokio::test]
async fn test_inventory_failure_writes_no_report() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_dir = dir.path().join("reports");

    let err = run_match(&single_pattern(), &UnavailableStash, &MatchOptions::default(), &output_dir)
        .await
        .unwrap_err();

    assert!(matches!(err, YarnMatcherError::InventoryUnavailable(_)));
    assert!(!output_dir.exists());
}

/// 同じ入力なら同じ照合結果になる
#[tokio::test]
async fn test_deterministic_results() {
    let dir = tempdir().expect("Failed to create temp dir");
    let stash = InMemoryStash::new(vec![
        stash_yarn("rec1", "One", "Fingering", 3.1, 400.0),
        stash_yarn("rec2", "Two", "Fingering", 2.9, 400.0),
        stash_yarn("rec3", "Three", "Sport", 3.0, 400.0),
    ]);

    let first = run_match(&single_pattern(), &stash, &MatchOptions::default(), dir.path())
        .await
        .unwrap();
    let second = run_match(&single_pattern(), &stash, &MatchOptions::default(), dir.path())
        .await
        .unwrap();

    assert_eq!(first.matches, second.matches);
}

/// 引き揃え指定がなくても combined_grist から1本での代替を探す
#[tokio::test]
async fn test_pattern_combined_grist_without_links() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = json!({
        "pattern_name": "Double Strand Cowl",
        "designer_name": "",
        "size": "One size",
        "original_yarn_weight": "DK",
        "needle_sizes": ["US 6 (4mm)"],
        "combined_grist": 2.0,
        "yarns": [
            {"yarn_name": "Fine A", "grist_yd_per_g": 4.0, "grams_needed": 50, "yards_needed": 200, "color": "Blue", "held_together_with": null},
            {"yarn_name": "Fine B", "grist_yd_per_g": 4.0, "grams_needed": 50, "yards_needed": 250, "color": "Blue", "held_together_with": null}
        ]
    })
    .to_string();
    let stash = InMemoryStash::new(vec![stash_yarn("single2", "Single DK", "DK", 2.0, 300.0)]);

    let outcome = run_match(&input, &stash, &MatchOptions::default(), dir.path())
        .await
        .unwrap();

    assert_eq!(outcome.matches.len(), 3);
    let whole = &outcome.matches[2];
    assert!(whole.requirement.is_combined);
    assert_eq!(whole.requirement.target_grist, 2.0);
    assert_eq!(whole.requirement.yards_needed, 250.0);
    assert_eq!(whole.candidates[0].record_ids, vec!["single2"]);
    assert!(whole.candidates[0].sufficient);

    let html = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert!(html.contains("Held Together"));
    assert!(html.contains("Single Yarns Matching Combined Grist"));
    assert!(html.contains("Single DK"));
}

/// 単独の指定糸を色の近い在庫2本の引き揃えで代替する
#[tokio::test]
async fn test_single_requirement_offers_combos() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = json!({
        "pattern_name": "Simple Sweater",
        "designer_name": "",
        "size": "",
        "original_yarn_weight": "DK",
        "needle_sizes": [],
        "yarns": [
            {"yarn_name": "Main DK", "grist_yd_per_g": 2.0, "grams_needed": 0, "yards_needed": 300, "color": "Grey"}
        ]
    })
    .to_string();
    let stash = InMemoryStash::new(vec![
        StashYarn { color: "Grey".into(), ..stash_yarn("g1", "Fine Grey", "Fingering", 4.0, 400.0) },
        StashYarn { color: "Grey".into(), ..stash_yarn("g2", "Soft Grey", "Fingering", 4.0, 400.0) },
    ]);

    let outcome = run_match(&input, &stash, &MatchOptions::default(), dir.path())
        .await
        .unwrap();

    let matches = &outcome.matches[0];
    assert!(matches.is_unmatched());
    assert!(outcome.unmatched_labels().is_empty());
    assert_eq!(matches.pair_substitutes.len(), 1);
    assert_eq!(matches.pair_substitutes[0].record_ids, vec!["g1", "g2"]);

    let html = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert!(html.contains("Combos: two stash yarns held together"));
    assert!(html.contains("Combo: Fine Grey + Soft Grey"));
    assert!(!html.contains("No matches found in your stash"));
}
