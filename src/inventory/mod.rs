//! 糸在庫の読み込み
//!
//! 外部の表形式ストアから在庫の全行を読み出し、StashYarn に変換する。
//! 読み込みは1回の実行につき1回だけで、在庫側を変更することはない。

mod airtable;

pub use airtable::AirtableReader;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use yarn_matcher_common::{parse_grist, StashYarn, WeightCategory};

/// 在庫テーブルの列名対応
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub name: String,
    pub weight: String,
    /// 算出済みの番手（yd/g）
    pub grist: String,
    /// 番手を算出するための1玉あたりのヤード数
    pub skein_yards: String,
    /// 番手を算出するための1玉あたりのグラム数
    pub skein_grams: String,
    pub available_grams: String,
    pub available_yards: String,
    pub color: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            name: "Name".into(),
            weight: "Weight".into(),
            grist: "Grist - Yardage per gram".into(),
            skein_yards: "Yards per skein".into(),
            skein_grams: "Grams per skein".into(),
            available_grams: "Available - Grams".into(),
            available_yards: "Available - Yards".into(),
            color: "Color description".into(),
        }
    }
}

/// 在庫リーダーの設定（実行時に明示的に渡す）
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub api_token: String,
    pub base_identifier: String,
    pub table_name: String,
    pub api_url: String,
    pub columns: ColumnMapping,
    pub timeout_seconds: u64,
}

/// 在庫の取得元
#[async_trait]
pub trait StashSource: Send + Sync {
    /// ログ用の名前
    fn name(&self) -> &str;

    /// 在庫の全件を取得する
    async fn fetch_all(&self) -> Result<Vec<StashYarn>>;
}

/// メモリ上の在庫スナップショット
#[derive(Debug, Clone, Default)]
pub struct InMemoryStash {
    yarns: Vec<StashYarn>,
}

impl InMemoryStash {
    pub fn new(yarns: Vec<StashYarn>) -> Self {
        Self { yarns }
    }
}

#[async_trait]
impl StashSource for InMemoryStash {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn fetch_all(&self) -> Result<Vec<StashYarn>> {
        Ok(self.yarns.clone())
    }
}

/// 在庫テーブルの1行を StashYarn に変換する
///
/// 番手が取れない行は None（照合に使えないため読み飛ばす）。
pub fn stash_from_fields(
    record_id: &str,
    fields: &Map<String, Value>,
    columns: &ColumnMapping,
) -> Option<StashYarn> {
    let grist = grist_from_fields(fields, columns)?;

    let name = field_string(fields, &columns.name)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Unknown".into());
    let weight_label = field_string(fields, &columns.weight).unwrap_or_default();

    Some(StashYarn {
        record_id: record_id.to_string(),
        name,
        weight: WeightCategory::parse(&weight_label),
        weight_label,
        grist,
        available_grams: field_number(fields, &columns.available_grams),
        available_yards: field_number(fields, &columns.available_yards),
        color: field_string(fields, &columns.color).unwrap_or_default(),
    })
}

fn grist_from_fields(fields: &Map<String, Value>, columns: &ColumnMapping) -> Option<f64> {
    let precomputed = match fields.get(&columns.grist) {
        Some(Value::String(s)) => parse_grist(s).ok(),
        Some(v) => number_from_value(v),
        None => None,
    }
    .filter(|g| *g > 0.0);

    precomputed.or_else(|| {
        let yards = field_number(fields, &columns.skein_yards)?;
        let grams = field_number(fields, &columns.skein_grams)?;
        (yards > 0.0 && grams > 0.0).then(|| yards / grams)
    })
}

fn field_number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(number_from_value)
}

/// 数値・数値文字列・ルックアップ列（配列）の先頭要素を数値として取り出す
///
/// "inf" や "NaN" のような有限でない値は None。
fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Array(items) => items.first().and_then(number_from_value),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn field_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}
