//! 照合で使う型定義
//!
//! - PatternRequirement / YarnNeed: 編み図側の指定糸（入力JSONから生成）
//! - StashYarn: 在庫の糸（在庫テーブルのスナップショット）
//! - ResolvedRequirement: 照合対象となる正規化済みの要件

use crate::units::WeightCategory;
use serde::{Deserialize, Serialize};

/// 編み図の糸要件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRequirement {
    pub pattern_name: String,
    pub designer_name: String,
    pub size: String,
    pub original_yarn_weight: String,
    pub needle_sizes: Vec<String>,
    pub yarns: Vec<YarnNeed>,
    /// 引き揃え時の合成番手（JSONで明示された場合のみ）
    #[serde(default)]
    pub combined_grist: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

impl PatternRequirement {
    /// 引き揃え指定を含むか
    pub fn has_held_together(&self) -> bool {
        self.yarns.iter().any(|y| y.held_together_with.is_some())
    }
}

/// 編み図が指定する糸1本分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YarnNeed {
    pub yarn_name: String,
    /// yd/g
    #[serde(rename = "grist_yd_per_g")]
    pub grist: f64,
    pub grams_needed: f64,
    pub yards_needed: f64,
    pub color: String,
    #[serde(default)]
    pub held_together_with: Option<String>,
}

impl YarnNeed {
    /// 必要な長さ（yd）。yards_neededが0ならグラム数と番手から換算する
    pub fn required_length(&self) -> f64 {
        if self.yards_needed > 0.0 {
            self.yards_needed
        } else {
            self.grams_needed * self.grist
        }
    }
}

/// 在庫の糸
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StashYarn {
    /// 在庫テーブルのレコードID
    pub record_id: String,
    pub name: String,
    pub weight: WeightCategory,
    /// 在庫テーブル上の表記そのまま
    #[serde(default)]
    pub weight_label: String,
    /// yd/g
    pub grist: f64,
    #[serde(default)]
    pub available_grams: Option<f64>,
    #[serde(default)]
    pub available_yards: Option<f64>,
    #[serde(default)]
    pub color: String,
}

impl StashYarn {
    /// 使える長さ（yd）。ヤード数がなければグラム数×番手で求める
    pub fn available_length(&self) -> Option<f64> {
        self.available_yards
            .or_else(|| self.available_grams.map(|g| g * self.grist))
    }
}

/// 目標番手の出どころ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GristSource {
    /// 単独の糸
    Single,
    /// combined_gristで明示
    Explicit,
    /// 2本の番手から算出
    Computed,
    /// 引き揃え指定のない編み図全体の combined_grist
    Pattern,
}

/// 照合用に正規化した要件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRequirement {
    /// 表示名（引き揃えは "A + B"）
    pub label: String,
    pub yarn_names: Vec<String>,
    pub target_grist: f64,
    pub target_category: WeightCategory,
    /// 全ストランド合計
    pub grams_needed: f64,
    /// 1本あたりに必要な長さ
    pub yards_needed: f64,
    pub color: String,
    pub is_combined: bool,
    pub grist_source: GristSource,
}

impl ResolvedRequirement {
    /// 在庫2本の組み合わせで照合する要件か
    ///
    /// 編み図全体の combined_grist から作った要件は1本ずつ照合する。
    pub fn holds_pair(&self) -> bool {
        self.is_combined && self.grist_source != GristSource::Pattern
    }

    /// 在庫1本（引き揃えでは各ストランド）が満たすべき長さ
    ///
    /// yards_neededが0の場合は重さから換算する。引き揃えでは合計重量×合成番手が
    /// そのまま1本あたりの長さになる。
    pub fn required_length(&self) -> f64 {
        if self.yards_needed > 0.0 {
            self.yards_needed
        } else {
            self.grams_needed * self.target_grist
        }
    }
}
