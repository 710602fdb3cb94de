use serde::Serialize;
use yarn_matcher_common::{ResolvedRequirement, StashYarn};

/// 番手の許容相対誤差
pub const DEFAULT_THRESHOLD: f64 = 0.15;
/// 要件ごとに残す候補数
pub const DEFAULT_TOP_K: usize = 3;
/// 太さ区分が一致したときの加点
pub const CATEGORY_BONUS: f64 = 0.05;
/// 単独要件に対して示す引き揃え候補の上限
pub const DEFAULT_COMBO_LIMIT: usize = 5;

/// 照合オプション
#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// この相対誤差を超える候補は除外
    pub threshold: f64,
    pub top_k: usize,
    pub category_bonus: f64,
    pub combo_limit: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            category_bonus: CATEGORY_BONUS,
            combo_limit: DEFAULT_COMBO_LIMIT,
        }
    }
}

/// 太さ区分の一致度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CategoryMatch {
    Exact,
    /// 引き揃えの合成区分が1段差以内
    WithinOneStep,
    None,
}

impl CategoryMatch {
    pub fn earns_bonus(&self) -> bool {
        !matches!(self, CategoryMatch::None)
    }
}

/// 照合候補
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub requirement_index: usize,
    /// 在庫スナップショット内の位置（1本、引き揃えは2本）
    pub stash_indices: Vec<usize>,
    /// 在庫テーブルのレコードID
    pub record_ids: Vec<String>,
    /// 候補の番手（引き揃えは合成番手）
    pub candidate_grist: f64,
    /// 候補 − 目標
    pub grist_delta: f64,
    pub relative_error: f64,
    pub score: f64,
    pub category: CategoryMatch,
    /// 量が足りるか（除外条件ではない）
    pub sufficient: bool,
    pub color_match: bool,
}

impl MatchCandidate {
    pub fn is_pair(&self) -> bool {
        self.stash_indices.len() == 2
    }

    /// 候補の糸を在庫スナップショットから引く
    pub fn yarns<'a>(&self, stash: &'a [StashYarn]) -> Vec<&'a StashYarn> {
        self.stash_indices
            .iter()
            .filter_map(|&i| stash.get(i))
            .collect()
    }
}

/// 要件1件分の照合結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementMatches {
    pub requirement: ResolvedRequirement,
    /// 良い順
    pub candidates: Vec<MatchCandidate>,
    /// 引き揃え要件を1本で代替できる在庫（単独要件では常に空）
    pub single_substitutes: Vec<MatchCandidate>,
    /// 単独要件を在庫2本の引き揃えで代替する候補（色が近いものだけ）
    pub pair_substitutes: Vec<MatchCandidate>,
}

impl RequirementMatches {
    /// 許容範囲の候補が1件もない（エラーではなくレポートに表示する）
    pub fn is_unmatched(&self) -> bool {
        self.candidates.is_empty()
    }

    /// 代替候補（1本での代替・引き揃えでの代替）があるか
    pub fn has_substitutes(&self) -> bool {
        !self.single_substitutes.is_empty() || !self.pair_substitutes.is_empty()
    }

    pub fn best(&self) -> Option<&MatchCandidate> {
        self.candidates.first()
    }
}
