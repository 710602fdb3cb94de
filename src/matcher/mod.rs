//! 在庫照合・スコアリング
//!
//! 要件ごとに在庫の全糸（引き揃え要件では異なる2本の全組み合わせ）を評価し、
//! 番手の相対誤差が許容範囲内のものだけを良い順に並べる。
//!
//! ## 並び順
//! 1. スコア（1 − 相対誤差 + 区分加点）の高い順
//! 2. 相対誤差の小さい順
//! 3. 区分が完全一致するもの
//! 4. 在庫の並び順（安定ソート）

pub mod color;
mod types;

pub use types::{
    CategoryMatch, MatchCandidate, MatchOptions, RequirementMatches, CATEGORY_BONUS,
    DEFAULT_COMBO_LIMIT, DEFAULT_THRESHOLD, DEFAULT_TOP_K,
};

use std::cmp::Ordering;
use tracing::debug;
use yarn_matcher_common::{category_for_grist, combine_grist, ResolvedRequirement, StashYarn};

/// 全要件を照合する（要件の順序を保つ）
pub fn match_all(
    requirements: &[ResolvedRequirement],
    stash: &[StashYarn],
    options: &MatchOptions,
) -> Vec<RequirementMatches> {
    requirements
        .iter()
        .enumerate()
        .map(|(index, requirement)| RequirementMatches {
            requirement: requirement.clone(),
            candidates: match_requirement(index, requirement, stash, options),
            single_substitutes: if requirement.holds_pair() {
                match_single_substitutes(index, requirement, stash, options)
            } else {
                Vec::new()
            },
            pair_substitutes: if requirement.is_combined {
                Vec::new()
            } else {
                match_pair_substitutes(index, requirement, stash, options)
            },
        })
        .collect()
}

/// 要件1件の候補を良い順に最大 top_k 件返す
pub fn match_requirement(
    requirement_index: usize,
    requirement: &ResolvedRequirement,
    stash: &[StashYarn],
    options: &MatchOptions,
) -> Vec<MatchCandidate> {
    let mut candidates = if requirement.holds_pair() {
        pair_candidates(requirement_index, requirement, stash, options)
    } else {
        single_candidates(requirement_index, requirement, stash, options)
    };

    debug!(
        requirement = %requirement.label,
        accepted = candidates.len(),
        "許容範囲内の候補"
    );

    rank(&mut candidates);
    candidates.truncate(options.top_k);
    candidates
}

/// 引き揃え要件の合成番手に1本で近い在庫を探す
pub fn match_single_substitutes(
    requirement_index: usize,
    requirement: &ResolvedRequirement,
    stash: &[StashYarn],
    options: &MatchOptions,
) -> Vec<MatchCandidate> {
    let mut candidates = single_candidates(requirement_index, requirement, stash, options);
    rank(&mut candidates);
    candidates.truncate(options.top_k);
    candidates
}

/// 単独要件の番手に、色の近い在庫2本の引き揃えで合わせる
///
/// 両方の量が足りる組を先に、その中で誤差の小さい順に最大 combo_limit 件。
pub fn match_pair_substitutes(
    requirement_index: usize,
    requirement: &ResolvedRequirement,
    stash: &[StashYarn],
    options: &MatchOptions,
) -> Vec<MatchCandidate> {
    let mut combos: Vec<MatchCandidate> =
        pair_candidates(requirement_index, requirement, stash, options)
            .into_iter()
            .filter(|c| c.color_match)
            .collect();

    combos.sort_by(|a, b| {
        b.sufficient
            .cmp(&a.sufficient)
            .then_with(|| a.relative_error.total_cmp(&b.relative_error))
    });
    combos.truncate(options.combo_limit);
    combos
}

/// 相対誤差が許容範囲内なら Some
fn relative_error(candidate_grist: f64, target_grist: f64, threshold: f64) -> Option<f64> {
    let error = (candidate_grist - target_grist).abs() / target_grist;
    (error <= threshold).then_some(error)
}

fn score(relative_error: f64, category: CategoryMatch, options: &MatchOptions) -> f64 {
    let bonus = if category.earns_bonus() {
        options.category_bonus
    } else {
        0.0
    };
    1.0 - relative_error + bonus
}

fn single_candidates(
    requirement_index: usize,
    requirement: &ResolvedRequirement,
    stash: &[StashYarn],
    options: &MatchOptions,
) -> Vec<MatchCandidate> {
    let needed = requirement.required_length();

    stash
        .iter()
        .enumerate()
        .filter_map(|(index, yarn)| {
            let error = relative_error(yarn.grist, requirement.target_grist, options.threshold)?;
            let category = if yarn.weight.matches(&requirement.target_category) {
                CategoryMatch::Exact
            } else {
                CategoryMatch::None
            };

            Some(MatchCandidate {
                requirement_index,
                stash_indices: vec![index],
                record_ids: vec![yarn.record_id.clone()],
                candidate_grist: yarn.grist,
                grist_delta: yarn.grist - requirement.target_grist,
                relative_error: error,
                score: score(error, category, options),
                category,
                sufficient: has_enough(yarn, needed),
                color_match: color::colors_match(&requirement.color, &yarn.color),
            })
        })
        .collect()
}

/// 異なる2本の組み合わせ（i < j）を1回ずつ評価する
fn pair_candidates(
    requirement_index: usize,
    requirement: &ResolvedRequirement,
    stash: &[StashYarn],
    options: &MatchOptions,
) -> Vec<MatchCandidate> {
    let needed = requirement.required_length();
    let mut candidates = Vec::new();

    for (i, a) in stash.iter().enumerate() {
        for (j, b) in stash.iter().enumerate().skip(i + 1) {
            let Some(combined) = combine_grist(&[a.grist, b.grist]) else {
                continue;
            };
            let Some(error) = relative_error(combined, requirement.target_grist, options.threshold)
            else {
                continue;
            };

            let combined_category = category_for_grist(combined);
            let category = if combined_category.matches(&requirement.target_category) {
                CategoryMatch::Exact
            } else if combined_category.is_within_one_step(&requirement.target_category) {
                CategoryMatch::WithinOneStep
            } else {
                CategoryMatch::None
            };

            candidates.push(MatchCandidate {
                requirement_index,
                stash_indices: vec![i, j],
                record_ids: vec![a.record_id.clone(), b.record_id.clone()],
                candidate_grist: combined,
                grist_delta: combined - requirement.target_grist,
                relative_error: error,
                score: score(error, category, options),
                category,
                // 各ストランドがそれぞれ全長を賄う必要がある
                sufficient: has_enough(a, needed) && has_enough(b, needed),
                color_match: color::colors_match(&a.color, &b.color),
            });
        }
    }

    candidates
}

fn has_enough(yarn: &StashYarn, needed: f64) -> bool {
    yarn.available_length()
        .map(|available| available >= needed)
        .unwrap_or(false)
}

fn rank(candidates: &mut [MatchCandidate]) {
    // sort_by は安定ソートなので、最後の同点は在庫の並び順が残る
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.relative_error.total_cmp(&b.relative_error))
            .then_with(|| exact_first(a.category, b.category))
    });
}

fn exact_first(a: CategoryMatch, b: CategoryMatch) -> Ordering {
    (a != CategoryMatch::Exact).cmp(&(b != CategoryMatch::Exact))
}
