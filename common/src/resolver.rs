//! 要件の解決
//!
//! PatternRequirement の各 YarnNeed を照合用の ResolvedRequirement に変換する。
//! held_together_with で結ばれた2本は1つの要件にまとめる。

use crate::error::{Error, Result};
use crate::types::{GristSource, PatternRequirement, ResolvedRequirement, YarnNeed};
use crate::units::{category_for_grist, combine_grist, WeightCategory};

/// 編み図の糸要件を照合用に解決する
///
/// - 単独の糸は1件、引き揃えのペアは1件にまとめる（先に現れた方の位置）
/// - combined_grist はペアが1組だけのときに優先する
/// - ペアがなく combined_grist だけがある場合は、編み図全体の要件を末尾に1件加える
/// - 番手が0以下、参照先が存在しない・自分自身、3本以上の組み合わせはエラー
pub fn resolve(pattern: &PatternRequirement) -> Result<Vec<ResolvedRequirement>> {
    for (i, need) in pattern.yarns.iter().enumerate() {
        if !need.grist.is_finite() || need.grist <= 0.0 {
            return Err(Error::malformed(
                format!("yarns[{}].grist_yd_per_g", i),
                format!("番手は正の値である必要があります: {}", need.grist),
            ));
        }
    }

    if let Some(g) = pattern.combined_grist {
        if !g.is_finite() || g <= 0.0 {
            return Err(Error::malformed(
                "combined_grist",
                format!("番手は正の値である必要があります: {}", g),
            ));
        }
    }

    let partners = pair_partners(&pattern.yarns)?;
    let pair_count = partners.iter().flatten().count() / 2;

    let explicit = match pattern.combined_grist {
        Some(g) if pair_count == 1 => Some(g),
        Some(g) if pair_count > 1 => {
            tracing::warn!(
                combined_grist = g,
                pairs = pair_count,
                "引き揃えのペアが複数あるため combined_grist を使わず各ペアの番手から算出します"
            );
            None
        }
        _ => None,
    };

    let pattern_category = WeightCategory::parse(&pattern.original_yarn_weight);
    let has_pairs = pair_count > 0;

    let mut visited = vec![false; pattern.yarns.len()];
    let mut resolved = Vec::new();

    for (i, need) in pattern.yarns.iter().enumerate() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        match partners[i] {
            Some(j) => {
                visited[j] = true;
                resolved.push(resolve_pair(need, &pattern.yarns[j], explicit, pattern_category));
            }
            None => {
                // 引き揃えを含む編み図では、太さ表記は合成後の生地を指す
                let target_category = if has_pairs {
                    category_for_grist(need.grist)
                } else {
                    pattern_category
                };
                resolved.push(resolve_single(need, target_category));
            }
        }
    }

    if pair_count == 0 && !pattern.yarns.is_empty() {
        if let Some(g) = pattern.combined_grist {
            resolved.push(resolve_pattern_level(&pattern.yarns, g, pattern_category));
        }
    }

    Ok(resolved)
}

/// 各 YarnNeed の相方のインデックス
fn pair_partners(yarns: &[YarnNeed]) -> Result<Vec<Option<usize>>> {
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); yarns.len()];

    for (i, need) in yarns.iter().enumerate() {
        let Some(reference) = need.held_together_with.as_deref() else {
            continue;
        };
        let field = format!("yarns[{}].held_together_with", i);

        if reference == need.yarn_name {
            return Err(Error::malformed(field, format!("自分自身を参照しています: {}", reference)));
        }

        let targets: Vec<usize> = yarns
            .iter()
            .enumerate()
            .filter(|(j, other)| *j != i && other.yarn_name == reference)
            .map(|(j, _)| j)
            .collect();

        let j = match targets.as_slice() {
            [] => {
                return Err(Error::malformed(
                    field,
                    format!("参照先の糸が見つかりません: {}", reference),
                ))
            }
            [j] => *j,
            _ => {
                return Err(Error::malformed(
                    field,
                    format!("同名の糸が複数あり参照先を特定できません: {}", reference),
                ))
            }
        };

        for (a, b) in [(i, j), (j, i)] {
            if !neighbors[a].contains(&b) {
                neighbors[a].push(b);
            }
        }
    }

    neighbors
        .iter()
        .enumerate()
        .map(|(i, n)| match n.as_slice() {
            [] => Ok(None),
            [j] => Ok(Some(*j)),
            _ => Err(Error::malformed(
                format!("yarns[{}].held_together_with", i),
                format!(
                    "3本以上の引き揃えは扱えません: {}",
                    yarns[i].yarn_name
                ),
            )),
        })
        .collect()
}

fn resolve_single(need: &YarnNeed, target_category: WeightCategory) -> ResolvedRequirement {
    ResolvedRequirement {
        label: need.yarn_name.clone(),
        yarn_names: vec![need.yarn_name.clone()],
        target_grist: need.grist,
        target_category,
        grams_needed: need.grams_needed,
        yards_needed: need.required_length(),
        color: need.color.clone(),
        is_combined: false,
        grist_source: GristSource::Single,
    }
}

fn resolve_pair(
    a: &YarnNeed,
    b: &YarnNeed,
    explicit: Option<f64>,
    target_category: WeightCategory,
) -> ResolvedRequirement {
    let (target_grist, grist_source) = match explicit {
        Some(g) => (g, GristSource::Explicit),
        None => {
            // 番手は検証済みなので必ず求まる
            let combined = combine_grist(&[a.grist, b.grist]).unwrap_or(a.grist.min(b.grist));
            (combined, GristSource::Computed)
        }
    };

    let color = if a.color.eq_ignore_ascii_case(&b.color) {
        a.color.clone()
    } else {
        format!("{} / {}", a.color, b.color)
    };

    ResolvedRequirement {
        label: format!("{} + {}", a.yarn_name, b.yarn_name),
        yarn_names: vec![a.yarn_name.clone(), b.yarn_name.clone()],
        target_grist,
        target_category,
        grams_needed: a.grams_needed + b.grams_needed,
        yards_needed: a.required_length().max(b.required_length()),
        color,
        is_combined: true,
        grist_source,
    }
}

/// 編み図全体の combined_grist を1件の要件にする（長さは最大の糸に合わせる）
fn resolve_pattern_level(
    yarns: &[YarnNeed],
    combined_grist: f64,
    target_category: WeightCategory,
) -> ResolvedRequirement {
    let yarn_names: Vec<String> = yarns.iter().map(|y| y.yarn_name.clone()).collect();

    let mut colors: Vec<&str> = Vec::new();
    for yarn in yarns {
        if !yarn.color.is_empty() && !colors.iter().any(|c| c.eq_ignore_ascii_case(&yarn.color)) {
            colors.push(&yarn.color);
        }
    }

    ResolvedRequirement {
        label: yarn_names.join(" + "),
        target_grist: combined_grist,
        target_category,
        grams_needed: yarns.iter().map(|y| y.grams_needed).fold(0.0, f64::max),
        yards_needed: yarns.iter().map(|y| y.required_length()).fold(0.0, f64::max),
        color: colors.join(" / "),
        is_combined: true,
        grist_source: GristSource::Pattern,
        yarn_names,
    }
}
