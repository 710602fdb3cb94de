//! HTMLレポート生成
//!
//! 外部リソースに依存しない1ファイルのHTMLを組み立てる。

use super::MatchReport;
use crate::matcher::{CategoryMatch, MatchCandidate, RequirementMatches};
use std::fmt::Write;
use yarn_matcher_common::{GristSource, StashYarn};

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; background: #f5f7fa; color: #2c3e50; line-height: 1.5; padding: 2rem 1rem; }
.container { max-width: 900px; margin: 0 auto; }
.header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #fff; border-radius: 16px; padding: 2rem; margin-bottom: 1.5rem; }
.header h1 { font-size: 2rem; margin-bottom: 0.25rem; }
.pattern-meta { display: flex; flex-wrap: wrap; gap: 1rem; margin-top: 0.75rem; font-size: 0.95rem; }
.pattern-meta-label { opacity: 0.7; }
.notes { margin-top: 1rem; padding: 0.75rem 1rem; background: rgba(255,255,255,0.15); border-radius: 8px; font-size: 0.9rem; }
.section { background: #fff; border-radius: 12px; padding: 1.5rem; margin-bottom: 1.5rem; box-shadow: 0 2px 8px rgba(0,0,0,0.05); }
.section-title { font-size: 1.25rem; font-weight: 600; margin-bottom: 1rem; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 0.5rem; border-bottom: 1px solid #eee; }
th { font-size: 0.8rem; text-transform: uppercase; color: #888; }
.grist-badge { display: inline-block; background: #eef2ff; color: #4c51bf; border-radius: 6px; padding: 0.1rem 0.5rem; font-family: monospace; }
.combined-grist { margin-top: 1rem; padding: 0.75rem 1rem; background: linear-gradient(135deg, #ffecd2 0%, #fcb69f 100%); border-radius: 8px; }
.match-group { margin-bottom: 1.5rem; }
.match-group-title { font-weight: 600; padding-bottom: 0.5rem; margin-bottom: 0.75rem; border-bottom: 2px solid #eee; }
.match-group-title .target { font-weight: normal; color: #888; }
.subgroup-title { font-size: 0.9rem; color: #666; margin: 0.75rem 0 0.5rem; }
.match-card { display: grid; grid-template-columns: auto 1fr auto; gap: 1rem; align-items: center; padding: 0.75rem 1rem; border: 1px solid #eee; border-radius: 10px; margin-bottom: 0.5rem; }
.rank { width: 2rem; height: 2rem; border-radius: 50%; display: flex; align-items: center; justify-content: center; color: #fff; font-weight: 600; background: linear-gradient(135deg, #4facfe 0%, #00f2fe 100%); }
.match-name { font-weight: 600; }
.match-meta { display: flex; flex-wrap: wrap; gap: 0.75rem; font-size: 0.85rem; color: #666; }
.badge { display: inline-block; border-radius: 6px; padding: 0 0.4rem; font-size: 0.75rem; }
.badge.category { background: #e6fffa; color: #2c7a7b; }
.badge.enough { background: #f0fff4; color: #276749; }
.badge.not-enough { background: #fff5f5; color: #c53030; }
.badge.unknown { background: #f7fafc; color: #718096; }
.match-yardage { text-align: right; white-space: nowrap; font-size: 0.9rem; }
.color-dot { display: inline-block; width: 0.8rem; height: 0.8rem; border-radius: 50%; border: 1px solid #ccc; vertical-align: middle; margin-right: 0.3rem; }
.no-matches { padding: 1rem; background: #fafafa; border-radius: 8px; color: #888; font-style: italic; }
.footer { text-align: center; color: #aaa; font-size: 0.8rem; margin-top: 2rem; }
"#;

/// HTML特殊文字をエスケープ
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 色名から表示用のスウォッチ色を決める
pub fn color_hex(color_name: &str) -> &'static str {
    const COLOR_MAP: &[(&str, &str)] = &[
        ("red", "#e74c3c"),
        ("blue", "#3498db"),
        ("navy", "#2c3e50"),
        ("green", "#27ae60"),
        ("yellow", "#f1c40f"),
        ("orange", "#e67e22"),
        ("purple", "#9b59b6"),
        ("pink", "#ff6b9d"),
        ("brown", "#8b4513"),
        ("black", "#2c2c2c"),
        ("white", "#f8f8f8"),
        ("grey", "#95a5a6"),
        ("gray", "#95a5a6"),
        ("cream", "#f5f5dc"),
        ("beige", "#d4c4a8"),
        ("teal", "#1abc9c"),
        ("coral", "#ff7f7f"),
        ("burgundy", "#800020"),
        ("maroon", "#800000"),
        ("olive", "#808000"),
        ("gold", "#ffd700"),
        ("silver", "#c0c0c0"),
        ("tan", "#d2b48c"),
        ("charcoal", "#36454f"),
    ];

    if color_name.trim().is_empty() {
        return "#ccc";
    }
    let lower = color_name.to_lowercase();
    COLOR_MAP
        .iter()
        .find(|(name, _)| lower.contains(name))
        .map(|(_, hex)| *hex)
        .unwrap_or("#a8d5ba")
}

/// レポート全体をHTMLにする
pub fn render_html(report: &MatchReport) -> String {
    let pattern = report.pattern;
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>Yarn Match: {}</title>\n<style>{}</style>\n</head>\n<body>\n<div class=\"container\">\n",
        escape(&pattern.pattern_name),
        STYLE
    );

    // ヘッダー
    let _ = write!(html, "<div class=\"header\">\n<h1>{}</h1>\n", escape(&pattern.pattern_name));
    if !pattern.size.is_empty() {
        let _ = writeln!(html, "<div class=\"size\">Size: {}</div>", escape(&pattern.size));
    }
    html.push_str("<div class=\"pattern-meta\">\n");
    meta_item(&mut html, "Designer", &pattern.designer_name);
    meta_item(&mut html, "Yarn Weight", &pattern.original_yarn_weight);
    meta_item(&mut html, "Needles", &pattern.needle_sizes.join(", "));
    html.push_str("</div>\n");
    if !pattern.notes.is_empty() {
        let _ = writeln!(html, "<div class=\"notes\">{}</div>", escape(&pattern.notes));
    }
    html.push_str("</div>\n");

    render_requirements_table(&mut html, report);

    html.push_str("<div class=\"section\">\n<div class=\"section-title\">Your Stash Matches</div>\n");
    for matches in report.matches {
        render_match_group(&mut html, matches, report.stash);
    }
    html.push_str("</div>\n");

    let _ = write!(
        html,
        "<div class=\"footer\">Generated by Yarn Matcher &bull; {} &bull; {} yarns in stash</div>\n</div>\n</body>\n</html>\n",
        report.generated_at.format("%B %d, %Y at %I:%M %p"),
        report.stash.len()
    );

    html
}

fn meta_item(html: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let _ = writeln!(
        html,
        "<div class=\"pattern-meta-item\"><span class=\"pattern-meta-label\">{}:</span> {}</div>",
        label,
        escape(value)
    );
}

fn render_requirements_table(html: &mut String, report: &MatchReport) {
    html.push_str(
        "<div class=\"section\">\n<div class=\"section-title\">Yarn Requirements</div>\n\
         <table class=\"requirements-table\">\n<thead><tr><th>Yarn</th><th>Grist</th><th>Needed</th><th>Held with</th></tr></thead>\n<tbody>\n",
    );

    for yarn in &report.pattern.yarns {
        let needed = match (yarn.yards_needed > 0.0, yarn.grams_needed > 0.0) {
            (true, true) => format!("{:.0} yards ({:.0}g)", yarn.yards_needed, yarn.grams_needed),
            (true, false) => format!("{:.0} yards", yarn.yards_needed),
            (false, true) => format!("{:.0}g", yarn.grams_needed),
            (false, false) => "Not specified".to_string(),
        };
        let _ = writeln!(
            html,
            "<tr><td><strong>{}</strong></td><td><span class=\"grist-badge\">{:.3} yd/g</span></td><td>{}</td><td>{}</td></tr>",
            escape(&yarn.yarn_name),
            yarn.grist,
            needed,
            escape(yarn.held_together_with.as_deref().unwrap_or("")),
        );
    }
    html.push_str("</tbody></table>\n");

    for matches in report.matches.iter().filter(|m| m.requirement.is_combined) {
        let requirement = &matches.requirement;
        let source = match requirement.grist_source {
            GristSource::Explicit | GristSource::Pattern => "from pattern",
            _ => "calculated",
        };
        let _ = writeln!(
            html,
            "<div class=\"combined-grist\"><strong>Held Together</strong> {}: combined grist <span class=\"grist-badge\">{:.3} yd/g</span> ({})</div>",
            escape(&requirement.label),
            requirement.target_grist,
            source
        );
    }
    html.push_str("</div>\n");
}

fn render_match_group(html: &mut String, matches: &RequirementMatches, stash: &[StashYarn]) {
    let requirement = &matches.requirement;
    let heading = if requirement.holds_pair() || !requirement.is_combined {
        "Matches for"
    } else {
        "Single Yarns Matching Combined Grist"
    };
    let _ = write!(
        html,
        "<div class=\"match-group\">\n<div class=\"match-group-title\">{}: {} \
         <span class=\"target\">(grist {:.3} yd/g, {}",
        heading,
        escape(&requirement.label),
        requirement.target_grist,
        requirement.target_category
    );
    let needed = requirement.required_length();
    if needed > 0.0 {
        let per_strand = if requirement.holds_pair() { " per strand" } else { "" };
        let _ = write!(html, ", need {:.0} yards{}", needed, per_strand);
    }
    html.push_str(")</span></div>\n");

    if matches.is_unmatched() && !matches.has_substitutes() {
        html.push_str("<div class=\"no-matches\">No matches found in your stash for this grist range.</div>\n");
    } else {
        for (rank, candidate) in matches.candidates.iter().enumerate() {
            render_candidate(html, rank + 1, candidate, stash, needed);
        }
    }

    if !matches.single_substitutes.is_empty() {
        html.push_str("<div class=\"subgroup-title\">Single yarns matching the combined grist</div>\n");
        for (rank, candidate) in matches.single_substitutes.iter().enumerate() {
            render_candidate(html, rank + 1, candidate, stash, needed);
        }
    }

    if !matches.pair_substitutes.is_empty() {
        html.push_str("<div class=\"subgroup-title\">Combos: two stash yarns held together</div>\n");
        for (rank, candidate) in matches.pair_substitutes.iter().enumerate() {
            render_candidate(html, rank + 1, candidate, stash, needed);
        }
    }

    html.push_str("</div>\n");
}

fn render_candidate(
    html: &mut String,
    rank: usize,
    candidate: &MatchCandidate,
    stash: &[StashYarn],
    needed: f64,
) {
    let yarns = candidate.yarns(stash);
    let names: Vec<String> = yarns.iter().map(|y| escape(&y.name)).collect();
    let title = if candidate.is_pair() {
        format!("Combo: {}", names.join(" + "))
    } else {
        names.join("")
    };

    let _ = write!(
        html,
        "<div class=\"match-card\">\n<div class=\"rank\">{}</div>\n<div class=\"match-details\">\n\
         <div class=\"match-name\">{}</div>\n<div class=\"match-meta\">\
         <span>Grist: {:.3} yd/g ({:+.1}%)</span>",
        rank,
        title,
        candidate.candidate_grist,
        candidate.relative_error * 100.0 * candidate.grist_delta.signum()
    );

    match candidate.category {
        CategoryMatch::Exact => html.push_str("<span class=\"badge category\">weight match</span>"),
        CategoryMatch::WithinOneStep => {
            html.push_str("<span class=\"badge category\">weight within one step</span>")
        }
        CategoryMatch::None => {}
    }

    for yarn in &yarns {
        if !yarn.color.is_empty() {
            let _ = write!(
                html,
                "<span><span class=\"color-dot\" style=\"background: {}\"></span>{}</span>",
                color_hex(&yarn.color),
                escape(&yarn.color)
            );
        }
    }
    html.push_str("</div>\n</div>\n<div class=\"match-yardage\">");

    for yarn in &yarns {
        let have = match yarn.available_length() {
            Some(yards) => format!("{:.0} yards", yards),
            None => "unknown".to_string(),
        };
        let prefix = if candidate.is_pair() {
            format!("{}: ", escape(&yarn.name))
        } else {
            String::new()
        };
        let _ = write!(html, "<div>{}{}</div>", prefix, have);
    }

    html.push_str(&sufficiency_badge(candidate.sufficient, needed));

    html.push_str("</div>\n</div>\n");
}

/// 必要量が不明なら在庫量に関わらず「不明」
fn sufficiency_badge(sufficient: bool, needed: f64) -> String {
    if needed <= 0.0 {
        "<span class=\"badge unknown\">Quantity unknown</span>".to_string()
    } else if sufficient {
        "<span class=\"badge enough\">Enough</span>".to_string()
    } else {
        format!("<span class=\"badge not-enough\">Need {:.0}</span>", needed)
    }
}
