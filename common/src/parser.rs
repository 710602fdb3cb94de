//! 編み図JSONパーサー
//!
//! 外部のテキスト解析サービスが出力した編み図JSONを検証し、
//! 型付きの PatternRequirement に変換する。フィールドへのアクセスは
//! すべてここで事前に検証し、違反時は該当フィールド名付きで失敗する。

use crate::error::{Error, Result};
use crate::types::{PatternRequirement, YarnNeed};
use crate::units::parse_grist;
use serde_json::{Map, Value};

/// 貼り付けられたテキストからJSONオブジェクト部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. エラー
///
/// # Examples
/// ```
/// use yarn_matcher_common::extract_json;
///
/// let text = "Here you go: {\"pattern_name\": \"Hat\"} enjoy";
/// assert_eq!(extract_json(text).unwrap(), "{\"pattern_name\": \"Hat\"}");
/// ```
pub fn extract_json(text: &str) -> Result<&str> {
    // ```json ... ``` ブロックを探す
    if let Some(start_marker) = text.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = text[start..].find("```") {
            let end = start + end_offset;
            return Ok(text[start..end].trim());
        }
    }

    // 生の {...} を探す
    if let Some(start) = text.find('{') {
        if let Some(end) = text.rfind('}') {
            if end >= start {
                return Ok(&text[start..=end]);
            }
        }
    }

    Err(Error::malformed("(json)", "JSONオブジェクトが見つかりません"))
}

/// 編み図JSONをパースして検証する
pub fn parse_pattern(text: &str) -> Result<PatternRequirement> {
    let json_str = extract_json(text)?;
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| Error::malformed("(json)", format!("JSONパースエラー: {}", e)))?;
    pattern_from_value(&value)
}

/// 検証済みの serde_json::Value から PatternRequirement を組み立てる
pub fn pattern_from_value(value: &Value) -> Result<PatternRequirement> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::malformed("(root)", "JSONオブジェクトではありません"))?;

    let pattern_name = require_str(obj, "pattern_name", "pattern_name")?;
    let designer_name = require_str(obj, "designer_name", "designer_name")?;
    let size = require_str(obj, "size", "size")?;
    let original_yarn_weight = require_str(obj, "original_yarn_weight", "original_yarn_weight")?;

    let needle_sizes = require(obj, "needle_sizes", "needle_sizes")?
        .as_array()
        .ok_or_else(|| Error::malformed("needle_sizes", "配列ではありません"))?
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::malformed(format!("needle_sizes[{}]", i), "文字列ではありません"))
        })
        .collect::<Result<Vec<_>>>()?;

    let yarns = require(obj, "yarns", "yarns")?
        .as_array()
        .ok_or_else(|| Error::malformed("yarns", "配列ではありません"))?
        .iter()
        .enumerate()
        .map(|(i, v)| parse_yarn(v, &format!("yarns[{}]", i)))
        .collect::<Result<Vec<_>>>()?;

    let combined_grist = match obj.get("combined_grist") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_f64().ok_or_else(|| {
            Error::malformed("combined_grist", "数値ではありません")
        })?),
    };

    let notes = match obj.get("notes") {
        None | Some(Value::Null) => String::new(),
        Some(v) => v
            .as_str()
            .ok_or_else(|| Error::malformed("notes", "文字列ではありません"))?
            .to_string(),
    };

    Ok(PatternRequirement {
        pattern_name,
        designer_name,
        size,
        original_yarn_weight,
        needle_sizes,
        yarns,
        combined_grist,
        notes,
    })
}

fn parse_yarn(value: &Value, path: &str) -> Result<YarnNeed> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::malformed(path, "オブジェクトではありません"))?;

    let grist_path = format!("{}.grist_yd_per_g", path);
    let grist = match require(obj, "grist_yd_per_g", &grist_path)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::malformed(&grist_path, "数値として扱えません"))?,
        // "50g/150m" のような表記も受け付ける
        Value::String(s) => parse_grist(s).map_err(|e| Error::malformed(&grist_path, e.to_string()))?,
        _ => return Err(Error::malformed(&grist_path, "数値ではありません")),
    };

    let held_path = format!("{}.held_together_with", path);
    let held_together_with = match obj.get("held_together_with") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => return Err(Error::malformed(held_path, "文字列またはnullではありません")),
    };

    Ok(YarnNeed {
        yarn_name: require_str(obj, "yarn_name", &format!("{}.yarn_name", path))?,
        grist,
        grams_needed: require_quantity(obj, "grams_needed", &format!("{}.grams_needed", path))?,
        yards_needed: require_quantity(obj, "yards_needed", &format!("{}.yards_needed", path))?,
        color: require_str(obj, "color", &format!("{}.color", path))?,
        held_together_with,
    })
}

fn require<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Value> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(Error::malformed(path, "必須フィールドがありません")),
        Some(v) => Ok(v),
    }
}

fn require_str(obj: &Map<String, Value>, key: &str, path: &str) -> Result<String> {
    require(obj, key, path)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::malformed(path, "文字列ではありません"))
}

/// 0以上の数値
fn require_quantity(obj: &Map<String, Value>, key: &str, path: &str) -> Result<f64> {
    let n = require(obj, key, path)?
        .as_f64()
        .ok_or_else(|| Error::malformed(path, "数値ではありません"))?;
    if n < 0.0 {
        return Err(Error::malformed(path, format!("負の値は指定できません: {}", n)));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "pattern_name": "Harbor Hat",
        "designer_name": "A. Knitter",
        "size": "Adult M",
        "original_yarn_weight": "Fingering",
        "needle_sizes": ["US 4 (3.5mm)", "US 6 (4mm)"],
        "yarns": [
            {
                "yarn_name": "Sock Base",
                "color": "Navy",
                "held_together_with": null,
                "grist_yd_per_g": 4.2,
                "grams_needed": 100,
                "yards_needed": 420
            }
        ],
        "notes": "Knit in the round"
    }"#;

    // =============================================
    // extract_json テスト
    // =============================================

    #[test]
    fn test_extract_json_with_block() {
        let text = "Here is the pattern:\n```json\n{\"pattern_name\": \"Hat\"}\n```\nThanks!";
        assert_eq!(extract_json(text).unwrap(), "{\"pattern_name\": \"Hat\"}");
    }

    #[test]
    fn test_extract_json_raw() {
        assert_eq!(extract_json(VALID).unwrap(), VALID.trim());
    }

    #[test]
    fn test_extract_json_error() {
        let result = extract_json("No JSON here");
        assert!(matches!(result, Err(Error::MalformedPattern { .. })));
    }

    // =============================================
    // parse_pattern テスト
    // =============================================

    #[test]
    fn test_parse_pattern_valid() {
        let pattern = parse_pattern(VALID).unwrap();
        assert_eq!(pattern.pattern_name, "Harbor Hat");
        assert_eq!(pattern.designer_name, "A. Knitter");
        assert_eq!(pattern.needle_sizes.len(), 2);
        assert_eq!(pattern.yarns.len(), 1);
        assert_eq!(pattern.yarns[0].grist, 4.2);
        assert_eq!(pattern.yarns[0].yards_needed, 420.0);
        assert_eq!(pattern.yarns[0].held_together_with, None);
        assert_eq!(pattern.combined_grist, None);
        assert_eq!(pattern.notes, "Knit in the round");
    }

    #[test]
    fn test_parse_pattern_missing_yarns() {
        let text = r#"{
            "pattern_name": "Hat", "designer_name": "X", "size": "M",
            "original_yarn_weight": "DK", "needle_sizes": []
        }"#;
        let err = parse_pattern(text).unwrap_err();
        assert_eq!(err.field(), Some("yarns"));
    }

    #[test]
    fn test_parse_pattern_missing_header_field() {
        let text = VALID.replace("\"designer_name\": \"A. Knitter\",", "");
        let err = parse_pattern(&text).unwrap_err();
        assert_eq!(err.field(), Some("designer_name"));
    }

    #[test]
    fn test_parse_pattern_bad_yarn_number() {
        let text = VALID.replace("\"grams_needed\": 100", "\"grams_needed\": \"lots\"");
        let err = parse_pattern(&text).unwrap_err();
        assert_eq!(err.field(), Some("yarns[0].grams_needed"));
    }

    #[test]
    fn test_parse_pattern_negative_quantity() {
        let text = VALID.replace("\"yards_needed\": 420", "\"yards_needed\": -5");
        let err = parse_pattern(&text).unwrap_err();
        assert_eq!(err.field(), Some("yarns[0].yards_needed"));
    }

    #[test]
    fn test_parse_pattern_grist_ratio_string() {
        let text = VALID.replace("\"grist_yd_per_g\": 4.2", "\"grist_yd_per_g\": \"50g/150yd\"");
        let pattern = parse_pattern(&text).unwrap();
        assert!((pattern.yarns[0].grist - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_pattern_held_together_and_combined() {
        let text = r#"{
            "pattern_name": "Mohair Cardigan", "designer_name": "Y", "size": "S",
            "original_yarn_weight": "Worsted", "needle_sizes": ["5mm"],
            "combined_grist": 1.9,
            "yarns": [
                {"yarn_name": "Wool", "color": "Grey", "held_together_with": "Mohair",
                 "grist_yd_per_g": 4.0, "grams_needed": 300, "yards_needed": 1200},
                {"yarn_name": "Mohair", "color": "Grey", "held_together_with": "",
                 "grist_yd_per_g": 9.0, "grams_needed": 130, "yards_needed": 1200}
            ]
        }"#;
        let pattern = parse_pattern(text).unwrap();
        assert_eq!(pattern.combined_grist, Some(1.9));
        assert_eq!(pattern.yarns[0].held_together_with.as_deref(), Some("Mohair"));
        assert_eq!(pattern.yarns[1].held_together_with, None);
        assert_eq!(pattern.notes, "");
    }

    #[test]
    fn test_parse_pattern_invalid_json() {
        let err = parse_pattern("{ \"pattern_name\": }").unwrap_err();
        assert_eq!(err.field(), Some("(json)"));
    }

    #[test]
    fn test_parse_pattern_needle_not_string() {
        let text = VALID.replace("\"US 6 (4mm)\"", "6");
        let err = parse_pattern(&text).unwrap_err();
        assert_eq!(err.field(), Some("needle_sizes[1]"));
    }
}
