//! 単位の正規化
//!
//! 糸の太さに関する表記ゆれ（太さ区分の名称、g/m・g/yd などの番手表記、
//! 引き揃え）を yd/g の数値と固定の区分トークンにそろえる。

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 1メートルあたりのヤード数
pub const YARDS_PER_METER: f64 = 1.093_613_3;

/// 糸の太さ区分
///
/// 並び順は細い順（Lace < Fingering < … < SuperBulky）。
/// Unknown は区分だけでは一致扱いにならない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightCategory {
    Lace,
    Fingering,
    Sport,
    Dk,
    Worsted,
    Aran,
    Bulky,
    SuperBulky,
    Unknown,
}

impl WeightCategory {
    /// 既知の区分（細い順）
    pub const ORDERED: [WeightCategory; 8] = [
        WeightCategory::Lace,
        WeightCategory::Fingering,
        WeightCategory::Sport,
        WeightCategory::Dk,
        WeightCategory::Worsted,
        WeightCategory::Aran,
        WeightCategory::Bulky,
        WeightCategory::SuperBulky,
    ];

    /// 自由記述の区分名を正規化する（大文字小文字・空白・ハイフンは無視）
    pub fn parse(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "lace" | "cobweb" | "lightfingering" | "1ply" | "2ply" | "3ply" => WeightCategory::Lace,
            "fingering" | "sock" | "4ply" | "superfine" => WeightCategory::Fingering,
            "sport" | "5ply" | "baby" | "fine" => WeightCategory::Sport,
            "dk" | "doubleknitting" | "8ply" | "lightworsted" | "light" => WeightCategory::Dk,
            "worsted" | "10ply" | "afghan" | "medium" => WeightCategory::Worsted,
            "aran" | "heavyworsted" => WeightCategory::Aran,
            "bulky" | "chunky" | "12ply" => WeightCategory::Bulky,
            "superbulky" | "superchunky" | "jumbo" | "roving" => WeightCategory::SuperBulky,
            _ => WeightCategory::Unknown,
        }
    }

    /// 細い順の位置（Unknown は None）
    pub fn rank(&self) -> Option<usize> {
        Self::ORDERED.iter().position(|c| c == self)
    }

    /// 区分間の段差。どちらかが Unknown なら None
    pub fn steps_between(&self, other: &WeightCategory) -> Option<usize> {
        let a = self.rank()?;
        let b = other.rank()?;
        Some(a.abs_diff(b))
    }

    /// 区分が一致するか（Unknown 同士は一致しない）
    pub fn matches(&self, other: &WeightCategory) -> bool {
        *self != WeightCategory::Unknown && self == other
    }

    /// 1段差以内か
    pub fn is_within_one_step(&self, other: &WeightCategory) -> bool {
        matches!(self.steps_between(other), Some(steps) if steps <= 1)
    }

    pub fn is_unknown(&self) -> bool {
        *self == WeightCategory::Unknown
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeightCategory::Lace => "Lace",
            WeightCategory::Fingering => "Fingering",
            WeightCategory::Sport => "Sport",
            WeightCategory::Dk => "DK",
            WeightCategory::Worsted => "Worsted",
            WeightCategory::Aran => "Aran",
            WeightCategory::Bulky => "Bulky",
            WeightCategory::SuperBulky => "Super Bulky",
            WeightCategory::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for WeightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 番手（yd/g）から太さ区分を推定する
///
/// 各区分の下限値: Lace 5.5, Fingering 3.3, Sport 2.6, DK 2.0,
/// Worsted 1.7, Aran 1.4, Bulky 0.9
pub fn category_for_grist(yd_per_g: f64) -> WeightCategory {
    const LOWER_BOUNDS: [(f64, WeightCategory); 7] = [
        (5.5, WeightCategory::Lace),
        (3.3, WeightCategory::Fingering),
        (2.6, WeightCategory::Sport),
        (2.0, WeightCategory::Dk),
        (1.7, WeightCategory::Worsted),
        (1.4, WeightCategory::Aran),
        (0.9, WeightCategory::Bulky),
    ];

    if yd_per_g.is_nan() || yd_per_g <= 0.0 {
        return WeightCategory::Unknown;
    }

    LOWER_BOUNDS
        .iter()
        .find(|(bound, _)| yd_per_g >= *bound)
        .map(|(_, category)| *category)
        .unwrap_or(WeightCategory::SuperBulky)
}

/// 単位の種類
#[derive(Debug, Clone, Copy, PartialEq)]
enum Unit {
    /// グラム
    Mass,
    /// 長さ（ヤード換算係数）
    Length(f64),
}

fn parse_unit(text: &str) -> Option<Unit> {
    match text.to_lowercase().as_str() {
        "g" | "gr" | "gram" | "grams" | "gramm" => Some(Unit::Mass),
        "m" | "meter" | "meters" | "metre" | "metres" => Some(Unit::Length(YARDS_PER_METER)),
        "yd" | "yds" | "yard" | "yards" => Some(Unit::Length(1.0)),
        _ => None,
    }
}

/// 番手表記を yd/g に変換する
///
/// 対応する表記:
/// - `50g/150m`, `150m/50g`, `100 g / 400 yd`
/// - `3.2 yd/g`, `2.9 m/g`
/// - 数値のみ（yd/g とみなす）
///
/// # Examples
/// ```
/// use yarn_matcher_common::units::parse_grist;
///
/// let grist = parse_grist("50g/150yd").unwrap();
/// assert!((grist - 3.0).abs() < 1e-9);
/// ```
pub fn parse_grist(text: &str) -> Result<f64> {
    lazy_static::lazy_static! {
        static ref RATIO_RE: Regex = Regex::new(
            r"^\s*(\d+(?:\.\d+)?)?\s*([A-Za-z]+)\s*/\s*(\d+(?:\.\d+)?)?\s*([A-Za-z]+)\s*$"
        ).unwrap();
        static ref NUMBER_RE: Regex = Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*$").unwrap();
    }

    let grist = if let Some(cap) = NUMBER_RE.captures(text) {
        cap[1]
            .parse::<f64>()
            .map_err(|e| Error::Unit(format!("{}: {}", text, e)))?
    } else if let Some(cap) = RATIO_RE.captures(text) {
        let amount = |idx: usize| -> Result<f64> {
            match cap.get(idx) {
                Some(m) => m
                    .as_str()
                    .parse::<f64>()
                    .map_err(|e| Error::Unit(format!("{}: {}", text, e))),
                None => Ok(1.0),
            }
        };
        let left = amount(1)?;
        let right = amount(3)?;
        let left_unit = parse_unit(&cap[2])
            .ok_or_else(|| Error::Unit(format!("未対応の単位: {}", &cap[2])))?;
        let right_unit = parse_unit(&cap[4])
            .ok_or_else(|| Error::Unit(format!("未対応の単位: {}", &cap[4])))?;

        match (left_unit, right_unit) {
            (Unit::Mass, Unit::Length(factor)) => right * factor / left,
            (Unit::Length(factor), Unit::Mass) => left * factor / right,
            _ => {
                return Err(Error::Unit(format!(
                    "重さと長さの組み合わせではありません: {}",
                    text
                )))
            }
        }
    } else {
        return Err(Error::Unit(format!("番手として解釈できません: {}", text)));
    };

    if !grist.is_finite() || grist <= 0.0 {
        return Err(Error::Unit(format!("番手は正の値である必要があります: {}", text)));
    }

    Ok(grist)
}

/// 引き揃えた糸の合成番手
///
/// 1本あたりの重さが加算されるので 1 / Σ(1/gᵢ) になる。
/// 空、または0以下の値を含む場合は None。
pub fn combine_grist(grists: &[f64]) -> Option<f64> {
    if grists.is_empty() || grists.iter().any(|g| g.is_nan() || *g <= 0.0) {
        return None;
    }
    let inverse_sum: f64 = grists.iter().map(|g| 1.0 / g).sum();
    Some(1.0 / inverse_sum)
}
