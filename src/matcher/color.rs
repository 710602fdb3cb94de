//! 色名のあいまい一致

/// 代表的な色名（部分一致で判定）
pub const BASE_COLORS: &[&str] = &[
    "red", "blue", "green", "yellow", "orange", "purple", "pink", "brown", "black", "white",
    "grey", "gray", "cream", "beige", "navy", "teal", "coral", "burgundy", "maroon", "olive",
];

fn base_color(color: &str) -> Option<&'static str> {
    BASE_COLORS.iter().copied().find(|c| color.contains(c))
}

fn is_grey(color: &str) -> bool {
    color.contains("grey") || color.contains("gray")
}

/// 2つの色表記が近いか
///
/// 完全一致・部分一致・代表色の一致で判定し、grey/gray は同一視する。
/// どちらかが空なら false。
pub fn colors_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b || a.contains(&b) || b.contains(&a) {
        return true;
    }
    if is_grey(&a) && is_grey(&b) {
        return true;
    }
    matches!((base_color(&a), base_color(&b)), (Some(x), Some(y)) if x == y)
}
