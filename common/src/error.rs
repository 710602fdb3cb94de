//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// 編み図JSONのスキーマ違反・引き揃え参照の不整合
    #[error("編み図データが不正です（{field}）: {reason}")]
    MalformedPattern { field: String, reason: String },

    #[error("単位変換エラー: {0}")]
    Unit(String),
}

impl Error {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedPattern {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// MalformedPatternの場合、問題のフィールド名を返す
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::MalformedPattern { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_malformed() {
        let error = Error::malformed("yarns", "必須フィールドがありません");
        let display = format!("{}", error);
        assert_eq!(display, "編み図データが不正です（yarns）: 必須フィールドがありません");
    }

    #[test]
    fn test_error_field() {
        let error = Error::malformed("yarns[0].grist_yd_per_g", "数値ではありません");
        assert_eq!(error.field(), Some("yarns[0].grist_yd_per_g"));
        assert_eq!(Error::Unit("x".into()).field(), None);
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Unit("テスト".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Unit"));
        assert!(debug.contains("テスト"));
    }
}
