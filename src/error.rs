use thiserror::Error;

#[derive(Error, Debug)]
pub enum YarnMatcherError {
    /// 編み図JSONの不備（共通ライブラリから透過）
    #[error(transparent)]
    Common(#[from] yarn_matcher_common::Error),

    #[error("在庫テーブルに接続できません: {0}")]
    InventoryUnavailable(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("在庫テーブルの認証情報が設定されていません。`yarn-matcher config --set-token TOKEN --set-base BASE_ID` で設定してください")]
    MissingCredentials,

    #[error("編み図JSONが入力されていません")]
    EmptyInput,

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("レポート生成エラー: {0}")]
    Report(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl YarnMatcherError {
    /// 編み図データの不備か
    pub fn is_malformed_pattern(&self) -> bool {
        matches!(
            self,
            YarnMatcherError::Common(yarn_matcher_common::Error::MalformedPattern { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, YarnMatcherError>;
