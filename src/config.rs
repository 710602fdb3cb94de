use crate::error::{Result, YarnMatcherError};
use crate::inventory::{ColumnMapping, InventoryConfig};
use crate::matcher::{DEFAULT_THRESHOLD, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_token: Option<String>,
    pub base_identifier: Option<String>,
    pub table_name: String,
    pub api_url: String,
    pub reports_dir: PathBuf,
    pub timeout_seconds: u64,
    pub threshold: f64,
    pub top_k: usize,
    pub columns: ColumnMapping,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_token: None,
            base_identifier: None,
            table_name: "Yarn".into(),
            api_url: DEFAULT_API_URL.into(),
            reports_dir: PathBuf::from("pattern_matches"),
            timeout_seconds: 30,
            threshold: DEFAULT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            columns: ColumnMapping::default(),
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数で上書きする
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        Ok(config.with_env_overrides())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| YarnMatcherError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("yarn-matcher").join("config.json"))
    }

    fn with_env_overrides(mut self) -> Self {
        // 環境変数を優先
        if let Ok(token) = std::env::var("YARN_MATCHER_API_TOKEN") {
            self.api_token = Some(token);
        }
        if let Ok(base) = std::env::var("YARN_MATCHER_BASE_ID") {
            self.base_identifier = Some(base);
        }
        if let Ok(table) = std::env::var("YARN_MATCHER_TABLE") {
            self.table_name = table;
        }
        self
    }

    /// 在庫リーダー用の設定を組み立てる
    pub fn inventory_config(&self) -> Result<InventoryConfig> {
        let api_token = self
            .api_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(YarnMatcherError::MissingCredentials)?;
        let base_identifier = self
            .base_identifier
            .clone()
            .filter(|b| !b.trim().is_empty())
            .ok_or(YarnMatcherError::MissingCredentials)?;

        Ok(InventoryConfig {
            api_token,
            base_identifier,
            table_name: self.table_name.clone(),
            api_url: self.api_url.clone(),
            columns: self.columns.clone(),
            timeout_seconds: self.timeout_seconds,
        })
    }

    /// 表示用にトークンを伏せ字にする
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = match self.api_token.as_deref() {
            None | Some("") => return "未設定".into(),
            Some(token) => token.chars().collect(),
        };
        if chars.len() <= 8 {
            return "********".into();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.reports_dir, PathBuf::from("pattern_matches"));
        assert_eq!(config.top_k, 3);
        assert!((config.threshold - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"api_token": "patXYZ", "table_name": "Stash"}"#).unwrap();
        assert_eq!(config.api_token.as_deref(), Some("patXYZ"));
        assert_eq!(config.table_name, "Stash");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.columns.name, "Name");
    }

    #[test]
    fn test_inventory_config_requires_credentials() {
        let config = Config::default();
        assert!(matches!(
            config.inventory_config(),
            Err(YarnMatcherError::MissingCredentials)
        ));

        let config = Config {
            api_token: Some("patABCDEFGH123".into()),
            base_identifier: Some("appBASE".into()),
            ..Config::default()
        };
        let inventory = config.inventory_config().unwrap();
        assert_eq!(inventory.base_identifier, "appBASE");
        assert_eq!(inventory.table_name, "Yarn");
    }

    #[test]
    fn test_masked_token() {
        let mut config = Config::default();
        assert_eq!(config.masked_token(), "未設定");
        config.api_token = Some("short".into());
        assert_eq!(config.masked_token(), "********");
        config.api_token = Some("patABCDEFGH1234".into());
        assert_eq!(config.masked_token(), "patA…1234");
    }
}
