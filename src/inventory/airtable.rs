//! Airtable在庫リーダー
//!
//! `GET {api_url}/{base}/{table}` をoffsetカーソルが尽きるまで繰り返し、
//! 全レコードを取得する。

use super::{stash_from_fields, InventoryConfig, StashSource};
use crate::error::{Result, YarnMatcherError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};
use yarn_matcher_common::StashYarn;

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Record {
    id: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

pub struct AirtableReader {
    client: Client,
    config: InventoryConfig,
}

impl AirtableReader {
    pub fn new(config: InventoryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| YarnMatcherError::InventoryUnavailable(format!("HTTPクライアント生成失敗: {}", e)))?;

        Ok(Self { client, config })
    }

    /// テーブルのURL（テーブル名はパスセグメントとしてエンコード）
    fn table_url(&self) -> Result<Url> {
        let mut url = Url::parse(self.config.api_url.trim_end_matches('/'))
            .map_err(|e| YarnMatcherError::Config(format!("api_urlが不正です: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| YarnMatcherError::Config(format!("api_urlが不正です: {}", self.config.api_url)))?
            .push(&self.config.base_identifier)
            .push(&self.config.table_name);
        Ok(url)
    }

    /// 1ページ分を取得
    async fn fetch_page(&self, url: &Url, offset: Option<&str>) -> Result<ListResponse> {
        let mut request = self.client.get(url.clone()).bearer_auth(&self.config.api_token);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let response = request.send().await.map_err(|e| {
            let cause = if e.is_timeout() {
                "タイムアウトしました".to_string()
            } else if e.is_connect() {
                format!("接続できません: {}", e)
            } else {
                e.to_string()
            };
            YarnMatcherError::InventoryUnavailable(cause)
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(YarnMatcherError::InventoryUnavailable(format!(
                "認証に失敗しました (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YarnMatcherError::InventoryUnavailable(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| YarnMatcherError::InventoryUnavailable(format!("レスポンスの解析に失敗: {}", e)))
    }
}

#[async_trait]
impl StashSource for AirtableReader {
    fn name(&self) -> &str {
        &self.config.table_name
    }

    async fn fetch_all(&self) -> Result<Vec<StashYarn>> {
        let url = self.table_url()?;
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(&url, offset.as_deref()).await?;
            pages += 1;
            debug!(page = pages, records = page.records.len(), "在庫ページを取得");
            records.extend(page.records);

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        let total = records.len();
        let stash: Vec<StashYarn> = records
            .iter()
            .filter_map(|record| {
                let yarn = stash_from_fields(&record.id, &record.fields, &self.config.columns);
                if yarn.is_none() {
                    debug!(record_id = %record.id, "番手がないためスキップ");
                }
                yarn
            })
            .collect();

        info!(
            table = %self.config.table_name,
            pages,
            total,
            usable = stash.len(),
            "在庫を読み込みました"
        );

        Ok(stash)
    }
}
