use std::time::Duration;

use async_trait::async_trait;
use color_eyre::eyre::{eyre, Context, Result};
use serde::Deserialize;

use super::traits::Sink;
use crate::config::SheetsConfig;
use crate::error::HarvestError;

/// Google Sheets Sink（REST v4，Bearer access token）
///
/// 存在性检查与追加是两次独立请求，没有原子性保证；并发运行可能写入重复行。
///
/// `contains_key` 每次都重新读取整个 A 列，每条候选消息消耗一次读配额和一次写配额。
/// 读配额耗尽（429）时检查失败，`DedupSyncWriter` 按"不存在"处理并照常追加，
/// 此时表中已有的消息会被重复写入。大批量同步请改用 sqlite 后端或分批运行。
pub struct SheetsSink {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    access_token: String,
}

impl SheetsSink {
    pub fn new(config: &SheetsConfig) -> Result<Self> {
        if config.spreadsheet_id.trim().is_empty() {
            return Err(HarvestError::SinkConfig("sheets".to_string(), "spreadsheet_id").into());
        }
        if config.access_token.trim().is_empty() {
            return Err(HarvestError::SinkConfig("sheets".to_string(), "access_token").into());
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .wrap_err("创建 HTTP 客户端失败")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.trim().to_string(),
            sheet_name: config.sheet_name.clone(),
            access_token: config.access_token.trim().to_string(),
        })
    }

    /// A1 表示法的区间，工作表名加引号以支持空格
    fn range(&self, cols: &str) -> String {
        format!("'{}'!{}", self.sheet_name.replace('\'', "''"), cols)
    }

    /// `{base}/spreadsheets/{id}/values/{range}{suffix}`
    fn values_url(&self, range: &str, suffix: &str) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.base_url)
            .wrap_err_with(|| format!("非法 Sheets 地址: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| eyre!("Sheets 地址不能作为 base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    /// 读取第一列（去重键列）
    async fn key_column(&self) -> Result<Vec<String>> {
        let url = self.values_url(&self.range("A:A"), "")?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .wrap_err("读取 Sheets 键列失败")?;

        let status = resp.status();
        let text = resp.text().await.wrap_err("读取 Sheets 响应失败")?;
        if !status.is_success() {
            return Err(eyre!("Sheets 读取失败 ({}): {}", status, text));
        }

        let parsed: ValueRange = serde_json::from_str(&text).wrap_err("解析 Sheets 响应失败")?;
        Ok(parsed
            .values
            .into_iter()
            .map(|row| row.into_iter().next().map(cell_to_string).unwrap_or_default())
            .collect())
    }
}

fn cell_to_string(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[async_trait]
impl Sink for SheetsSink {
    fn name(&self) -> &str {
        "sheets"
    }

    async fn row_count(&self) -> Result<usize> {
        Ok(self.key_column().await?.len())
    }

    async fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.key_column().await?.iter().any(|k| k == key))
    }

    async fn append_row(&self, row: &[String]) -> Result<()> {
        let mut url = self.values_url(&self.range("A1"), ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = serde_json::json!({ "values": [row] });
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .wrap_err("追加 Sheets 行失败")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(eyre!("Sheets 追加失败 ({}): {}", status, text));
        }
        Ok(())
    }
}

// --- Sheets 响应结构体（仅用于反序列化）---

#[derive(Debug, Deserialize)]
struct ValueRange {
    /// 空区间时 API 省略该字段
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SheetsConfig {
        SheetsConfig {
            spreadsheet_id: "sheet123".to_string(),
            access_token: "ya29.token".to_string(),
            ..SheetsConfig::default()
        }
    }

    #[test]
    fn missing_fields_rejected() {
        let mut cfg = config();
        cfg.spreadsheet_id.clear();
        let err = SheetsSink::new(&cfg).err().unwrap();
        assert_eq!(
            err.downcast_ref::<HarvestError>(),
            Some(&HarvestError::SinkConfig("sheets".to_string(), "spreadsheet_id"))
        );

        let mut cfg = config();
        cfg.access_token = "  ".to_string();
        assert!(SheetsSink::new(&cfg).is_err());
    }

    #[test]
    fn values_url_layout() {
        let sink = SheetsSink::new(&config()).unwrap();
        let url = sink.values_url(&sink.range("A:A"), "").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet123/values/'Sheet1'!A:A"
        );
    }

    #[test]
    fn sheet_name_with_space_is_encoded() {
        let mut cfg = config();
        cfg.sheet_name = "Leads 2024".to_string();
        let sink = SheetsSink::new(&cfg).unwrap();
        let url = sink.values_url(&sink.range("A1"), ":append").unwrap();
        assert!(url.path().ends_with("/values/'Leads%202024'!A1:append"));
    }

    #[test]
    fn value_range_without_values_is_empty() {
        let parsed: ValueRange =
            serde_json::from_str(r#"{"range": "Sheet1!A1:A1000", "majorDimension": "ROWS"}"#)
                .unwrap();
        assert!(parsed.values.is_empty());
    }
}
