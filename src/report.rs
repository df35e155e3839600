use std::path::Path;

use chrono::{DateTime, Utc};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use crate::discord::Message;
use crate::pipeline::{ChannelReport, RunSummary};

/// 运行元信息
#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    pub timestamp: DateTime<Utc>,
    pub channel_count: usize,
    pub total_messages_found: usize,
    pub rows_written: usize,
}

/// JSON 导出格式
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub metadata: ReportMetadata,
    pub channels: &'a [ChannelReport],
    pub messages: &'a [Message],
}

impl<'a> RunReport<'a> {
    pub fn new(summary: &'a RunSummary, timestamp: DateTime<Utc>) -> Self {
        Self {
            metadata: ReportMetadata {
                timestamp,
                channel_count: summary.channels.len(),
                total_messages_found: summary.matched(),
                rows_written: summary.written(),
            },
            channels: &summary.channels,
            messages: &summary.messages,
        }
    }

    /// 以缩进 JSON（UTF-8，不转义非 ASCII）写入文件
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).wrap_err("创建报告目录失败")?;
        }
        let json = serde_json::to_string_pretty(self).wrap_err("序列化报告失败")?;
        std::fs::write(path, json)
            .wrap_err_with(|| format!("写入报告失败: {}", path.display()))?;
        Ok(())
    }
}
