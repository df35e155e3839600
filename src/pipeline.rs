use std::sync::Arc;

use color_eyre::eyre::Result;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::discord::{
    ChannelInfo, ChannelMetadataResolver, HttpTransport, Message, PaginatedFetcher,
    RateLimitState, Transport,
};
use crate::error::HarvestError;
use crate::filter::KeywordMatcher;
use crate::sink::Sink;
use crate::sync::DedupSyncWriter;

/// 单个频道的处理统计
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel_id: String,
    pub channel_name: String,
    pub guild_name: String,
    pub fetched: usize,
    pub matched: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    /// 抓取终止原因
    pub stop: String,
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub channels: Vec<ChannelReport>,
    /// 所有频道命中关键词的消息（含 matched_keywords）
    pub messages: Vec<Message>,
}

impl RunSummary {
    pub fn fetched(&self) -> usize {
        self.channels.iter().map(|c| c.fetched).sum()
    }

    pub fn matched(&self) -> usize {
        self.channels.iter().map(|c| c.matched).sum()
    }

    pub fn written(&self) -> usize {
        self.channels.iter().map(|c| c.written).sum()
    }
}

/// 逐频道执行：元数据 → 抓取 → 过滤 → 去重同步
pub struct Pipeline {
    resolver: Option<ChannelMetadataResolver>,
    fetcher: PaginatedFetcher,
    matcher: KeywordMatcher,
    writer: DedupSyncWriter,
    max_messages: Option<usize>,
}

impl Pipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        sink: Arc<dyn Sink>,
        matcher: KeywordMatcher,
        max_messages: Option<usize>,
    ) -> Self {
        Self {
            resolver: Some(ChannelMetadataResolver::new(transport.clone())),
            fetcher: PaginatedFetcher::new(transport),
            matcher,
            writer: DedupSyncWriter::new(sink),
            max_messages,
        }
    }

    /// 关闭元数据解析（行中名称列写 "Unknown"）
    pub fn without_metadata(mut self) -> Self {
        self.resolver = None;
        self
    }

    pub fn with_max_throttle_retries(mut self, retries: u32) -> Self {
        self.fetcher = self.fetcher.with_max_throttle_retries(retries);
        self
    }

    /// 由配置构建（真实 HTTP 传输层）；token 为空时报错
    pub fn from_config(config: &Config, sink: Arc<dyn Sink>) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.discord)?);
        let matcher = KeywordMatcher::new(config.filter.keywords.as_slice());
        if matcher.is_empty() {
            warn!("未配置关键词，本次运行不会命中任何消息");
        }

        let mut pipeline = Self::new(transport, sink, matcher, config.discord.message_cap())
            .with_max_throttle_retries(config.discord.max_throttle_retries);
        if !config.discord.resolve_metadata {
            pipeline = pipeline.without_metadata();
        }
        Ok(pipeline)
    }

    /// 按输入顺序逐个处理频道
    ///
    /// 频道列表为空或含空 ID 时在任何请求之前报错；单个频道的失败只降低统计数。
    pub async fn run(&self, channel_ids: &[String]) -> Result<RunSummary> {
        if channel_ids.is_empty() {
            return Err(HarvestError::NoChannels.into());
        }
        if channel_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(HarvestError::EmptyChannelId.into());
        }

        let mut summary = RunSummary::default();
        let mut limits = RateLimitState::new(Instant::now());

        for channel_id in channel_ids {
            let channel_id = channel_id.trim();
            info!("开始处理频道 {}", channel_id);

            let channel_info = match &self.resolver {
                Some(resolver) => Some(resolver.resolve(channel_id).await),
                None => None,
            };

            let outcome = self
                .fetcher
                .fetch(channel_id, self.max_messages, limits)
                .await?;
            limits = outcome.limits;
            let fetched = outcome.messages.len();

            let mut matched = self.matcher.filter(outcome.messages);
            if let Some(info) = &channel_info {
                for m in &mut matched {
                    m.backfill_guild(info);
                }
            }
            info!(
                "频道 {}: 抓取 {} 条，命中 {} 条",
                channel_id,
                fetched,
                matched.len()
            );

            let report = self
                .writer
                .sync_report(&matched, channel_info.as_ref())
                .await;

            let info = channel_info.unwrap_or_else(ChannelInfo::unknown);
            summary.channels.push(ChannelReport {
                channel_id: channel_id.to_string(),
                channel_name: info.channel_name,
                guild_name: info.guild_name,
                fetched,
                matched: matched.len(),
                written: report.written,
                skipped: report.skipped,
                failed: report.failed,
                stop: outcome.stop.to_string(),
            });
            summary.messages.extend(matched);
        }

        info!(
            "运行结束: 抓取 {}，命中 {}，新写入 {}",
            summary.fetched(),
            summary.matched(),
            summary.written()
        );
        Ok(summary)
    }
}
