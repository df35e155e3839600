use thiserror::Error;

/// 运行前即可判定的致命错误：在发出任何请求之前拒绝
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HarvestError {
    #[error("认证 token 为空，请设置 [discord] token 或 DISCORD_TOKEN")]
    MissingToken,
    #[error("频道 ID 为空")]
    EmptyChannelId,
    #[error("未配置任何频道，请设置 [discord] channels 或 CHANNEL_URLS")]
    NoChannels,
    #[error("Sink 后端 '{0}' 缺少必填项: {1}")]
    SinkConfig(String, &'static str),
    #[error("未知的 Sink 后端: {0}（可选 sheets / sqlite / memory）")]
    UnknownSink(String),
}
