use serde::{Deserialize, Serialize};

/// 消息不属于任何服务器时的 guild_id / 服务器名
pub const DM_GUILD: &str = "DM";
/// 元数据或作者缺失时的占位值
pub const UNKNOWN: &str = "Unknown";

/// 抓取到的频道消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub timestamp: String,
    pub author_name: String,
    pub content: String,
    pub channel_id: String,
    pub guild_id: String,
    /// 由 KeywordMatcher 填写；未过滤时为空
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_keywords: Vec<String>,
}

impl Message {
    /// 消息体未带 guild_id 时，用频道元数据里解析到的服务器 ID 补齐
    pub fn backfill_guild(&mut self, info: &ChannelInfo) {
        if self.guild_id == DM_GUILD {
            if let Some(guild_id) = &info.guild_id {
                self.guild_id = guild_id.clone();
            }
        }
    }
}

/// 频道元数据（每个频道解析一次）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel_name: String,
    pub guild_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
}

impl ChannelInfo {
    /// 全部字段降级为占位值
    pub fn unknown() -> Self {
        Self {
            channel_name: UNKNOWN.to_string(),
            guild_name: UNKNOWN.to_string(),
            guild_id: None,
        }
    }
}

// --- Discord API 响应结构体（仅用于反序列化）---

#[derive(Debug, Deserialize)]
pub(crate) struct RawMessage {
    pub id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub author: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUser {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawChannel {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub recipients: Vec<RawUser>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGuild {
    #[serde(default)]
    pub name: Option<String>,
}

impl RawMessage {
    /// 转为内部 Message；请求的频道 ID 作为 channel_id 的兜底
    pub fn into_message(self, channel_id: &str) -> Message {
        Message {
            id: self.id,
            timestamp: self.timestamp,
            author_name: self
                .author
                .and_then(|a| a.username)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            content: self.content,
            channel_id: self.channel_id.unwrap_or_else(|| channel_id.to_string()),
            guild_id: self.guild_id.unwrap_or_else(|| DM_GUILD.to_string()),
            matched_keywords: vec![],
        }
    }
}
