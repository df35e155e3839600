use crate::discord::{ChannelInfo, Message, UNKNOWN};

/// 表头（列顺序即写入顺序，第一列为去重键）
pub const HEADER: [&str; 12] = [
    "Message ID",
    "Timestamp",
    "Author",
    "Content",
    "Keywords",
    "Channel ID",
    "Server ID",
    "Channel Name",
    "Server Name",
    "Response Status",
    "Response Sent",
    "Response Content",
];

/// Content 列最大字符数
pub const MAX_CONTENT_CHARS: usize = 500;

/// 新写入行的回复状态（供下游回复流程使用）
pub const PENDING_STATUS: &str = "Pending";

/// 表头行
pub fn header_row() -> Vec<String> {
    HEADER.iter().map(|s| s.to_string()).collect()
}

/// 由消息和频道元数据拼出一行；元数据缺失时用 "Unknown"
pub fn build_row(message: &Message, info: Option<&ChannelInfo>) -> Vec<String> {
    let (channel_name, guild_name) = match info {
        Some(i) => (i.channel_name.clone(), i.guild_name.clone()),
        None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
    };
    vec![
        message.id.clone(),
        message.timestamp.clone(),
        message.author_name.clone(),
        truncate_chars(&message.content, MAX_CONTENT_CHARS),
        message.matched_keywords.join(", "),
        message.channel_id.clone(),
        message.guild_id.clone(),
        channel_name,
        guild_name,
        PENDING_STATUS.to_string(),
        String::new(),
        String::new(),
    ]
}

/// 按 char 边界截断，避免多字节字符 panic
fn truncate_chars(s: &str, max: usize) -> String {
    s.char_indices()
        .nth(max)
        .map(|(i, _)| &s[..i])
        .unwrap_or(s)
        .to_string()
}
