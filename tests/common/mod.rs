//! 集成测试公共辅助函数
//!
//! 供 pagination.rs、pipeline_e2e.rs、dedup_sync.rs 和 http_backends.rs 共用。

// 每个集成测试文件只使用 common 的一部分，未用到的辅助函数属于预期 dead_code
#![allow(dead_code)]

pub mod http_stub;
pub mod mock_transport;
pub use mock_transport::MockTransport;

use chatsift::discord::Message;

/// 解析雪花 ID（测试里的 ID 都是数字）
pub fn snowflake(id: &str) -> u64 {
    id.parse().expect("测试消息 ID 应为数字")
}

/// 构造一条已命中关键词的消息
pub fn matched_message(id: &str, content: &str, keywords: &[&str]) -> Message {
    Message {
        id: id.to_string(),
        timestamp: "2024-05-01T10:00:00+00:00".to_string(),
        author_name: "alice".to_string(),
        content: content.to_string(),
        channel_id: "7".to_string(),
        guild_id: "9".to_string(),
        matched_keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}
