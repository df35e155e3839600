use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

/// 匹配 `/channels/<guild|@me>/<channel>[/<message>]`
fn channel_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/channels/(?:@me|\d+)/(\d+)(?:/\d+)?/?(?:[?#].*)?$").expect("频道 URL 正则非法")
    })
}

/// 从频道 URL 中提取频道 ID；不是 URL 时原样返回（去除首尾空白）
///
/// 消息链接（`/channels/<guild>/<channel>/<message>`）取频道段而不是消息段。
/// 只有服务器段、没有频道段的 URL 返回空串（由 `parse_channel_list` 丢弃）。
pub fn extract_channel_id(channel_ref: &str) -> String {
    let trimmed = channel_ref.trim();
    if let Some(caps) = channel_url_re().captures(trimmed) {
        return caps[1].to_string();
    }
    if let Some((_, rest)) = trimmed.split_once("/channels/") {
        // 非常规格式：取 /channels/ 之后的第二段
        let path = rest.split(['?', '#']).next().unwrap_or_default();
        return match path.split('/').filter(|s| !s.is_empty()).nth(1) {
            Some(channel) => channel.to_string(),
            None => {
                warn!("频道 URL 缺少频道段，已忽略: {}", trimmed);
                String::new()
            }
        };
    }
    trimmed.to_string()
}

/// 解析频道列表：提取 ID、丢弃空项，保持输入顺序
pub fn parse_channel_list(refs: &[String]) -> Vec<String> {
    refs.iter()
        .map(|r| extract_channel_id(r))
        .filter(|id| !id.is_empty())
        .collect()
}
