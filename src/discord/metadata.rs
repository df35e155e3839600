use std::sync::Arc;

use tracing::{debug, warn};

use super::transport::{ApiRequest, Transport};
use super::types::{ChannelInfo, RawChannel, RawGuild, DM_GUILD, UNKNOWN};

/// 频道元数据解析（尽力而为：任何失败都降级为 "Unknown"）
pub struct ChannelMetadataResolver {
    transport: Arc<dyn Transport>,
}

impl ChannelMetadataResolver {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn resolve(&self, channel_id: &str) -> ChannelInfo {
        let Some(channel) = self
            .get_json::<RawChannel>(&format!("/channels/{}", channel_id))
            .await
        else {
            return ChannelInfo::unknown();
        };

        let channel_name = channel
            .name
            .filter(|n| !n.is_empty())
            .or_else(|| {
                // 私信频道没有 name，用参与者用户名代替
                let names: Vec<String> = channel
                    .recipients
                    .into_iter()
                    .filter_map(|u| u.username)
                    .collect();
                (!names.is_empty()).then(|| names.join(", "))
            })
            .unwrap_or_else(|| UNKNOWN.to_string());

        let guild_name = match &channel.guild_id {
            Some(guild_id) => self
                .get_json::<RawGuild>(&format!("/guilds/{}", guild_id))
                .await
                .and_then(|g| g.name)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            None => DM_GUILD.to_string(),
        };

        debug!(
            "频道 {} 元数据: #{} @ {}",
            channel_id, channel_name, guild_name
        );
        ChannelInfo {
            channel_name,
            guild_name,
            guild_id: channel.guild_id,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Option<T> {
        let response = match self.transport.get(&ApiRequest::new(path)).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("元数据请求 {} 失败: {:#}", path, e);
                return None;
            }
        };
        if !response.is_success() {
            warn!("元数据请求 {} 返回状态码 {}", path, response.status);
            return None;
        }
        match serde_json::from_str(&response.body) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("元数据响应 {} 解析失败: {}", path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discord::transport::ApiResponse;
    use async_trait::async_trait;
    use color_eyre::eyre::{eyre, Result};
    use std::collections::HashMap;

    /// 按路径返回固定响应；未登记的路径视为传输失败
    struct RoutedTransport {
        routes: HashMap<String, (u16, String)>,
    }

    #[async_trait]
    impl Transport for RoutedTransport {
        async fn get(&self, request: &ApiRequest) -> Result<ApiResponse> {
            let (status, body) = self
                .routes
                .get(&request.path)
                .cloned()
                .ok_or_else(|| eyre!("connection refused"))?;
            Ok(ApiResponse {
                status,
                body,
                ..Default::default()
            })
        }
    }

    fn resolver(routes: &[(&str, u16, &str)]) -> ChannelMetadataResolver {
        let routes = routes
            .iter()
            .map(|(p, s, b)| (p.to_string(), (*s, b.to_string())))
            .collect();
        ChannelMetadataResolver::new(Arc::new(RoutedTransport { routes }))
    }

    #[tokio::test]
    async fn resolves_guild_channel() {
        let r = resolver(&[
            ("/channels/1", 200, r#"{"id": "1", "name": "homework-help", "guild_id": "9"}"#),
            ("/guilds/9", 200, r#"{"id": "9", "name": "Study Hall"}"#),
        ]);
        let info = r.resolve("1").await;
        assert_eq!(info.channel_name, "homework-help");
        assert_eq!(info.guild_name, "Study Hall");
        assert_eq!(info.guild_id.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn channel_lookup_failure_degrades_to_unknown() {
        let r = resolver(&[("/channels/1", 404, r#"{"message": "Unknown Channel"}"#)]);
        assert_eq!(r.resolve("1").await, ChannelInfo::unknown());
    }

    #[tokio::test]
    async fn guild_lookup_failure_keeps_channel_name() {
        let r = resolver(&[(
            "/channels/1",
            200,
            r#"{"name": "general", "guild_id": "9"}"#,
        )]);
        let info = r.resolve("1").await;
        assert_eq!(info.channel_name, "general");
        assert_eq!(info.guild_name, UNKNOWN);
        assert_eq!(info.guild_id.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn dm_channel_uses_recipients() {
        let r = resolver(&[(
            "/channels/5",
            200,
            r#"{"type": 1, "recipients": [{"username": "alice"}, {"username": "bob"}]}"#,
        )]);
        let info = r.resolve("5").await;
        assert_eq!(info.channel_name, "alice, bob");
        assert_eq!(info.guild_name, DM_GUILD);
        assert!(info.guild_id.is_none());
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_unknown() {
        let r = resolver(&[]);
        assert_eq!(r.resolve("1").await, ChannelInfo::unknown());
    }
}
