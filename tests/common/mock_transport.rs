// 每个集成测试文件只使用 MockTransport 的部分方法，dead_code 为预期行为
#![allow(dead_code)]

//! 测试专用 MockTransport
//!
//! 实现 Transport trait，用内存中的频道历史模拟 Discord 分页接口：
//! 按 `before` 游标返回更早的消息（新 → 旧），历史耗尽时返回空数组。
//!
//! - `inject(n, resp)`：第 n 次（从 0 计）消息列表请求改为返回指定响应
//! - 所有请求按顺序记录，便于断言游标与重试

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};

use chatsift::discord::{ApiRequest, ApiResponse, Transport};

pub struct MockTransport {
    /// channel_id -> [(id, content)]，新 → 旧
    histories: HashMap<String, Vec<(u64, String)>>,
    channels: HashMap<String, serde_json::Value>,
    guilds: HashMap<String, serde_json::Value>,
    injected: Mutex<HashMap<usize, Result<ApiResponse>>>,
    list_calls: Mutex<usize>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            histories: HashMap::new(),
            channels: HashMap::new(),
            guilds: HashMap::new(),
            injected: Mutex::new(HashMap::new()),
            list_calls: Mutex::new(0),
            requests: Mutex::new(vec![]),
        }
    }

    /// 登记频道历史；按 ID 排序为新 → 旧
    pub fn with_history(mut self, channel_id: &str, messages: &[(u64, &str)]) -> Self {
        let mut history: Vec<(u64, String)> = messages
            .iter()
            .map(|(id, content)| (*id, content.to_string()))
            .collect();
        history.sort_by(|a, b| b.0.cmp(&a.0));
        self.histories.insert(channel_id.to_string(), history);
        self
    }

    /// 登记 n 条内容相同的消息，ID 为 start..start+n
    pub fn with_generated_history(self, channel_id: &str, start: u64, n: u64, content: &str) -> Self {
        let messages: Vec<(u64, &str)> = (start..start + n).map(|id| (id, content)).collect();
        self.with_history(channel_id, &messages)
    }

    pub fn with_channel(mut self, channel_id: &str, name: &str, guild: Option<(&str, &str)>) -> Self {
        let mut value = serde_json::json!({"id": channel_id, "name": name});
        if let Some((guild_id, guild_name)) = guild {
            value["guild_id"] = serde_json::json!(guild_id);
            self.guilds.insert(
                guild_id.to_string(),
                serde_json::json!({"id": guild_id, "name": guild_name}),
            );
        }
        self.channels.insert(channel_id.to_string(), value);
        self
    }

    /// 第 n 次消息列表请求返回指定响应（不推进游标）
    pub fn inject(self, call_index: usize, response: Result<ApiResponse>) -> Self {
        self.injected.lock().unwrap().insert(call_index, response);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// 只包含消息列表请求
    pub fn list_requests(&self) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with("/messages"))
            .collect()
    }

    pub fn throttled(retry_after: Option<f64>) -> Result<ApiResponse> {
        Ok(ApiResponse {
            status: 429,
            retry_after,
            body: r#"{"message": "You are being rate limited."}"#.to_string(),
            ..Default::default()
        })
    }

    pub fn status(code: u16) -> Result<ApiResponse> {
        Ok(ApiResponse {
            status: code,
            ..Default::default()
        })
    }

    fn ok_json(value: &serde_json::Value) -> ApiResponse {
        ApiResponse {
            status: 200,
            rate_limit_remaining: Some(5),
            rate_limit_reset_after: Some(1.0),
            body: value.to_string(),
            ..Default::default()
        }
    }

    fn list_messages(&self, channel_id: &str, request: &ApiRequest) -> ApiResponse {
        let limit: usize = request
            .query_value("limit")
            .and_then(|l| l.parse().ok())
            .unwrap_or(50);
        let before: Option<u64> = request.query_value("before").and_then(|b| b.parse().ok());

        let page: Vec<serde_json::Value> = self
            .histories
            .get(channel_id)
            .map(|h| h.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter(|(id, _)| before.map_or(true, |b| *id < b))
            .take(limit)
            .map(|(id, content)| {
                serde_json::json!({
                    "id": id.to_string(),
                    "timestamp": format!("2024-05-01T10:00:{:02}+00:00", id % 60),
                    "content": content,
                    "channel_id": channel_id,
                    "author": {"id": "900", "username": format!("user{}", id % 3)},
                })
            })
            .collect();
        Self::ok_json(&serde_json::Value::Array(page))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let segments: Vec<&str> = request.path.trim_start_matches('/').split('/').collect();
        match segments.as_slice() {
            ["channels", channel_id, "messages"] => {
                let call = {
                    let mut calls = self.list_calls.lock().unwrap();
                    let current = *calls;
                    *calls += 1;
                    current
                };
                if let Some(injected) = self.injected.lock().unwrap().remove(&call) {
                    return injected;
                }
                Ok(self.list_messages(channel_id, request))
            }
            ["channels", channel_id] => Ok(match self.channels.get(*channel_id) {
                Some(v) => Self::ok_json(v),
                None => ApiResponse {
                    status: 404,
                    body: r#"{"message": "Unknown Channel"}"#.to_string(),
                    ..Default::default()
                },
            }),
            ["guilds", guild_id] => Ok(match self.guilds.get(*guild_id) {
                Some(v) => Self::ok_json(v),
                None => ApiResponse {
                    status: 404,
                    ..Default::default()
                },
            }),
            _ => Err(eyre!("MockTransport 未知路径: {}", request.path)),
        }
    }
}
