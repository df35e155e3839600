use async_trait::async_trait;
use color_eyre::eyre::Result;

/// 429 响应既没有 Retry-After 头也没有 body 字段时的等待秒数
pub const DEFAULT_RETRY_AFTER_SECS: f64 = 5.0;

/// 一次 GET 请求（路径 + 查询参数）
///
/// 实现 `PartialEq`：限流重试时要求请求与原请求完全一致。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: vec![],
        }
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// 查询参数取值（测试与日志用）
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// 传输层响应：状态码、速率限制相关头和原始 body
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    /// X-RateLimit-Remaining
    pub rate_limit_remaining: Option<i64>,
    /// X-RateLimit-Reset-After（秒）
    pub rate_limit_reset_after: Option<f64>,
    /// Retry-After（秒）
    pub retry_after: Option<f64>,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_throttled(&self) -> bool {
        self.status == 429
    }

    /// 限流等待秒数：优先 Retry-After 头，其次 JSON body 的 retry_after，最后默认 5 秒
    pub fn retry_after_secs(&self) -> f64 {
        self.retry_after
            .or_else(|| {
                serde_json::from_str::<serde_json::Value>(&self.body)
                    .ok()
                    .and_then(|v| v.get("retry_after").and_then(|r| r.as_f64()))
            })
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
    }
}

/// 聊天平台 HTTP 抽象
///
/// `Err` 只表示传输层失败（连接/超时/读 body）；非 2xx 状态码以 `Ok` 返回，
/// 由调用方按状态码决定后续行为。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse>;
}
