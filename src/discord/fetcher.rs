use std::sync::Arc;

use color_eyre::eyre::Result;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

use super::rate_limit::{backoff_duration, RateLimitState};
use super::transport::{ApiRequest, ApiResponse, Transport};
use super::types::{Message, RawMessage};
use crate::error::HarvestError;

/// 单页最多拉取的消息数（Discord 上限）
pub const PAGE_LIMIT: usize = 100;

/// 抓取终止原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// 遇到空页，历史已抓完
    Exhausted,
    /// 达到 max_messages 上限
    CapReached,
    /// 非 200/429 的状态码
    HttpStatus(u16),
    /// 传输层失败（连接/超时）
    Transport(String),
    /// 200 但 body 不是消息数组
    Malformed(String),
    /// 同一页连续 429 超过上限
    Throttled,
}

impl StopReason {
    /// 是否为正常结束（非降级）
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Exhausted | Self::CapReached)
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted => write!(f, "exhausted"),
            Self::CapReached => write!(f, "cap reached"),
            Self::HttpStatus(code) => write!(f, "http {}", code),
            Self::Transport(e) => write!(f, "transport: {}", e),
            Self::Malformed(e) => write!(f, "malformed page: {}", e),
            Self::Throttled => write!(f, "throttled"),
        }
    }
}

/// 一次抓取的结果：消息（新 → 旧）、更新后的限流状态、终止原因
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub messages: Vec<Message>,
    pub limits: RateLimitState,
    pub stop: StopReason,
}

/// 单次请求的处理结果
enum PageResult {
    Page(Vec<Message>),
    Retry(Duration),
    Stop(StopReason),
}

/// 向后翻页的消息抓取器
pub struct PaginatedFetcher {
    transport: Arc<dyn Transport>,
    max_throttle_retries: u32,
}

impl PaginatedFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            max_throttle_retries: 10,
        }
    }

    pub fn with_max_throttle_retries(mut self, retries: u32) -> Self {
        self.max_throttle_retries = retries;
        self
    }

    /// 抓取频道历史直到空页或达到上限
    ///
    /// 只有空频道 ID 会返回 `Err`；其余失败都以部分结果 + `StopReason` 返回。
    /// `max_messages` 为 `None` 或 `Some(0)` 时不设上限。
    pub async fn fetch(
        &self,
        channel_id: &str,
        max_messages: Option<usize>,
        mut limits: RateLimitState,
    ) -> Result<FetchOutcome> {
        let channel_id = channel_id.trim();
        if channel_id.is_empty() {
            return Err(HarvestError::EmptyChannelId.into());
        }
        let cap = max_messages.filter(|n| *n > 0);

        let path = format!("/channels/{}/messages", channel_id);
        let mut messages: Vec<Message> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut throttled_in_a_row = 0u32;

        let stop = loop {
            let wait = limits.should_wait(Instant::now());
            if !wait.is_zero() {
                info!("速率预算耗尽，等待 {:.2} 秒", wait.as_secs_f64());
                sleep(wait).await;
            }

            let mut request = ApiRequest::new(path.as_str()).with_query("limit", PAGE_LIMIT.to_string());
            if let Some(before) = &cursor {
                request = request.with_query("before", before.as_str());
            }

            let response = match self.transport.get(&request).await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("频道 {} 请求失败: {:#}", channel_id, e);
                    break StopReason::Transport(format!("{:#}", e));
                }
            };

            limits = limits.observe(
                response.rate_limit_remaining,
                response.rate_limit_reset_after,
                Instant::now(),
            );

            match Self::classify(channel_id, &response) {
                PageResult::Retry(delay) => {
                    throttled_in_a_row += 1;
                    if throttled_in_a_row > self.max_throttle_retries {
                        warn!(
                            "频道 {} 连续 {} 次被限流，放弃本频道",
                            channel_id, throttled_in_a_row
                        );
                        break StopReason::Throttled;
                    }
                    info!("被限流，{:.2} 秒后重试", delay.as_secs_f64());
                    sleep(delay).await;
                }
                PageResult::Stop(reason) => break reason,
                PageResult::Page(page) => {
                    throttled_in_a_row = 0;
                    let Some(oldest) = page.last() else {
                        break StopReason::Exhausted;
                    };
                    cursor = Some(oldest.id.clone());
                    debug!("频道 {} 抓取到 {} 条消息", channel_id, page.len());
                    messages.extend(page);

                    if let Some(cap) = cap {
                        if messages.len() >= cap {
                            messages.truncate(cap);
                            break StopReason::CapReached;
                        }
                    }
                }
            }
        };

        info!(
            "频道 {} 抓取结束: {} 条消息（{}）",
            channel_id,
            messages.len(),
            stop
        );
        Ok(FetchOutcome {
            messages,
            limits,
            stop,
        })
    }

    fn classify(channel_id: &str, response: &ApiResponse) -> PageResult {
        match response.status {
            200 => match serde_json::from_str::<Vec<RawMessage>>(&response.body) {
                Ok(raw) => PageResult::Page(
                    raw.into_iter()
                        .map(|m| m.into_message(channel_id))
                        .collect(),
                ),
                Err(e) => {
                    warn!("频道 {} 响应无法解析: {}", channel_id, e);
                    PageResult::Stop(StopReason::Malformed(e.to_string()))
                }
            },
            429 => PageResult::Retry(
                backoff_duration(response.retry_after_secs()).unwrap_or(Duration::ZERO),
            ),
            status => {
                warn!("频道 {} 抓取失败，状态码 {}", channel_id, status);
                PageResult::Stop(StopReason::HttpStatus(status))
            }
        }
    }
}
