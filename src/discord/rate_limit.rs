use tokio::time::{Duration, Instant};

/// 响应头缺失时使用的保守预算（也是初始值，保证首个请求不等待）
pub const FALLBACK_REMAINING: i64 = 5;

/// 服务端给出的等待时长上限（retry-after / reset-after 超出时截断）
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// 秒数 → Duration，截断到 `MAX_BACKOFF`；负数、NaN 返回 None
pub fn backoff_duration(secs: f64) -> Option<Duration> {
    if secs.is_nan() || secs < 0.0 {
        return None;
    }
    // 超出 Duration 表示范围的值同样按上限处理
    Some(
        Duration::try_from_secs_f64(secs)
            .map(|d| d.min(MAX_BACKOFF))
            .unwrap_or(MAX_BACKOFF),
    )
}

/// 速率限制状态
///
/// 显式值语义：调用方在每次响应后用 `observe` 的返回值替换旧状态，
/// 跨频道时由 pipeline 继续传递（配额按 token 计算）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    pub remaining: i64,
    pub reset_at: Instant,
}

impl RateLimitState {
    pub fn new(now: Instant) -> Self {
        Self {
            remaining: FALLBACK_REMAINING,
            reset_at: now,
        }
    }

    /// 发请求前需要等待的时长；预算未耗尽时为 0
    pub fn should_wait(&self, now: Instant) -> Duration {
        if self.remaining > 0 {
            return Duration::ZERO;
        }
        self.reset_at.saturating_duration_since(now)
    }

    /// 根据响应头更新状态（任何状态码的响应都要调用）
    pub fn observe(self, remaining: Option<i64>, reset_after_secs: Option<f64>, now: Instant) -> Self {
        let reset_at = reset_after_secs
            .and_then(backoff_duration)
            .and_then(|wait| now.checked_add(wait))
            .unwrap_or(self.reset_at);
        Self {
            remaining: remaining.unwrap_or(FALLBACK_REMAINING).max(0),
            reset_at,
        }
    }
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}
