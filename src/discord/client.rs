use std::time::Duration;

use async_trait::async_trait;
use color_eyre::eyre::{Context, Result};
use reqwest::header::HeaderMap;

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::config::DiscordConfig;
use crate::error::HarvestError;

/// 基于 reqwest 的 Discord REST 传输层
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    authorization: String,
}

impl HttpTransport {
    /// 创建传输层；token 为空时直接拒绝（不发出任何请求）
    pub fn new(config: &DiscordConfig) -> Result<Self> {
        let authorization = authorization_header(&config.token, config.auth_style.as_deref())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("chatsift/", env!("CARGO_PKG_VERSION")))
            .build()
            .wrap_err("创建 HTTP 客户端失败")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization,
        })
    }

    /// 构造完整请求 URL（查询参数经 url crate 编码）
    fn endpoint(&self, request: &ApiRequest) -> Result<url::Url> {
        let mut url = url::Url::parse(&format!("{}{}", self.base_url, request.path))
            .wrap_err_with(|| format!("非法请求地址: {}{}", self.base_url, request.path))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &request.query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

/// 拼装 Authorization 头：配置了前缀则为 "<style> <token>"，否则为原始 token
pub fn authorization_header(token: &str, auth_style: Option<&str>) -> Result<String> {
    let token = token.trim();
    if token.is_empty() {
        return Err(HarvestError::MissingToken.into());
    }
    Ok(match auth_style.map(str::trim).filter(|s| !s.is_empty()) {
        Some(style) => format!("{} {}", style, token),
        None => token.to_string(),
    })
}

fn header_f64(headers: &HeaderMap, name: &str) -> Option<f64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.endpoint(request)?;
        tracing::trace!("GET {}", url);

        let resp = self
            .client
            .get(url)
            .header("Authorization", &self.authorization)
            .send()
            .await
            .wrap_err("发送请求失败")?;

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.text().await.wrap_err("读取响应失败")?;

        Ok(ApiResponse {
            status,
            rate_limit_remaining: header_i64(&headers, "x-ratelimit-remaining"),
            rate_limit_reset_after: header_f64(&headers, "x-ratelimit-reset-after"),
            retry_after: header_f64(&headers, "retry-after"),
            body,
        })
    }
}
