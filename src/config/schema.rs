use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use super::channels::parse_channel_list;

/// 全局配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// 聊天平台连接与抓取配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// 认证 token，作为 Authorization 头发送
    #[serde(default)]
    pub token: String,
    /// Authorization 前缀："Bot" / "Bearer"；None 时直接发送原始 token
    #[serde(default)]
    pub auth_style: Option<String>,
    #[serde(default = "default_discord_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 频道 URL 或纯 ID
    #[serde(default)]
    pub channels: Vec<String>,
    /// 每个频道最多抓取的消息数，0 = 抓到历史尽头
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// 同一页连续 429 的最大重试次数
    #[serde(default = "default_max_throttle_retries")]
    pub max_throttle_retries: u32,
    /// 是否解析频道名/服务器名（多两次请求）
    #[serde(default = "default_resolve_metadata")]
    pub resolve_metadata: bool,
}

fn default_discord_base_url() -> String {
    "https://discord.com/api/v9".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_messages() -> usize {
    100
}

fn default_max_throttle_retries() -> u32 {
    10
}

fn default_resolve_metadata() -> bool {
    true
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            auth_style: None,
            base_url: default_discord_base_url(),
            timeout_secs: default_timeout_secs(),
            channels: vec![],
            max_messages: default_max_messages(),
            max_throttle_retries: default_max_throttle_retries(),
            resolve_metadata: default_resolve_metadata(),
        }
    }
}

impl DiscordConfig {
    /// 0 视为不设上限
    pub fn message_cap(&self) -> Option<usize> {
        (self.max_messages > 0).then_some(self.max_messages)
    }
}

/// 关键词过滤配置（无内置默认词表）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Sink 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// "sheets" | "sqlite" | "memory"
    #[serde(default = "default_sink_backend")]
    pub backend: String,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub sqlite: SqliteSinkConfig,
}

fn default_sink_backend() -> String {
    "sheets".to_string()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            backend: default_sink_backend(),
            sheets: SheetsConfig::default(),
            sqlite: SqliteSinkConfig::default(),
        }
    }
}

/// Google Sheets 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// OAuth access token（凭据换取由外部完成）
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_sheets_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_sheets_base_url() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: default_sheet_name(),
            access_token: String::new(),
            base_url: default_sheets_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// SQLite Sink 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqliteSinkConfig {
    /// 数据库文件路径；None 时使用 ~/.chatsift/data/sink.db
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// 默认配置 TOML 模板
pub(crate) const DEFAULT_CONFIG_TOML: &str = r#"[discord]
token = ""            # 也可通过 DISCORD_TOKEN 环境变量提供
# auth_style = "Bot"  # Bot token 时启用；用户 token 留空
base_url = "https://discord.com/api/v9"
timeout_secs = 30
channels = []         # 频道 URL 或 ID，例如 "https://discord.com/channels/<guild>/<channel>"
max_messages = 100    # 0 = 抓到历史尽头
resolve_metadata = true

[filter]
# 关键词不区分大小写，按子串匹配
keywords = []
# keywords = ["due tonight", "deadline", "exam tomorrow", "stuck on"]

[sink]
backend = "sheets"    # sheets | sqlite | memory（memory = 试运行，不落盘）

[sink.sheets]
spreadsheet_id = ""
sheet_name = "Sheet1"
access_token = ""
timeout_secs = 30

# [sink.sqlite]
# path = "/path/to/sink.db"
"#;

impl Config {
    /// 返回配置文件路径: `~/.chatsift/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        Ok(home_dir()?.join("config.toml"))
    }

    /// 返回数据目录: `~/.chatsift/data/`
    pub fn data_dir() -> Result<PathBuf> {
        Ok(home_dir()?.join("data"))
    }

    /// 返回日志目录: `~/.chatsift/logs/`
    pub fn log_dir() -> Result<PathBuf> {
        Ok(home_dir()?.join("logs"))
    }

    /// 加载配置，如果配置文件不存在则创建默认配置
    pub fn load_or_init() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::write_default_if_missing(&config_path)?;
        Self::load_from_path(&config_path)
    }

    /// 配置文件不存在时写入模板；返回是否新建
    pub fn write_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).wrap_err("创建配置目录失败")?;
        }
        std::fs::write(path, DEFAULT_CONFIG_TOML).wrap_err("写入默认配置失败")?;
        Ok(true)
    }

    /// 从指定路径加载配置（figment 多层合并 + 旧版环境变量）
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("CHATSIFT_").split("__"))
            .extract()
            .wrap_err("解析配置文件失败")?;

        config.apply_legacy_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// 兼容旧版环境变量（DISCORD_TOKEN、逗号分隔的 CHANNEL_URLS 等），空值忽略
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("DISCORD_TOKEN") {
            self.discord.token = token.trim().to_string();
        }
        if let Some(urls) = get("CHANNEL_URLS") {
            self.discord.channels = urls
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(max) = get("MAX_MESSAGES") {
            match max.trim().parse::<usize>() {
                Ok(n) => self.discord.max_messages = n,
                Err(_) => tracing::warn!("MAX_MESSAGES 不是合法整数，忽略: {}", max),
            }
        }
        if let Some(sheet_id) = get("GOOGLE_SHEET_ID") {
            self.sink.sheets.spreadsheet_id = sheet_id.trim().to_string();
        }
        if let Some(token) = get("GOOGLE_SHEETS_ACCESS_TOKEN") {
            self.sink.sheets.access_token = token.trim().to_string();
        }
    }

    /// 解析后的频道 ID 列表（保持配置顺序）
    pub fn channel_ids(&self) -> Vec<String> {
        parse_channel_list(&self.discord.channels)
    }
}

/// 获取根目录: ~/.chatsift/
fn home_dir() -> Result<PathBuf> {
    let base_dirs = directories::BaseDirs::new()
        .ok_or_else(|| color_eyre::eyre::eyre!("无法获取 home 目录"))?;
    Ok(base_dirs.home_dir().join(".chatsift"))
}
