use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::prelude::*;

use chatsift::config::Config;

#[derive(Parser)]
#[command(name = "chatsift", about = "按关键词抓取频道消息并去重同步到表格", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 抓取、过滤并同步所有配置的频道
    Run {
        /// 频道 URL 或 ID（可多次指定，覆盖配置文件中的 channels）
        #[arg(short, long = "channel")]
        channels: Vec<String>,

        /// 每个频道最多抓取的消息数（0 = 不限）
        #[arg(short, long)]
        max_messages: Option<usize>,

        /// Sink 后端：sheets / sqlite / memory（memory 为试运行）
        #[arg(long)]
        sink: Option<String>,

        /// 将命中的消息与统计导出为 JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 指定配置文件（默认 ~/.chatsift/config.toml）
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// 初始化配置文件
    Init,
    /// 显示当前配置
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // .env 不存在属正常情况
    let _ = dotenvy::dotenv();
    init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            channels,
            max_messages,
            sink,
            output,
            config,
        } => run(channels, max_messages, sink, output, config).await?,
        Commands::Init => run_init()?,
        Commands::Config => run_config()?,
    }

    Ok(())
}

async fn run(
    channels: Vec<String>,
    max_messages: Option<usize>,
    sink_override: Option<String>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => Config::load_from_path(&path),
        None => Config::load_or_init(),
    }
    .wrap_err("加载配置失败")?;

    if !channels.is_empty() {
        config.discord.channels = channels;
    }
    if let Some(n) = max_messages {
        config.discord.max_messages = n;
    }

    let channel_ids = config.channel_ids();
    tracing::info!(
        "频道: {:?}，每频道上限: {:?}，关键词: {:?}",
        channel_ids,
        config.discord.message_cap(),
        config.filter.keywords
    );

    // 致命配置错误在任何抓取之前报出
    let sink = chatsift::sink::create_sink(&config.sink, sink_override.as_deref())
        .wrap_err("初始化 Sink 失败")?;
    let pipeline = chatsift::pipeline::Pipeline::from_config(&config, sink.clone())?;

    let summary = pipeline.run(&channel_ids).await?;

    println!("Sink: {}", sink.name());
    for ch in &summary.channels {
        println!(
            "  #{} ({}) @ {}: 抓取 {}，命中 {}，新写入 {}，跳过 {}，失败 {} [{}]",
            ch.channel_name,
            ch.channel_id,
            ch.guild_name,
            ch.fetched,
            ch.matched,
            ch.written,
            ch.skipped,
            ch.failed,
            ch.stop
        );
    }
    println!(
        "合计: 抓取 {} 条，命中 {} 条，新写入 {} 行",
        summary.fetched(),
        summary.matched(),
        summary.written()
    );

    if let Some(path) = output {
        chatsift::report::RunReport::new(&summary, chrono::Utc::now()).write_to(&path)?;
        println!("结果已导出到 {}", path.display());
    }

    Ok(())
}

fn run_init() -> Result<()> {
    let config_path = Config::config_path()?;

    if Config::write_default_if_missing(&config_path)? {
        println!("已创建配置文件: {}", config_path.display());
        println!("请编辑该文件填写 token、频道和关键词。");
    } else {
        println!("配置文件已存在: {}", config_path.display());
        println!("如需重新初始化，请先删除该文件。");
    }

    Ok(())
}

fn run_config() -> Result<()> {
    let config_path = Config::config_path()?;

    if !config_path.exists() {
        println!("配置文件不存在。运行 `chatsift init` 创建。");
        return Ok(());
    }

    let content = std::fs::read_to_string(&config_path).wrap_err("读取配置文件失败")?;
    println!("配置文件: {}\n", config_path.display());
    println!("{}", content);

    Ok(())
}

/// 初始化 tracing: stderr 输出 info+，日志文件输出 debug+
fn init_tracing() -> Result<()> {
    let log_dir = Config::log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .wrap_err_with(|| format!("创建日志目录失败: {}", log_dir.display()))?;

    // 文件日志: 按天滚动，debug 级别
    let file_appender = tracing_appender::rolling::daily(&log_dir, "chatsift.log");
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chatsift=debug")),
        );

    // stderr: 批处理进度
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(tracing_subscriber::EnvFilter::new("chatsift=info,warn"));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}
