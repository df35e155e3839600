use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::eyre::{ensure, Context, Result};
use rusqlite::{params, params_from_iter, Connection};
use tokio::sync::Mutex;

use super::row::HEADER;
use super::traits::Sink;

/// 与 HEADER 一一对应的列名
const COLUMNS: [&str; 12] = [
    "message_id",
    "timestamp",
    "author",
    "content",
    "keywords",
    "channel_id",
    "server_id",
    "channel_name",
    "server_name",
    "response_status",
    "response_sent",
    "response_content",
];

/// SQLite Sink：message_id 为主键，支持原子条件写入
pub struct SqliteSink {
    db: Arc<Mutex<Connection>>,
}

impl SqliteSink {
    /// 从文件路径创建（生产用），父目录不存在时自动创建
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).wrap_err("创建数据目录失败")?;
        }
        let db = Connection::open(path)
            .wrap_err_with(|| format!("打开 SQLite 失败: {}", path.display()))?;
        Self::finish_init(db)
    }

    /// 从内存创建（测试用）
    pub fn in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().wrap_err("打开内存 SQLite 失败")?;
        Self::finish_init(db)
    }

    fn finish_init(db: Connection) -> Result<Self> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS matched_messages (
                message_id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                author TEXT NOT NULL,
                content TEXT NOT NULL,
                keywords TEXT NOT NULL,
                channel_id TEXT NOT NULL,
                server_id TEXT NOT NULL,
                channel_name TEXT NOT NULL,
                server_name TEXT NOT NULL,
                response_status TEXT NOT NULL,
                response_sent TEXT NOT NULL,
                response_content TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_matched_channel ON matched_messages(channel_id);",
        )
        .wrap_err("创建数据库表失败")?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    fn insert_sql(on_conflict: &str) -> String {
        let placeholders: Vec<String> = (1..=COLUMNS.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO matched_messages ({}) VALUES ({}){}",
            COLUMNS.join(", "),
            placeholders.join(", "),
            on_conflict
        )
    }

    async fn insert(&self, row: &[String], on_conflict: &str) -> Result<usize> {
        ensure!(
            row.len() == HEADER.len(),
            "行列数 {} 与表头列数 {} 不一致",
            row.len(),
            HEADER.len()
        );
        let db = self.db.lock().await;
        let changed = db
            .execute(&Self::insert_sql(on_conflict), params_from_iter(row.iter()))
            .wrap_err("写入 SQLite 失败")?;
        Ok(changed)
    }
}

#[async_trait]
impl Sink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn row_count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let count: i64 = db
            .query_row("SELECT COUNT(*) FROM matched_messages", [], |row| row.get(0))
            .wrap_err("统计行数失败")?;
        Ok(count as usize)
    }

    async fn contains_key(&self, key: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let exists: bool = db
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM matched_messages WHERE message_id = ?1)",
                params![key],
                |row| row.get(0),
            )
            .wrap_err("查询键失败")?;
        Ok(exists)
    }

    async fn append_row(&self, row: &[String]) -> Result<()> {
        self.insert(row, "").await?;
        Ok(())
    }

    /// 列名即表头，不写表头行
    fn wants_header_row(&self) -> bool {
        false
    }

    fn supports_conditional_insert(&self) -> bool {
        true
    }

    async fn insert_if_absent(&self, row: &[String]) -> Result<bool> {
        let changed = self
            .insert(row, " ON CONFLICT(message_id) DO NOTHING")
            .await?;
        Ok(changed == 1)
    }
}
