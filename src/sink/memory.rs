use async_trait::async_trait;
use color_eyre::eyre::Result;
use tokio::sync::Mutex;

use super::traits::Sink;

/// 内存 Sink：试运行（--sink memory）与测试使用，进程退出即丢弃
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Mutex<Vec<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置已有行（模拟已有数据的表格）
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub async fn rows(&self) -> Vec<Vec<String>> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl Sink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn row_count(&self) -> Result<usize> {
        Ok(self.rows.lock().await.len())
    }

    async fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .any(|r| r.first().map(String::as_str) == Some(key)))
    }

    async fn append_row(&self, row: &[String]) -> Result<()> {
        self.rows.lock().await.push(row.to_vec());
        Ok(())
    }
}
