use async_trait::async_trait;
use color_eyre::eyre::{bail, Result};

/// 表格存储抽象：第一列是去重键
#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    /// 已有行数（含表头行）
    async fn row_count(&self) -> Result<usize>;

    /// 第一列中是否已存在该键
    async fn contains_key(&self, key: &str) -> Result<bool>;

    /// 追加一行
    async fn append_row(&self, row: &[String]) -> Result<()>;

    /// 空存储首次写入前是否需要追加表头行
    fn wants_header_row(&self) -> bool {
        true
    }

    /// 是否支持单次调用的原子条件写入
    fn supports_conditional_insert(&self) -> bool {
        false
    }

    /// 键不存在时写入并返回 true；已存在返回 false
    async fn insert_if_absent(&self, _row: &[String]) -> Result<bool> {
        bail!("{} 不支持条件写入", self.name())
    }
}
