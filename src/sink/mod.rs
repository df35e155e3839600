pub mod memory;
pub mod row;
pub mod sheets;
pub mod sqlite;
pub mod traits;

use std::sync::Arc;

use color_eyre::eyre::Result;

pub use memory::MemorySink;
pub use row::{build_row, header_row, HEADER};
pub use sheets::SheetsSink;
pub use sqlite::SqliteSink;
pub use traits::Sink;

use crate::config::{Config, SinkConfig};
use crate::error::HarvestError;

/// 根据配置创建 Sink 实例；`backend_override` 来自命令行 --sink
pub fn create_sink(config: &SinkConfig, backend_override: Option<&str>) -> Result<Arc<dyn Sink>> {
    let backend = backend_override
        .unwrap_or(&config.backend)
        .trim()
        .to_lowercase();
    match backend.as_str() {
        "sheets" => Ok(Arc::new(SheetsSink::new(&config.sheets)?)),
        "sqlite" => {
            let path = match &config.sqlite.path {
                Some(p) => p.clone(),
                None => Config::data_dir()?.join("sink.db"),
            };
            Ok(Arc::new(SqliteSink::open(&path)?))
        }
        "memory" => Ok(Arc::new(MemorySink::new())),
        other => Err(HarvestError::UnknownSink(other.to_string()).into()),
    }
}
