use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::discord::{ChannelInfo, Message};
use crate::sink::{build_row, header_row, Sink};

/// 单条消息的同步结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// 键不存在，已追加
    Written,
    /// 键已存在，未写入
    Skipped,
    /// 写入失败（已记录日志，不重试）
    Failed,
}

/// 一批消息的同步统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SyncReport {
    fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Written => self.written += 1,
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Failed => self.failed += 1,
        }
    }
}

/// 去重同步：只追加 Sink 中不存在的消息 ID
///
/// 对不支持条件写入的 Sink，检查与追加是两次独立调用（check-then-act）；
/// 假定同一时间只有一个写入方。
pub struct DedupSyncWriter {
    sink: Arc<dyn Sink>,
    header_checked: AtomicBool,
}

impl DedupSyncWriter {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            header_checked: AtomicBool::new(false),
        }
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// 空存储时写入表头行；每个 writer 只成功检查一次。返回本次是否写入了表头
    pub async fn ensure_header(&self) -> bool {
        if self.header_checked.load(Ordering::Acquire) || !self.sink.wants_header_row() {
            return false;
        }
        let count = match self.sink.row_count().await {
            Ok(n) => n,
            Err(e) => {
                warn!("读取 {} 行数失败，暂不写表头: {:#}", self.sink.name(), e);
                return false;
            }
        };
        if count > 0 {
            self.header_checked.store(true, Ordering::Release);
            return false;
        }
        match self.sink.append_row(&header_row()).await {
            Ok(()) => {
                self.header_checked.store(true, Ordering::Release);
                info!("{} 为空，已写入表头", self.sink.name());
                true
            }
            Err(e) => {
                warn!("写入表头失败: {:#}", e);
                false
            }
        }
    }

    /// 同步一批消息，返回新写入的行数
    pub async fn sync(&self, messages: &[Message], info: Option<&ChannelInfo>) -> usize {
        self.sync_report(messages, info).await.written
    }

    /// 同步一批消息并返回明细统计
    pub async fn sync_report(&self, messages: &[Message], info: Option<&ChannelInfo>) -> SyncReport {
        self.ensure_header().await;

        let mut report = SyncReport::default();
        for message in messages {
            report.record(self.sync_one(message, info).await);
        }
        debug!(
            "同步完成: 写入 {}，跳过 {}，失败 {}",
            report.written, report.skipped, report.failed
        );
        report
    }

    /// Candidate → Checked → Written | Skipped
    pub async fn sync_one(&self, message: &Message, info: Option<&ChannelInfo>) -> RowOutcome {
        if message.id.trim().is_empty() {
            warn!("消息缺少 ID，跳过写入");
            return RowOutcome::Failed;
        }
        let row = build_row(message, info);

        if self.sink.supports_conditional_insert() {
            return match self.sink.insert_if_absent(&row).await {
                Ok(true) => RowOutcome::Written,
                Ok(false) => RowOutcome::Skipped,
                Err(e) => {
                    warn!("写入消息 {} 失败: {:#}", message.id, e);
                    RowOutcome::Failed
                }
            };
        }

        let exists = match self.sink.contains_key(&message.id).await {
            Ok(exists) => exists,
            Err(e) => {
                // 检查失败按"不存在"处理（可能产生重复行）
                warn!("检查消息 {} 是否存在失败，按不存在处理: {:#}", message.id, e);
                false
            }
        };
        if exists {
            debug!("消息 {} 已存在，跳过", message.id);
            return RowOutcome::Skipped;
        }

        match self.sink.append_row(&row).await {
            Ok(()) => {
                debug!("已写入消息 {}", message.id);
                RowOutcome::Written
            }
            Err(e) => {
                warn!("写入消息 {} 失败: {:#}", message.id, e);
                RowOutcome::Failed
            }
        }
    }
}
