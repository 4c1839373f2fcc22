//! 进度事件
//!
//! 一次运行的进度和中间结果只通过调用方传入的 `EventSink` 发出，
//! 持有接收端的人才能看到。发送不阻塞，接收端关闭后静默丢弃。

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::trace;

use crate::models::Document;
use crate::workflow::run_ctx::RunStage;

/// 一条进度
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub stage: RunStage,
    /// 给人看的状态描述
    pub message: String,
    /// 0-100，同一次运行内不回退
    pub percent: u8,
    /// 给人看的剩余时间
    pub time_estimate: String,
}

/// 运行事件
#[derive(Debug, Clone)]
pub enum RunEvent {
    Progress(ProgressUpdate),
    /// 当前文档快照（含累计的来源 URL）
    Partial(Box<Document>),
    Failed { message: String },
}

/// 事件出口
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<RunEvent>>,
}

impl EventSink {
    /// 创建出口和对应的接收端
    pub fn channel() -> (Self, UnboundedReceiver<RunEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// 丢弃所有事件
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn progress(&self, update: ProgressUpdate) {
        self.send(RunEvent::Progress(update));
    }

    pub fn partial(&self, document: &Document) {
        self.send(RunEvent::Partial(Box::new(document.clone())));
    }

    pub fn failed(&self, message: impl Into<String>) {
        self.send(RunEvent::Failed {
            message: message.into(),
        });
    }

    fn send(&self, event: RunEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                trace!("事件接收端已关闭");
            }
        }
    }
}
