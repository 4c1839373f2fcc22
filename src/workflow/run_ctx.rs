//! 运行上下文
//!
//! 封装"我正在生成哪份文档、走到了哪一步"这一信息。
//! 每次运行独占一个，不在运行之间共享。

use std::fmt::{self, Display};

use tokio::time::Instant;

use crate::models::{Document, DocumentParameters, DocumentType, RollingContext};
use crate::profile::{format_eta, Profile};
use crate::workflow::progress::ProgressUpdate;

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Planning,
    FrontMatter,
    /// 第 `index` 个小节（从 1 开始），共 `total` 个
    Section { index: usize, total: usize },
    BackMatter,
    Assembling,
    Done,
    Failed,
}

impl Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStage::Planning => write!(f, "规划大纲"),
            RunStage::FrontMatter => write!(f, "引言与结论"),
            RunStage::Section { index, total } => write!(f, "小节 {}/{}", index, total),
            RunStage::BackMatter => write!(f, "附录"),
            RunStage::Assembling => write!(f, "组装"),
            RunStage::Done => write!(f, "完成"),
            RunStage::Failed => write!(f, "失败"),
        }
    }
}

/// 一次运行的上下文
#[derive(Debug)]
pub struct RunCtx {
    /// 运行序号（仅用于日志显示）
    pub run_index: usize,
    pub profile: Profile,
    pub document_type: DocumentType,
    pub document: Document,
    pub context: RollingContext,
    stage: Option<RunStage>,
    last_percent: u8,
    /// 规划完成前按档位估算
    total_sections: Option<usize>,
    started: Instant,
}

impl RunCtx {
    pub fn new(run_index: usize, params: &DocumentParameters) -> Self {
        let profile = Profile::for_document(params.document_type);
        Self {
            run_index,
            profile,
            document_type: params.document_type,
            document: Document::for_parameters(params),
            context: RollingContext::new(profile.tuning().context_capacity),
            stage: None,
            last_percent: 0,
            total_sections: None,
            started: Instant::now(),
        }
    }

    pub fn stage(&self) -> Option<RunStage> {
        self.stage
    }

    pub fn set_total_sections(&mut self, total: usize) {
        self.total_sections = Some(total);
    }

    /// 已用时间（毫秒）
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// 进入新阶段，返回对应的进度
    ///
    /// 百分比取历史最大值，保证不回退。
    pub fn enter(&mut self, stage: RunStage, message: impl Into<String>) -> ProgressUpdate {
        self.stage = Some(stage);
        self.last_percent = self.last_percent.max(self.percent_for(stage));
        let eta_seconds = self.remaining_calls(stage) * self.profile.tuning().seconds_per_call;
        ProgressUpdate {
            stage,
            message: message.into(),
            percent: self.last_percent,
            time_estimate: format_eta(eta_seconds),
        }
    }

    /// 标记运行完成
    pub fn finish(&mut self) {
        self.stage = Some(RunStage::Done);
    }

    /// 标记运行失败
    pub fn fail(&mut self) {
        self.stage = Some(RunStage::Failed);
    }

    fn percent_for(&self, stage: RunStage) -> u8 {
        let scale = self.profile.tuning().progress;
        match stage {
            RunStage::Planning => scale.planning,
            RunStage::FrontMatter => scale.front_matter,
            RunStage::Section { index, total } => {
                let ratio = index as f64 / total.max(1) as f64;
                scale.sections_start + (scale.sections_span as f64 * ratio).round() as u8
            }
            RunStage::BackMatter => scale.back_matter,
            RunStage::Assembling | RunStage::Done => 100,
            RunStage::Failed => self.last_percent,
        }
    }

    /// 包括当前阶段在内还需要的后端调用次数
    fn remaining_calls(&self, stage: RunStage) -> u64 {
        let back = u64::from(self.profile.tuning().has_back_matter);
        // 大纲未知时按每章两个小节估算
        let sections = self
            .total_sections
            .unwrap_or_else(|| self.profile.max_chapters(self.document_type) * 2)
            as u64;
        match stage {
            RunStage::Planning => 2 + sections + back,
            RunStage::FrontMatter => 1 + sections + back,
            RunStage::Section { index, total } => (total + 1).saturating_sub(index) as u64 + back,
            RunStage::BackMatter => back,
            RunStage::Assembling | RunStage::Done | RunStage::Failed => 0,
        }
    }
}

impl Display for RunCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[文档 {}]", self.run_index)
    }
}
