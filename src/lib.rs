//! # Thesis Pipeline
//!
//! 借助生成式后端批量撰写学术文档（课程论文、毕业论文、报告等），并按固定规则评分
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 只负责一次网络调用和错误分类
//! - `GenerativeBackend` - 后端抽象（Gemini / OpenAI 兼容）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个能力只处理一件事
//! - `ResilientCaller` - 重试与响应整理
//! - `PlanService` / `SectionService` / `MatterService` - 大纲、小节、前后附文
//! - `quality_service` - 质量评分
//! - `HistoryStore` / `CreditLedger` - 历史记录与额度
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 一次运行的上下文和事件
//! - `RunCtx` - 运行状态（文档、滚动上下文、进度）
//! - `EventSink` - 进度与快照出口
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/document_orchestrator` - 单份文档的阶段顺序
//! - `orchestrator/batch_processor` - 批量生成，管理并发、额度和保存
//!
//! 档位（`profile/`）和数据模型（`models/`）被各层共用。
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod profile;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{build_backend, GenerativeBackend};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Document, DocumentParameters, DocumentType, Outline, QualityReport};
pub use orchestrator::{App, DocumentOrchestrator};
pub use profile::Profile;
pub use services::quality_service::score;
pub use workflow::{EventSink, RunEvent};
