//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文档生成器
//! - 管理应用生命周期（初始化、运行、统计）
//! - 批量加载文档参数（Vec<ParamsFile>）
//! - 控制并发数量（Semaphore）
//! - 运行前扣额度，运行后保存并评分
//!
//! ### `document_orchestrator` - 单份文档编排器
//! - 按阶段驱动一次生成（大纲 → 前文 → 小节 → 附录 → 组装）
//! - 发出进度和文档快照
//!
//! ### `assembly` - 目录组装
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<ParamsFile>)
//!     ↓
//! document_orchestrator (处理一份文档)
//!     ↓
//! services (能力层：plan / section / matter / quality)
//!     ↓
//! clients (基础设施：GenerativeBackend)
//! ```

pub mod assembly;
pub mod batch_processor;
pub mod document_orchestrator;

pub use assembly::build_table_of_contents;
pub use batch_processor::{App, RunOutcome};
pub use document_orchestrator::DocumentOrchestrator;
