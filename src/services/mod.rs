pub mod credit_ledger;
pub mod history_store;
pub mod json_repair;
pub mod matter_service;
pub mod plan_service;
pub mod quality_service;
pub mod resilient_caller;
pub mod section_service;
pub mod topic_service;
pub mod validation;

pub use credit_ledger::CreditLedger;
pub use history_store::HistoryStore;
pub use matter_service::{BackMatter, FrontMatter, MatterService};
pub use plan_service::{normalize_outline, PlanService};
pub use resilient_caller::{CallOutcome, ResilientCaller, RetryPolicy};
pub use section_service::{SectionDraft, SectionService};
pub use topic_service::{TopicService, TopicVerdict};
pub use validation::validate_parameters;
