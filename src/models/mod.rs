pub mod document;
pub mod loaders;
pub mod outline;
pub mod params;
pub mod report;
pub mod rolling_context;

pub use document::{Chapter, Document, Section};
pub use loaders::{load_all_parameters, load_parameters, ParamsFile};
pub use outline::{ChapterPlan, Outline, SectionSlot};
pub use params::{DocumentParameters, DocumentType, GenerationSettings, Institution};
pub use report::{CheckCategory, CheckItem, CheckStatus, QualityReport};
pub use rolling_context::RollingContext;
