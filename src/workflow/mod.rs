pub mod progress;
pub mod run_ctx;

pub use progress::{EventSink, ProgressUpdate, RunEvent};
pub use run_ctx::{RunCtx, RunStage};
