pub mod backend;
pub mod gemini_client;
pub mod openai_client;

pub use backend::{BackendRequest, BackendResponse, Citation, GenerativeBackend};
pub use gemini_client::GeminiClient;
pub use openai_client::OpenAiCompatClient;

use std::sync::Arc;

use crate::config::{BackendKind, Config};
use crate::error::AppResult;

/// 按配置创建生成后端
///
/// 缺少 API 密钥时在这里就返回配置错误，不会发出任何请求。
pub fn build_backend(config: &Config) -> AppResult<Arc<dyn GenerativeBackend>> {
    let backend: Arc<dyn GenerativeBackend> = match config.backend_kind {
        BackendKind::Gemini => Arc::new(GeminiClient::new(config)?),
        BackendKind::OpenAi => Arc::new(OpenAiCompatClient::new(config)?),
    };
    Ok(backend)
}
