//! 生成后端抽象
//!
//! 一次调用 = 模型 + 指令 + 可选的系统人设 + 可选的 JSON 输出模式 + 可选的联网检索。

use async_trait::async_trait;

use crate::error::BackendError;

/// 一次后端调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRequest {
    pub model: String,
    pub prompt: String,
    pub system_instruction: Option<String>,
    /// 要求后端返回 JSON
    pub json_mode: bool,
    /// 启用联网检索
    pub web_grounding: bool,
}

impl BackendRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system_instruction: None,
            json_mode: false,
            web_grounding: false,
        }
    }

    pub fn with_system(mut self, system_instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(system_instruction.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn grounded(mut self, enabled: bool) -> Self {
        self.web_grounding = enabled;
        self
    }
}

/// 检索引用记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Citation {
    pub uri: Option<String>,
    pub title: Option<String>,
}

/// 后端响应：原始文本 + 检索引用
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendResponse {
    pub text: String,
    pub citations: Vec<Citation>,
}

impl BackendResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
        }
    }
}

/// 生成后端
///
/// 实现只负责一次网络调用和错误分类，重试由 `ResilientCaller` 负责。
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError>;
}
