//! OpenAI 兼容客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, DeepSeek, Doubao 等）
//!
//! 该协议没有联网检索，响应中的引用始终为空。

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::backend::{BackendRequest, BackendResponse, GenerativeBackend};
use crate::config::Config;
use crate::error::{is_transient_status, AppResult, BackendError};

/// JSON 模式下追加到系统消息的要求
const JSON_ONLY_HINT: &str = "只返回一个合法的 JSON 对象，不要输出任何其他内容。";

/// OpenAI 兼容客户端
pub struct OpenAiCompatClient {
    client: Client<OpenAIConfig>,
}

impl OpenAiCompatClient {
    /// 创建新的客户端，缺少密钥时直接报错
    pub fn new(config: &Config) -> AppResult<Self> {
        let api_key = config.require_api_key()?;
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.api_base_url);

        Ok(Self {
            client: Client::with_config(openai_config),
        })
    }

    fn build_messages(
        request: &BackendRequest,
    ) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        let mut messages = Vec::new();

        // 系统消息（人设 + JSON 要求）
        let system = match (&request.system_instruction, request.json_mode) {
            (Some(sys), true) => Some(format!("{}\n\n{}", sys, JSON_ONLY_HINT)),
            (Some(sys), false) => Some(sys.clone()),
            (None, true) => Some(JSON_ONLY_HINT.to_string()),
            (None, false) => None,
        };
        if let Some(sys_msg) = system {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt.as_str())
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        Ok(messages)
    }
}

/// 按错误文本中的状态码分类
fn classify_error(err: OpenAIError) -> BackendError {
    let message = err.to_string();
    let lowered = message.to_lowercase();
    let status = if lowered.contains("429") || lowered.contains("rate limit") {
        Some(429)
    } else {
        [500u16, 502, 503, 504]
            .into_iter()
            .find(|code| message.contains(&code.to_string()))
    };

    match status {
        Some(code) if is_transient_status(code) => BackendError::Transient {
            status: code,
            message,
        },
        _ => BackendError::Rejected { status: 0, message },
    }
}

#[async_trait]
impl GenerativeBackend for OpenAiCompatClient {
    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        debug!("调用 LLM API，模型: {}", request.model);
        debug!("用户消息长度: {} 字符", request.prompt.chars().count());
        if request.web_grounding {
            debug!("OpenAI 兼容协议不支持联网检索，忽略该选项");
        }

        let messages = Self::build_messages(request).map_err(classify_error)?;

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .build()
            .map_err(classify_error)?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            classify_error(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| BackendError::EmptyResponse {
                model: request.model.clone(),
            })?;

        Ok(BackendResponse::text(content.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let config = Config::default();
        assert!(OpenAiCompatClient::new(&config).is_err());
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = classify_error(OpenAIError::InvalidArgument(
            "status 429: too many requests".to_string(),
        ));
        assert!(err.is_transient());
    }

    #[test]
    fn test_classify_other_errors_fail_fast() {
        let err = classify_error(OpenAIError::InvalidArgument("model not found".to_string()));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_json_mode_adds_system_message() {
        let request = BackendRequest::new("m", "plan").json();
        let messages = OpenAiCompatClient::build_messages(&request).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
    }
}
