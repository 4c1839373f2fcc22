//! 主题服务 - 业务能力层
//!
//! 三个独立的小能力：主题可行性检查、主题润色、降重改写。
//! 前两个在后端出错时放行原输入，不阻断生成。

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clients::BackendRequest;
use crate::error::AppResult;
use crate::profile::prompts;
use crate::services::json_repair::string_field;
use crate::services::ResilientCaller;

/// 主题检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicVerdict {
    pub is_valid: bool,
    pub reason: String,
}

impl TopicVerdict {
    fn accept() -> Self {
        Self {
            is_valid: true,
            reason: String::new(),
        }
    }
}

/// 主题服务
pub struct TopicService {
    caller: ResilientCaller,
    model: String,
}

impl TopicService {
    pub fn new(caller: ResilientCaller, model: impl Into<String>) -> Self {
        Self {
            caller,
            model: model.into(),
        }
    }

    /// 检查主题是否适合作为学术题目
    ///
    /// 后端出错或回复无法解析时视为通过。
    pub async fn check_topic(&self, topic: &str) -> TopicVerdict {
        let request = BackendRequest::new(&self.model, prompts::topic_check_prompt(topic)).json();
        match self.caller.call_json(&request).await {
            Ok((value, _)) => match value.get("is_valid").and_then(|v| v.as_bool()) {
                Some(is_valid) => TopicVerdict {
                    is_valid,
                    reason: string_field(&value, "reason").unwrap_or_default(),
                },
                None => TopicVerdict::accept(),
            },
            Err(e) => {
                warn!("主题检查失败，默认放行: {}", e);
                TopicVerdict::accept()
            }
        }
    }

    /// 把主题改写为规范的学术题目，失败或空回复时返回原主题
    pub async fn refine_topic(&self, topic: &str) -> String {
        let request = BackendRequest::new(&self.model, prompts::refine_topic_prompt(topic));
        match self.caller.call(&request).await {
            Ok(outcome) => {
                let refined = outcome.text.trim().trim_matches('"').trim();
                if refined.is_empty() {
                    topic.to_string()
                } else {
                    refined.to_string()
                }
            }
            Err(e) => {
                warn!("主题润色失败，沿用原主题: {}", e);
                topic.to_string()
            }
        }
    }

    /// 降重改写，错误直接返回
    pub async fn paraphrase(&self, text: &str) -> AppResult<String> {
        let request = BackendRequest::new(&self.model, prompts::paraphrase_prompt(text));
        let outcome = self.caller.call(&request).await?;
        Ok(outcome.text.trim().to_string())
    }
}
