//! 小节服务 - 业务能力层
//!
//! 只负责"写一个小节"：嵌入滚动上下文的末尾片段发起调用，
//! 再把新内容的开头片段写回上下文。不关心小节顺序，也不负责节奏控制。

use tracing::debug;

use crate::clients::BackendRequest;
use crate::error::AppResult;
use crate::models::rolling_context::head_chars;
use crate::models::{DocumentParameters, RollingContext, SectionSlot};
use crate::profile::{prompts, Profile};
use crate::services::ResilientCaller;

/// 一个小节的生成结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionDraft {
    pub content: String,
    pub urls: Vec<String>,
}

/// 小节服务
pub struct SectionService {
    caller: ResilientCaller,
    model: String,
}

impl SectionService {
    pub fn new(caller: ResilientCaller, model: impl Into<String>) -> Self {
        Self {
            caller,
            model: model.into(),
        }
    }

    /// 生成一个小节并更新滚动上下文
    ///
    /// 调用失败时上下文保持不变。
    pub async fn write_section(
        &self,
        params: &DocumentParameters,
        profile: Profile,
        slot: &SectionSlot<'_>,
        context: &mut RollingContext,
    ) -> AppResult<SectionDraft> {
        let tuning = profile.tuning();
        let window = context.window(tuning.context_window);
        debug!(
            "小节 {}.{} 嵌入上下文 {} 字符",
            slot.chapter_number,
            slot.section_number,
            window.chars().count()
        );

        let prompt = prompts::section_prompt(profile, slot, window);
        let request = BackendRequest::new(&self.model, prompt)
            .with_system(prompts::system_instruction(profile, params))
            .grounded(params.settings.web_grounding);

        let outcome = self.caller.call(&request).await?;
        let content = outcome.text.trim().to_string();

        let excerpt = head_chars(&content, tuning.context_excerpt);
        match profile {
            Profile::Rigorous => {
                context.push(&format!("\n{}: {}...", slot.section_title, excerpt))
            }
            Profile::Lightweight => context.push(excerpt),
        }

        Ok(SectionDraft {
            content,
            urls: outcome.urls,
        })
    }
}
