//! 前后附文服务 - 业务能力层
//!
//! - 前文: 一次结构化调用得到引言、结论和参考文献，引言同时用来初始化滚动上下文
//! - 后文: 附录（统计表 + 流程示意），只有严谨档位才会调用后端

use tracing::{debug, info};

use crate::clients::BackendRequest;
use crate::error::AppResult;
use crate::models::rolling_context::head_chars;
use crate::models::{DocumentParameters, RollingContext};
use crate::profile::{prompts, Profile};
use crate::services::json_repair::{string_field, string_list_field};
use crate::services::ResilientCaller;

/// 引言、结论和参考文献
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub introduction: String,
    pub conclusion: String,
    pub references: Vec<String>,
    pub urls: Vec<String>,
}

impl FrontMatter {
    /// 用引言开头初始化滚动上下文
    pub fn seed_context(
        &self,
        params: &DocumentParameters,
        profile: Profile,
        context: &mut RollingContext,
    ) {
        let seed = head_chars(&self.introduction, profile.tuning().context_seed);
        let text = match profile {
            Profile::Rigorous => format!("主题: {}\n目的: {}", params.topic, seed),
            Profile::Lightweight => seed.to_string(),
        };
        context.seed(&text);
    }
}

/// 附录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackMatter {
    pub appendix: Option<String>,
    pub urls: Vec<String>,
}

/// 前后附文服务
pub struct MatterService {
    caller: ResilientCaller,
    model: String,
}

impl MatterService {
    pub fn new(caller: ResilientCaller, model: impl Into<String>) -> Self {
        Self {
            caller,
            model: model.into(),
        }
    }

    /// 生成引言、结论和参考文献
    ///
    /// 字段缺失时引言和结论使用档位占位文本，参考文献为空。
    pub async fn generate_front_matter(
        &self,
        params: &DocumentParameters,
        profile: Profile,
    ) -> AppResult<FrontMatter> {
        let request =
            BackendRequest::new(&self.model, prompts::front_matter_prompt(profile, params))
                .with_system(prompts::system_instruction(profile, params))
                .json()
                .grounded(params.settings.web_grounding);

        let (value, urls) = self.caller.call_json(&request).await?;

        let placeholder = profile.missing_text_placeholder();
        let introduction =
            string_field(&value, "introduction").unwrap_or_else(|| placeholder.to_string());
        let conclusion =
            string_field(&value, "conclusion").unwrap_or_else(|| placeholder.to_string());

        let mut references = string_list_field(&value, "references");
        if profile.tuning().sort_references {
            references.sort();
        }

        info!(
            "📝 前文就绪: 引言 {} 字符, 结论 {} 字符, 参考文献 {} 条",
            introduction.chars().count(),
            conclusion.chars().count(),
            references.len()
        );

        Ok(FrontMatter {
            introduction,
            conclusion,
            references,
            urls,
        })
    }

    /// 生成附录，轻量档位直接返回空结果
    pub async fn generate_back_matter(
        &self,
        params: &DocumentParameters,
        profile: Profile,
    ) -> AppResult<BackMatter> {
        if !profile.tuning().has_back_matter {
            debug!("{}档位不生成附录", profile.name());
            return Ok(BackMatter::default());
        }

        let request = BackendRequest::new(&self.model, prompts::back_matter_prompt(params))
            .with_system(prompts::system_instruction(profile, params));

        let outcome = self.caller.call(&request).await?;
        let appendix = outcome.text.trim().to_string();

        Ok(BackMatter {
            appendix: Some(appendix),
            urls: outcome.urls,
        })
    }
}
