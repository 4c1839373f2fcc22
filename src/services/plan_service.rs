//! 大纲服务 - 业务能力层
//!
//! 只负责"生成大纲"能力：一次结构化调用，解析失败时使用固定回退，不让整次运行卡住。

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clients::BackendRequest;
use crate::error::AppResult;
use crate::models::{ChapterPlan, DocumentParameters, DocumentType, Outline};
use crate::profile::{prompts, Profile};
use crate::services::json_repair::{string_field, string_list_field};
use crate::services::ResilientCaller;

/// 大纲服务
pub struct PlanService {
    caller: ResilientCaller,
    model: String,
}

impl PlanService {
    pub fn new(caller: ResilientCaller, model: impl Into<String>) -> Self {
        Self {
            caller,
            model: model.into(),
        }
    }

    /// 请求大纲并整理为 `Outline`
    ///
    /// 只有后端调用本身失败才返回错误；内容缺失一律回退。
    pub async fn generate_outline(
        &self,
        params: &DocumentParameters,
        profile: Profile,
    ) -> AppResult<Outline> {
        let request = BackendRequest::new(&self.model, prompts::plan_prompt(profile, params))
            .with_system(prompts::system_instruction(profile, params))
            .json();

        let (value, _) = self.caller.call_json(&request).await?;
        let outline = outline_from_json(&value, profile, params.document_type);

        info!(
            "📑 大纲就绪: {} 章 / {} 个小节",
            outline.active_chapters().count(),
            outline.total_sections()
        );
        Ok(outline)
    }
}

/// 把后端返回的 JSON 整理为大纲
pub fn outline_from_json(value: &Value, profile: Profile, document_type: DocumentType) -> Outline {
    let chapters = (1..=Outline::MAX_CHAPTERS)
        .map(|number| {
            ChapterPlan::new(
                string_field(value, &format!("chapter{}_title", number)).unwrap_or_default(),
                string_list_field(value, &format!("chapter{}_subsections", number)),
            )
        })
        .collect();
    normalize_outline(Outline { chapters }, profile, document_type)
}

/// 整理大纲，后端生成的和调用方提供的大纲都经过这里
///
/// - 去掉小节标题前的编号（如 `1.2.`），避免目录中编号重复
/// - 前两章缺少标题或小节时使用档位的固定回退
/// - 超出档位章数的章一律留空，结果总是 `Outline::MAX_CHAPTERS` 个槽位
pub fn normalize_outline(
    outline: Outline,
    profile: Profile,
    document_type: DocumentType,
) -> Outline {
    let max_chapters = profile.max_chapters(document_type).min(Outline::MAX_CHAPTERS);
    if outline.chapters.iter().skip(max_chapters).any(|c| !c.is_empty()) {
        debug!("大纲超出 {} 章的上限，多余的章被忽略", max_chapters);
    }

    let mut given = outline.chapters.into_iter();
    let mut chapters = Vec::with_capacity(Outline::MAX_CHAPTERS);
    for index in 0..Outline::MAX_CHAPTERS {
        let plan = given.next().unwrap_or_default();
        if index >= max_chapters {
            chapters.push(ChapterPlan::default());
            continue;
        }

        let number = index + 1;
        let title = Some(plan.title.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| profile.fallback_chapter_title(index).map(str::to_string));

        let Some(title) = title else {
            debug!("第 {} 章没有标题，跳过", number);
            chapters.push(ChapterPlan::default());
            continue;
        };

        let mut subsections: Vec<String> = plan
            .subsections
            .iter()
            .map(|s| strip_numbering(s))
            .filter(|s| !s.is_empty())
            .collect();

        if subsections.is_empty() {
            warn!("第 {} 章缺少小节，使用默认小节", number);
            subsections = profile.fallback_subsections(index);
        }

        chapters.push(ChapterPlan::new(title, subsections));
    }

    Outline { chapters }
}

/// 去掉标题开头的编号
fn strip_numbering(title: &str) -> String {
    let trimmed = title.trim();
    if let Ok(re) = Regex::new(r"^\d+(?:\.\d+)*(?:[.)、]\s*|\s+)") {
        return re.replace(trimmed, "").trim().to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outline_strips_numbering() {
        let value = json!({
            "chapter1_title": "理论基础",
            "chapter1_subsections": ["1.1. 概念", "1.2 发展历程"],
            "chapter2_title": "现状分析",
            "chapter2_subsections": ["2.1 数据"],
            "chapter3_title": "",
            "chapter3_subsections": []
        });
        let outline = outline_from_json(&value, Profile::Rigorous, DocumentType::TermPaper);
        assert_eq!(outline.chapters[0].subsections, vec!["概念", "发展历程"]);
        assert_eq!(outline.chapters[1].subsections, vec!["数据"]);
        assert!(outline.chapters[2].is_empty());
        assert_eq!(outline.total_sections(), 3);
    }

    #[test]
    fn test_strip_numbering_keeps_leading_years() {
        assert_eq!(strip_numbering("3.2) 建议"), "建议");
        assert_eq!(strip_numbering("2024年数据分析"), "2024年数据分析");
    }

    #[test]
    fn test_empty_object_falls_back() {
        let outline = outline_from_json(&json!({}), Profile::Rigorous, DocumentType::Thesis);
        assert_eq!(outline.chapters[0].title, "理论基础");
        assert_eq!(outline.chapters[0].subsections.len(), 2);
        assert_eq!(outline.chapters[1].title, "现状分析");
        // 第三章没有回退标题
        assert!(outline.chapters[2].is_empty());
        assert_eq!(outline.total_sections(), 4);
    }

    #[test]
    fn test_missing_subsections_use_fallback() {
        let value = json!({
            "chapter1_title": "理论",
            "chapter1_subsections": ["", "  "],
            "chapter2_title": "分析",
            "chapter2_subsections": ["a"],
            "chapter3_title": "方案"
        });
        let outline = outline_from_json(&value, Profile::Rigorous, DocumentType::Thesis);
        assert_eq!(
            outline.chapters[0].subsections,
            Profile::Rigorous.fallback_subsections(0)
        );
        assert_eq!(outline.chapters[2].title, "方案");
        assert_eq!(
            outline.chapters[2].subsections,
            Profile::Rigorous.fallback_subsections(2)
        );
    }

    #[test]
    fn test_lightweight_ignores_third_chapter() {
        let value = json!({
            "chapter1_title": "问题",
            "chapter1_subsections": ["a"],
            "chapter2_title": "分析",
            "chapter2_subsections": ["b"],
            "chapter3_title": "多余",
            "chapter3_subsections": ["c"]
        });
        let outline =
            outline_from_json(&value, Profile::Lightweight, DocumentType::IndependentStudy);
        assert_eq!(outline.active_chapters().count(), 2);
        assert_eq!(outline.total_sections(), 2);
    }

    #[test]
    fn test_normalize_given_outline() {
        let given = Outline {
            chapters: vec![
                ChapterPlan::new("A", vec!["1.1. 概念".into()]),
                ChapterPlan::new("B", vec![]),
                ChapterPlan::new("C", vec!["x".into()]),
                ChapterPlan::new("D", vec!["y".into()]),
            ],
        };
        let outline = normalize_outline(given, Profile::Rigorous, DocumentType::TermPaper);

        assert_eq!(outline.chapters.len(), Outline::MAX_CHAPTERS);
        assert_eq!(outline.active_chapters().count(), 2);
        assert_eq!(outline.chapters[0].subsections, vec!["概念"]);
        assert_eq!(outline.chapters[1].title, "B");
        assert_eq!(
            outline.chapters[1].subsections,
            Profile::Rigorous.fallback_subsections(1)
        );
        assert!(outline.chapters[2].is_empty());
    }

    #[test]
    fn test_normalize_fills_missing_chapters() {
        let outline = normalize_outline(
            Outline::default(),
            Profile::Lightweight,
            DocumentType::ShortEssay,
        );
        assert_eq!(outline.chapters[0].title, "问题的提出");
        assert_eq!(outline.chapters[1].title, "分析与思考");
        assert_eq!(outline.total_sections(), 2);
    }
}
