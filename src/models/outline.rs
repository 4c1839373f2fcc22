use serde::{Deserialize, Serialize};

/// 大纲中的一章
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterPlan {
    pub title: String,
    pub subsections: Vec<String>,
}

impl ChapterPlan {
    pub fn new(title: impl Into<String>, subsections: Vec<String>) -> Self {
        Self {
            title: title.into(),
            subsections,
        }
    }

    /// 标题和小节都为空的章视为不存在
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() || self.subsections.is_empty()
    }
}

/// 文档大纲：最多三章，每章有序的小节标题
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub chapters: Vec<ChapterPlan>,
}

/// 展开后的一个生成单元（章节号从 1 开始）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSlot<'a> {
    pub chapter_number: usize,
    pub section_number: usize,
    pub chapter_title: &'a str,
    pub section_title: &'a str,
}

impl Outline {
    pub const MAX_CHAPTERS: usize = 3;

    /// 有内容的章，按顺序
    pub fn active_chapters(&self) -> impl Iterator<Item = &ChapterPlan> {
        self.chapters.iter().filter(|c| !c.is_empty())
    }

    /// 按 (章, 小节) 顺序展开
    pub fn flatten(&self) -> Vec<SectionSlot<'_>> {
        self.active_chapters()
            .enumerate()
            .flat_map(|(ci, chapter)| {
                chapter
                    .subsections
                    .iter()
                    .enumerate()
                    .map(move |(si, sub)| SectionSlot {
                        chapter_number: ci + 1,
                        section_number: si + 1,
                        chapter_title: chapter.title.as_str(),
                        section_title: sub.as_str(),
                    })
            })
            .collect()
    }

    pub fn total_sections(&self) -> usize {
        self.active_chapters().map(|c| c.subsections.len()).sum()
    }
}
