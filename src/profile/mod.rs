//! 生成档位
//!
//! 按文档类型在运行开始时选定一次：
//! - `Rigorous`：课程论文、毕业论文、学术文章，理论 → 分析 → 方案，带附录
//! - `Lightweight`：短篇报告、独立作业，结构简单，无附录
//!
//! 档位决定提示词、上下文长度、节奏延迟和进度刻度，不改变流程形状。

pub mod prompts;

use std::time::Duration;

use crate::models::DocumentType;

/// 生成档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Rigorous,
    Lightweight,
}

/// 进度刻度（百分比）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressScale {
    pub planning: u8,
    pub front_matter: u8,
    /// 小节进度从这里开始
    pub sections_start: u8,
    /// 全部小节完成时累计增加的百分比
    pub sections_span: u8,
    pub back_matter: u8,
}

/// 档位参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileTuning {
    /// 嵌入小节指令的上下文字符数
    pub context_window: usize,
    /// 每个小节写回上下文的字符数
    pub context_excerpt: usize,
    /// 用引言初始化上下文时截取的字符数
    pub context_seed: usize,
    /// 上下文最多保留的字符数
    pub context_capacity: usize,
    /// 小节之间的等待时间
    pub pacing: Duration,
    /// 指令中要求的小节最少字数（仅提示，不校验）
    pub min_section_words: usize,
    /// 参考文献是否排序
    pub sort_references: bool,
    /// 是否生成附录
    pub has_back_matter: bool,
    /// 估算剩余时间用的每次调用耗时（秒）
    pub seconds_per_call: u64,
    pub progress: ProgressScale,
}

const RIGOROUS: ProfileTuning = ProfileTuning {
    context_window: 1000,
    context_excerpt: 300,
    context_seed: 500,
    context_capacity: 4000,
    pacing: Duration::from_millis(1500),
    min_section_words: 700,
    sort_references: true,
    has_back_matter: true,
    seconds_per_call: 25,
    progress: ProgressScale {
        planning: 2,
        front_matter: 5,
        sections_start: 10,
        sections_span: 80,
        back_matter: 95,
    },
};

const LIGHTWEIGHT: ProfileTuning = ProfileTuning {
    context_window: 300,
    context_excerpt: 500,
    context_seed: 500,
    context_capacity: 2000,
    pacing: Duration::from_millis(500),
    min_section_words: 300,
    sort_references: false,
    has_back_matter: false,
    seconds_per_call: 10,
    progress: ProgressScale {
        planning: 5,
        front_matter: 10,
        sections_start: 20,
        sections_span: 60,
        back_matter: 90,
    },
};

impl Profile {
    /// 由文档类型决定档位
    pub fn for_document(document_type: DocumentType) -> Self {
        match document_type {
            DocumentType::ShortEssay | DocumentType::IndependentStudy => Profile::Lightweight,
            DocumentType::TermPaper | DocumentType::Thesis | DocumentType::Article => {
                Profile::Rigorous
            }
        }
    }

    pub fn tuning(self) -> &'static ProfileTuning {
        match self {
            Profile::Rigorous => &RIGOROUS,
            Profile::Lightweight => &LIGHTWEIGHT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Profile::Rigorous => "学术严谨",
            Profile::Lightweight => "轻量创作",
        }
    }

    /// 最多生成的章数
    pub fn max_chapters(self, document_type: DocumentType) -> usize {
        match self {
            Profile::Rigorous => document_type.chapter_count(),
            Profile::Lightweight => 2,
        }
    }

    /// 每章开头的过渡段
    pub fn chapter_intro(self, title: &str) -> String {
        match self {
            Profile::Rigorous => format!("本章围绕{}相关问题展开系统分析。", title),
            Profile::Lightweight => format!("下面围绕{}谈谈我们的看法。", title),
        }
    }

    /// 目录中的章标题
    pub fn toc_chapter_heading(self, number: usize, title: &str) -> String {
        match self {
            Profile::Rigorous => format!("第{}章 {}", number, title.to_uppercase()),
            Profile::Lightweight => title.to_uppercase(),
        }
    }

    /// 目录开头
    pub fn toc_opening(self) -> &'static str {
        "引言"
    }

    /// 目录末尾的固定条目
    pub fn toc_trailer(self) -> &'static [&'static str] {
        match self {
            Profile::Rigorous => &["结论", "参考文献", "附录"],
            Profile::Lightweight => &["结论", "参考文献"],
        }
    }

    /// 大纲缺少章标题时使用的标题（`chapter_index` 从 0 开始）
    pub fn fallback_chapter_title(self, chapter_index: usize) -> Option<&'static str> {
        match (self, chapter_index) {
            (Profile::Rigorous, 0) => Some("理论基础"),
            (Profile::Rigorous, 1) => Some("现状分析"),
            (Profile::Lightweight, 0) => Some("问题的提出"),
            (Profile::Lightweight, 1) => Some("分析与思考"),
            _ => None,
        }
    }

    /// 大纲缺少小节时使用的固定小节
    pub fn fallback_subsections(self, chapter_index: usize) -> Vec<String> {
        let titles: &[&str] = match (self, chapter_index) {
            (Profile::Rigorous, 0) => &["研究对象的理论基础", "国外经验分析"],
            (Profile::Rigorous, 1) => &["现状的系统分析", "主要问题的分类"],
            (Profile::Rigorous, _) => &["改进方案与建议", "实施路径"],
            (Profile::Lightweight, 0) => &["基本概念"],
            (Profile::Lightweight, _) => &["主体部分"],
        };
        titles.iter().map(|t| t.to_string()).collect()
    }

    /// 引言或结论缺失时的占位文本
    pub fn missing_text_placeholder(self) -> &'static str {
        match self {
            Profile::Rigorous => "生成失败。",
            Profile::Lightweight => "",
        }
    }
}

/// 把秒数格式化为剩余时间描述
pub fn format_eta(seconds: u64) -> String {
    if seconds == 0 {
        "即将完成".to_string()
    } else if seconds < 60 {
        format!("约 {} 秒", seconds)
    } else {
        format!("约 {} 分钟", seconds.div_ceil(60))
    }
}
