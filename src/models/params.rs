use serde::{Deserialize, Serialize};

/// 文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// 短篇报告
    #[serde(alias = "referat")]
    ShortEssay,
    /// 独立作业
    #[serde(alias = "mustaqil_ish")]
    IndependentStudy,
    /// 课程论文
    #[serde(alias = "kurs_ishi")]
    TermPaper,
    /// 毕业论文
    #[serde(alias = "bmi")]
    Thesis,
    /// 学术文章
    #[serde(alias = "maqola")]
    Article,
}

impl DocumentType {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            DocumentType::ShortEssay => "短篇报告",
            DocumentType::IndependentStudy => "独立作业",
            DocumentType::TermPaper => "课程论文",
            DocumentType::Thesis => "毕业论文",
            DocumentType::Article => "学术文章",
        }
    }

    /// 大纲最多包含的章数
    pub fn chapter_count(self) -> usize {
        match self {
            DocumentType::Thesis => 3,
            _ => 2,
        }
    }
}

/// 院校信息（封面所需）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub university: String,
    pub faculty: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub student: String,
    #[serde(default)]
    pub supervisor: String,
    #[serde(default)]
    pub city_year: String,
}

/// 生成选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// 是否启用联网检索
    #[serde(default)]
    pub web_grounding: bool,
    /// 目标页数
    #[serde(default = "default_page_target")]
    pub page_target: u32,
}

fn default_page_target() -> u32 {
    30
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            web_grounding: false,
            page_target: default_page_target(),
        }
    }
}

/// 一次生成的输入参数，在整个运行期间不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentParameters {
    pub document_type: DocumentType,
    pub topic: String,
    pub institution: Institution,
    #[serde(default)]
    pub settings: GenerationSettings,
}
