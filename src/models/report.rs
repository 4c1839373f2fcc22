use serde::{Deserialize, Serialize};

/// 检查项分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckCategory {
    Structure,
    Formatting,
    Content,
    Standard,
}

/// 检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// 一项检查
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckItem {
    pub id: String,
    pub category: CheckCategory,
    pub label: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// 质量报告，只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: u32,
    pub items: Vec<CheckItem>,
    pub passed: bool,
}

impl QualityReport {
    /// 未通过（警告或失败）的检查项数量
    pub fn problem_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status != CheckStatus::Pass)
            .count()
    }
}
