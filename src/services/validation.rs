//! 输入校验 - 业务能力层
//!
//! 在任何后端调用之前检查参数，每个错误都对应一个具体字段。

use crate::error::ValidationError;
use crate::models::DocumentParameters;
use crate::profile::Profile;

pub const MIN_TOPIC_CHARS: usize = 5;
pub const MAX_TOPIC_CHARS: usize = 300;
pub const MIN_PAGE_TARGET: u32 = 5;
pub const MAX_PAGE_TARGET: u32 = 200;

/// 不允许出现在用户文本中的片段（不区分大小写）
const FORBIDDEN_PATTERNS: &[&str] = &["<script>", "javascript:", "onload="];

/// 校验一次生成的输入参数
///
/// 严谨档位额外要求班级、学生、导师和城市/年份都不为空。
pub fn validate_parameters(params: &DocumentParameters) -> Result<(), ValidationError> {
    let topic_len = params.topic.trim().chars().count();
    if topic_len < MIN_TOPIC_CHARS {
        return Err(ValidationError::TopicTooShort {
            min: MIN_TOPIC_CHARS,
            actual: topic_len,
        });
    }
    if topic_len > MAX_TOPIC_CHARS {
        return Err(ValidationError::TopicTooLong {
            max: MAX_TOPIC_CHARS,
            actual: topic_len,
        });
    }

    let institution = &params.institution;
    let mut required = vec![
        ("university", &institution.university),
        ("faculty", &institution.faculty),
    ];
    if Profile::for_document(params.document_type) == Profile::Rigorous {
        required.extend([
            ("group", &institution.group),
            ("student", &institution.student),
            ("supervisor", &institution.supervisor),
            ("city_year", &institution.city_year),
        ]);
    }
    if let Some(&(field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(ValidationError::MissingField { field });
    }

    for (field, value) in [("topic", &params.topic), ("student", &institution.student)] {
        if contains_forbidden(value) {
            return Err(ValidationError::ForbiddenPattern { field });
        }
    }

    let page_target = params.settings.page_target;
    if !(MIN_PAGE_TARGET..=MAX_PAGE_TARGET).contains(&page_target) {
        return Err(ValidationError::PageTargetOutOfRange {
            value: page_target,
            min: MIN_PAGE_TARGET,
            max: MAX_PAGE_TARGET,
        });
    }

    Ok(())
}

fn contains_forbidden(text: &str) -> bool {
    let lowered = text.to_lowercase();
    FORBIDDEN_PATTERNS.iter().any(|p| lowered.contains(*p))
}
