//! 质量评分 - 业务能力层
//!
//! 对成品文档运行一组固定的规则检查，得到逐项结果和总分。
//! 纯函数，不调用后端，也不会返回错误。

use regex::Regex;

use crate::models::{CheckCategory, CheckItem, CheckStatus, Document, QualityReport};

/// 引言最少字符数（不含）
pub const MIN_INTRODUCTION_CHARS: usize = 500;
/// 结论最少字符数（不含）
pub const MIN_CONCLUSION_CHARS: usize = 300;
/// 参考文献最少条数
pub const MIN_REFERENCES: usize = 10;
/// 标注了年份的参考文献最低占比
pub const MIN_DATED_REFERENCE_RATIO: f64 = 0.8;
/// 每页估算字数
pub const WORDS_PER_PAGE: usize = 250;
/// 最少估算页数
pub const MIN_PAGES: usize = 20;
/// 目录最少条目数
pub const MIN_TOC_ENTRIES: usize = 5;
/// 总分高于此值视为通过
pub const PASS_SCORE: u32 = 60;

/// 图表标记
const FIGURE_PATTERNS: &[&str] = &[r"\d+-rasm", r"\[RASM:", r"图\s*\d+", r"表\s*\d+", r"\|.*\|"];

/// 逐项累积检查结果
struct Checklist {
    items: Vec<CheckItem>,
    passed: usize,
}

/// 未通过时的处理方式
#[derive(Clone, Copy)]
enum Severity {
    Fail,
    Warn,
}

/// 一项检查的文案
struct CheckText<'a> {
    label: &'a str,
    ok: String,
    problem: String,
    recommendation: &'a str,
}

impl Checklist {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            passed: 0,
        }
    }

    fn add(&mut self, category: CheckCategory, ok: bool, severity: Severity, text: CheckText<'_>) {
        let status = match (ok, severity) {
            (true, _) => CheckStatus::Pass,
            (false, Severity::Fail) => CheckStatus::Fail,
            (false, Severity::Warn) => CheckStatus::Warn,
        };
        if ok {
            self.passed += 1;
        }
        self.items.push(CheckItem {
            id: format!("check-{}", self.items.len() + 1),
            category,
            label: text.label.to_string(),
            status,
            message: if ok { text.ok } else { text.problem },
            recommendation: (!ok).then(|| text.recommendation.to_string()),
        });
    }

    fn finish(self) -> QualityReport {
        let total = self.items.len().max(1);
        let score = (100.0 * self.passed as f64 / total as f64).round() as u32;
        QualityReport {
            score,
            items: self.items,
            passed: score > PASS_SCORE,
        }
    }
}

/// 对文档评分
pub fn score(document: &Document) -> QualityReport {
    let mut checks = Checklist::new();

    // 1. 引言
    checks.add(
        CheckCategory::Structure,
        document.introduction.chars().count() > MIN_INTRODUCTION_CHARS,
        Severity::Fail,
        CheckText {
            label: "引言",
            ok: "引言篇幅充足。".into(),
            problem: "引言过短或缺失。".into(),
            recommendation: "扩充引言，写清选题意义和研究目的。",
        },
    );

    // 2. 结论
    checks.add(
        CheckCategory::Structure,
        document.conclusion.chars().count() > MIN_CONCLUSION_CHARS,
        Severity::Fail,
        CheckText {
            label: "结论与建议",
            ok: "结论符合要求。".into(),
            problem: "结论过短。".into(),
            recommendation: "结论中应明确给出研究结果和建议。",
        },
    );

    // 3. 参考文献数量
    let ref_count = document.references.len();
    checks.add(
        CheckCategory::Standard,
        ref_count >= MIN_REFERENCES,
        Severity::Fail,
        CheckText {
            label: "参考文献数量",
            ok: format!("参考文献数量充足（{} 条）。", ref_count),
            problem: format!(
                "参考文献偏少（{} 条），规范要求至少 {} 条。",
                ref_count, MIN_REFERENCES
            ),
            recommendation: "补充更多文献来源。",
        },
    );

    // 4. 参考文献年份
    checks.add(
        CheckCategory::Standard,
        dated_reference_ratio(&document.references) >= MIN_DATED_REFERENCE_RATIO,
        Severity::Warn,
        CheckText {
            label: "参考文献格式（年份）",
            ok: "参考文献均标注了出版年份。".into(),
            problem: "部分参考文献缺少出版年份。".into(),
            recommendation: "每条文献应包含作者、题名、出版地、出版社和年份。",
        },
    );

    // 5. 篇幅
    let pages = estimated_pages(document);
    checks.add(
        CheckCategory::Content,
        pages >= MIN_PAGES,
        Severity::Warn,
        CheckText {
            label: "总篇幅",
            ok: format!("估算页数: {}+。", pages),
            problem: format!("篇幅可能偏少（约 {} 页）。", pages),
            recommendation: "建议扩写各小节内容。",
        },
    );

    // 6. 图表
    checks.add(
        CheckCategory::Formatting,
        has_figure_or_table(document),
        Severity::Warn,
        CheckText {
            label: "图表材料",
            ok: "文中包含图或表。".into(),
            problem: "文中没有发现图或表。".into(),
            recommendation: "建议加入示意图或统计表充实正文。",
        },
    );

    // 7. 目录
    checks.add(
        CheckCategory::Structure,
        document.table_of_contents.len() >= MIN_TOC_ENTRIES,
        Severity::Fail,
        CheckText {
            label: "目录",
            ok: "目录完整。".into(),
            problem: "目录条目不足。".into(),
            recommendation: "重新检查大纲。",
        },
    );

    checks.finish()
}

/// 含四位数年份的参考文献占比，没有文献时为 0
fn dated_reference_ratio(references: &[String]) -> f64 {
    if references.is_empty() {
        return 0.0;
    }
    let Ok(year) = Regex::new(r"\d{4}") else {
        return 0.0;
    };
    let dated = references.iter().filter(|r| year.is_match(r)).count();
    dated as f64 / references.len() as f64
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// 引言、结论和全部小节的字数折算页数（向上取整）
fn estimated_pages(document: &Document) -> usize {
    let words = word_count(&document.introduction)
        + word_count(&document.conclusion)
        + document
            .sections()
            .map(|s| word_count(&s.content))
            .sum::<usize>();
    words.div_ceil(WORDS_PER_PAGE)
}

fn has_figure_or_table(document: &Document) -> bool {
    let content = document
        .sections()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    FIGURE_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .any(|re| re.is_match(&content))
}
