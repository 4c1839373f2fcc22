//! 集成测试共用的脚本化后端

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use thesis_pipeline::clients::{BackendRequest, BackendResponse, Citation, GenerativeBackend};
use thesis_pipeline::error::BackendError;
use thesis_pipeline::models::{DocumentParameters, DocumentType, GenerationSettings, Institution};

/// 小节正文使用的字符，便于统计上下文中嵌入了多少正文
pub const SECTION_CHAR: char = '甲';

/// 请求类别，按指令内容判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Plan,
    FrontMatter,
    Section,
    BackMatter,
}

pub fn classify(request: &BackendRequest) -> CallKind {
    if request.json_mode && request.prompt.contains("chapter1_title") {
        CallKind::Plan
    } else if request.json_mode {
        CallKind::FrontMatter
    } else if request.prompt.contains("附录") {
        CallKind::BackMatter
    } else {
        CallKind::Section
    }
}

/// 按请求类别返回固定内容的后端，可为某类请求预先安排错误
pub struct ScriptedBackend {
    plan: String,
    requests: Mutex<Vec<BackendRequest>>,
    failures: Mutex<VecDeque<(CallKind, BackendError)>>,
}

impl ScriptedBackend {
    pub fn new(plan: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            plan: plan.to_string(),
            requests: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
        })
    }

    /// 下一次 `kind` 类请求返回 `error`
    pub fn fail_next(&self, kind: CallKind, error: BackendError) {
        self.failures.lock().unwrap().push_back((kind, error));
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.requests()
            .iter()
            .filter(|r| classify(r) == kind)
            .count()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        let kind = classify(request);

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(pos) = failures.iter().position(|(k, _)| *k == kind) {
                if let Some((_, error)) = failures.remove(pos) {
                    return Err(error);
                }
            }
        }

        let shared_source = Citation {
            uri: Some("https://lex.uz/docs/1".into()),
            title: None,
        };
        let response = match kind {
            CallKind::Plan => BackendResponse::text(format!("```json\n{}\n```", self.plan)),
            CallKind::FrontMatter => BackendResponse {
                text: front_matter_json().to_string(),
                citations: vec![shared_source],
            },
            CallKind::Section => BackendResponse {
                text: format!(
                    "{}\n\n| 年份 | 指标 |\n|---|---|\n| 2023 | 5.1 |\n\n{}",
                    SECTION_CHAR.to_string().repeat(2000),
                    "word ".repeat(1500)
                ),
                citations: vec![
                    shared_source.clone(),
                    shared_source,
                    Citation {
                        uri: Some("https://stat.uz".into()),
                        title: Some("stat".into()),
                    },
                ],
            },
            CallKind::BackMatter => BackendResponse::text("表 1 统计数据\n流程: A -> B -> C"),
        };
        Ok(response)
    }
}

pub fn front_matter_json() -> serde_json::Value {
    let references: Vec<String> = (1..=12)
        .rev()
        .map(|i| format!("{}. 作者{}. 论文题名. 塔什干: 出版社, 20{:02}.", i, i, i + 10))
        .collect();
    json!({
        "introduction": "引".repeat(800),
        "conclusion": "结".repeat(400),
        "references": references,
    })
}

/// 两章、每章两个小节、第三章为空
pub fn two_by_two_plan() -> serde_json::Value {
    json!({
        "chapter1_title": "理论基础",
        "chapter1_subsections": ["1.1 基本概念", "1.2 国外经验"],
        "chapter2_title": "现状分析",
        "chapter2_subsections": ["2.1 发展现状", "2.2 存在问题"],
        "chapter3_title": "",
        "chapter3_subsections": []
    })
}

pub fn params(document_type: DocumentType) -> DocumentParameters {
    DocumentParameters {
        document_type,
        topic: "数字经济背景下中小企业融资问题研究".into(),
        institution: Institution {
            university: "塔什干国立经济大学".into(),
            faculty: "经济学院".into(),
            group: "E-21".into(),
            student: "张三".into(),
            supervisor: "李四".into(),
            city_year: "塔什干 2025".into(),
        },
        settings: GenerationSettings {
            web_grounding: true,
            page_target: 30,
        },
    }
}
