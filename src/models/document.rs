use serde::{Deserialize, Serialize};

use super::params::{DocumentParameters, DocumentType, Institution};

/// 小节及其生成内容（Markdown）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
}

/// 一章
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub intro: String,
    pub sections: Vec<Section>,
}

/// 组装中的文档
///
/// 由一次编排运行独占；小节只追加不修改，来源 URL 集合只增不减。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub document_type: Option<DocumentType>,
    pub topic: String,
    pub institution: Institution,
    pub table_of_contents: Vec<String>,
    pub introduction: String,
    pub chapters: Vec<Chapter>,
    pub conclusion: String,
    pub references: Vec<String>,
    /// 联网检索得到的来源（去重，保持首次出现顺序）
    pub source_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appendix: Option<String>,
    /// 生成耗时（毫秒）
    pub generation_time_ms: u64,
}

impl Document {
    /// 以输入参数创建空文档
    pub fn for_parameters(params: &DocumentParameters) -> Self {
        Self {
            document_type: Some(params.document_type),
            topic: params.topic.clone(),
            institution: params.institution.clone(),
            ..Default::default()
        }
    }

    /// 合并来源 URL，已存在的忽略
    pub fn add_source_urls<I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        for url in urls {
            if !self.source_urls.contains(&url) {
                self.source_urls.push(url);
            }
        }
    }

    /// 所有小节，按章顺序展开
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.chapters.iter().flat_map(|c| c.sections.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_urls_deduplicated() {
        let mut doc = Document::default();
        doc.add_source_urls(vec!["https://a".to_string(), "https://b".to_string()]);
        doc.add_source_urls(vec!["https://a".to_string()]);
        assert_eq!(doc.source_urls, vec!["https://a", "https://b"]);
    }

    #[test]
    fn test_sections_flatten_across_chapters() {
        let doc = Document {
            chapters: vec![
                Chapter {
                    title: "1".into(),
                    intro: String::new(),
                    sections: vec![Section {
                        title: "1.1".into(),
                        content: "x".into(),
                    }],
                },
                Chapter {
                    title: "2".into(),
                    intro: String::new(),
                    sections: vec![Section {
                        title: "2.1".into(),
                        content: "y".into(),
                    }],
                },
            ],
            ..Default::default()
        };
        let titles: Vec<_> = doc.sections().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["1.1", "2.1"]);
    }
}
