//! 提示词模板
//!
//! 每个阶段一份模板，按档位区分。小节字数要求只写进指令，不做校验。

use phf::phf_map;

use super::Profile;
use crate::models::{DocumentParameters, DocumentType, SectionSlot};

/// 院系方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum FacultyKind {
    Computing,
    Economics,
    Law,
}

/// 院系名称关键字 → 方向
static FACULTY_KEYWORDS: phf::Map<&'static str, FacultyKind> = phf_map! {
    "kompyuter" => FacultyKind::Computing,
    "tatu" => FacultyKind::Computing,
    "computer" => FacultyKind::Computing,
    "informat" => FacultyKind::Computing,
    "software" => FacultyKind::Computing,
    "计算机" => FacultyKind::Computing,
    "软件" => FacultyKind::Computing,
    "信息" => FacultyKind::Computing,
    "iqtisod" => FacultyKind::Economics,
    "moliya" => FacultyKind::Economics,
    "econom" => FacultyKind::Economics,
    "financ" => FacultyKind::Economics,
    "经济" => FacultyKind::Economics,
    "金融" => FacultyKind::Economics,
    "yuris" => FacultyKind::Law,
    "huquq" => FacultyKind::Law,
    "law" => FacultyKind::Law,
    "法学" => FacultyKind::Law,
    "法律" => FacultyKind::Law,
};

fn faculty_kind(faculty: &str) -> Option<FacultyKind> {
    let lowered = faculty.to_lowercase();
    FACULTY_KEYWORDS
        .entries()
        .filter(|(keyword, _)| lowered.contains(*keyword))
        .map(|(_, kind)| *kind)
        .min()
}

/// 院系专属写作要求
pub fn faculty_rules(faculty: &str) -> String {
    match faculty_kind(faculty) {
        Some(FacultyKind::Computing) => "方向: 计算机与信息技术。\n\
             - 代码示例使用 Python 或 C++，每一行都要有注释。\n\
             - 用分步骤的文字描述算法。\n\
             - 通过 UML 图的文字描述说明系统架构。"
            .to_string(),
        Some(FacultyKind::Economics) => "方向: 经济学。\n\
             - 用表格给出 GDP 增速、通胀率和投资指标的动态。\n\
             - 写出财务分析所用的公式。"
            .to_string(),
        Some(FacultyKind::Law) => "方向: 法学。\n\
             - 引用司法实践中的案例。\n\
             - 对不同国家的法律条款做比较分析。"
            .to_string(),
        None => format!("方向: {}。对主题进行深入的理论与实践分析。", faculty),
    }
}

/// 系统人设
pub fn system_instruction(profile: Profile, params: &DocumentParameters) -> String {
    match profile {
        Profile::Rigorous => format!(
            r#"你是一位资深教授，负责按照学术论文规范审阅和撰写学位论文，同时是查重系统专家。

目标: 撰写一篇{doc_type}。
主题: "{topic}"
院系: {faculty}
学生: {student}（班级: {group}）

### 写作规则（重要）
1. **保持上下文**: 每个新小节都要承接上一小节的观点，不得前后矛盾。
2. **数据准确**:
   - 严禁出现"[此处插入表格]"之类的占位文字。
   - 需要表格时直接用 Markdown 绘制，并填入接近真实的统计数据（2020-2024 年）。
3. **学术文风**:
   - 句子简洁。
   - 不使用"我认为"，改用"分析表明……"。
4. **格式**:
   - 每个新观点另起一段。
   - 关键术语使用**粗体**。
5. 不要出现"作为 AI 模型"或"以下是您的论文"之类的话，只输出正文。

{rules}
"#,
            doc_type = params.document_type.name(),
            topic = params.topic,
            faculty = params.institution.faculty,
            student = params.institution.student,
            group = params.institution.group,
            rules = faculty_rules(&params.institution.faculty),
        ),
        Profile::Lightweight => format!(
            r#"你是帮助学生完成作业的学术顾问。
文档类型: {doc_type}
主题: "{topic}"

**写作方式:**
1. 这不是严肃的学位论文，而是学生对主题的独立思考和分析。
2. 文风: 通俗、流畅，可以带一些评论性的表达。
3. 允许使用"我认为""总的来说"之类的主动表达。
4. 目标: 简明扼要地讲清主题的本质。

{rules}
"#,
            doc_type = params.document_type.name(),
            topic = params.topic,
            rules = faculty_rules(&params.institution.faculty),
        ),
    }
}

/// 大纲指令（JSON 输出）
pub fn plan_prompt(profile: Profile, params: &DocumentParameters) -> String {
    match profile {
        Profile::Rigorous => {
            let with_third = profile.max_chapters(params.document_type) >= 3;
            let chapter3_title = if with_third {
                "第三章标题（实践建议）"
            } else {
                ""
            };
            let chapter3_subs = if with_third {
                r#"["3.1 ...", "3.2 ..."]"#
            } else {
                "[]"
            };
            format!(
                r#"请为以下主题拟定一份完整的论文大纲: "{topic}"。

要求:
1. 大纲按逻辑递进（理论 → 分析 → 解决方案）。
2. 章标题严谨、学术化。

以 JSON 格式返回:
{{
  "chapter1_title": "第一章标题（理论基础）",
  "chapter1_subsections": ["1.1 ...", "1.2 ...", "1.3 ..."],
  "chapter2_title": "第二章标题（分析部分）",
  "chapter2_subsections": ["2.1 ...", "2.2 ...", "2.3 ..."],
  "chapter3_title": "{chapter3_title}",
  "chapter3_subsections": {chapter3_subs}
}}"#,
                topic = params.topic,
                chapter3_title = chapter3_title,
                chapter3_subs = chapter3_subs,
            )
        }
        Profile::Lightweight => {
            let structure = if params.document_type == DocumentType::ShortEssay {
                "为短篇报告拟定提纲:\n引言（简短）。\n1. 主题的历史与基本概念。\n2. 主题的现状与意义。\n结论。"
            } else {
                "为独立作业拟定提纲:\n引言。\n1. 问题的提出及其原因。\n2. 分析、案例与个人观点，并给出建议。\n结论。"
            };
            format!(
                r#"主题: "{topic}"
{structure}

以 JSON 格式返回:
{{
  "chapter1_title": "第一章标题",
  "chapter1_subsections": ["..."],
  "chapter2_title": "第二章标题",
  "chapter2_subsections": ["..."],
  "chapter3_title": "",
  "chapter3_subsections": []
}}"#,
                topic = params.topic,
                structure = structure,
            )
        }
    }
}

/// 引言、结论、参考文献指令（JSON 输出）
pub fn front_matter_prompt(profile: Profile, params: &DocumentParameters) -> String {
    match profile {
        Profile::Rigorous => format!(
            r#"主题: "{topic}"

任务: 按学术论文规范撰写引言和结论。

引言结构（每项单独成段）:
1. 选题的现实意义（结合国家发展战略）。
2. 问题的研究现状（至少列出 3 位学者）。
3. 研究目的与任务。
4. 研究对象与研究内容。
5. 创新点。

参考文献:
- 相关法律法规。
- 权威机构的统计报告。
- 2020-2024 年的学术论文。
- 每条文献包含作者、题名、出版地、出版社和年份。

以 JSON 返回: {{ "introduction": "markdown 文本...", "conclusion": "markdown 文本...", "references": ["1. ...", "2. ..."] }}"#,
            topic = params.topic,
        ),
        Profile::Lightweight => format!(
            r#"主题: "{topic}"
任务: 撰写"引言""结论"和"参考文献"。

引言: 生动地引出主题，举出生活中的例子，写明目的（约 1 页）。
参考文献: 5-8 条主要文献即可。

以 JSON 返回: {{ "introduction": "...", "conclusion": "...", "references": ["..."] }}"#,
            topic = params.topic,
        ),
    }
}

/// 小节指令，`context` 为滚动上下文的末尾片段
pub fn section_prompt(profile: Profile, slot: &SectionSlot<'_>, context: &str) -> String {
    let min_words = profile.tuning().min_section_words;
    match profile {
        Profile::Rigorous => format!(
            r#"前文摘要: {context}

当前任务:
章: {chapter}
小节: {section}

要求:
1. **篇幅**: 不少于 {min_words} 字，内容详尽。
2. **结构**: 理论联系实际。经济类主题请加入 Markdown 表格，技术类主题请给出算法。
3. **学术性**: 每个论断都要有依据，文献引用写成 [1]、[2] 的形式。
4. **充实**: 不要堆砌空话，给出具体事实、数字和分析。"#,
            context = context,
            chapter = slot.chapter_title,
            section = slot.section_title,
            min_words = min_words,
        ),
        Profile::Lightweight => format!(
            r#"章: {chapter}
小节: {section}

任务: 用自由、易懂的语言阐述这一部分。
篇幅: {min_words} 字左右。
要求: 加入自己的观点、观察和例子，不要写得枯燥。

上下文: {context}"#,
            chapter = slot.chapter_title,
            section = slot.section_title,
            min_words = min_words,
            context = context,
        ),
    }
}

/// 附录指令（仅严谨档位）
pub fn back_matter_prompt(params: &DocumentParameters) -> String {
    format!(
        r#"主题: "{topic}"
任务: 为论文准备附录。

请准备:
1. 统计表（按年份展示动态变化）。
2. 系统结构或流程示意图（文字形式的流程图）。

只返回正文内容。"#,
        topic = params.topic,
    )
}

/// 主题可行性检查指令（JSON 输出）
pub fn topic_check_prompt(topic: &str) -> String {
    format!(
        r#"请检查这个主题: "{}"。它是否适合作为学术作业的题目？以 JSON 返回: {{"is_valid": true/false, "reason": "简短说明"}}"#,
        topic
    )
}

/// 主题润色指令
pub fn refine_topic_prompt(topic: &str) -> String {
    format!(
        r#"学生输入的主题是: "{}"。
请按高等教育的学术规范，把它改写成严谨、规范、措辞得体的论文题目。
只返回一个最好的方案。
例如: "AI 和经济" -> "数字经济背景下人工智能技术的应用前景研究"。

只返回题目本身。"#,
        topic
    )
}

/// 降重改写指令
pub fn paraphrase_prompt(text: &str) -> String {
    format!(
        r#"你是一名专注于降低重复率的学术编辑。请在保留原意和学术严谨性的前提下改写下面的文本。

### 规则
1. 不得直接照抄法律法规原文，一律改写表述。
2. 保持学术语气，不使用口语。
3. 在合适的位置加上文献序号，如 [1]、[2]。
4. 输出语言与输入保持一致。
5. 只返回改写后的文本，不要任何说明。

### 输入文本
"{}""#,
        text
    )
}
