mod common;

use std::time::Duration;

use common::{params, two_by_two_plan, CallKind, ScriptedBackend, SECTION_CHAR};
use serde_json::json;
use thesis_pipeline::config::Config;
use thesis_pipeline::error::{AppError, BackendError, ConfigError};
use thesis_pipeline::models::{ChapterPlan, Document, DocumentType, Outline};
use thesis_pipeline::orchestrator::{App, DocumentOrchestrator, RunOutcome};
use thesis_pipeline::workflow::{EventSink, ProgressUpdate, RunEvent, RunStage};
use thesis_pipeline::{build_backend, score};
use tokio::sync::mpsc::UnboundedReceiver;

fn orchestrator(backend: std::sync::Arc<ScriptedBackend>) -> DocumentOrchestrator {
    DocumentOrchestrator::new(&Config::default(), backend)
}

/// 收集已发出的全部事件
fn collect(
    mut rx: UnboundedReceiver<RunEvent>,
) -> (Vec<ProgressUpdate>, Vec<Document>, Vec<String>) {
    let mut progress = Vec::new();
    let mut partials = Vec::new();
    let mut failures = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            RunEvent::Progress(update) => progress.push(update),
            RunEvent::Partial(doc) => partials.push(*doc),
            RunEvent::Failed { message } => failures.push(message),
        }
    }
    (progress, partials, failures)
}

#[tokio::test(start_paused = true)]
async fn test_rigorous_run_end_to_end() {
    let backend = ScriptedBackend::new(two_by_two_plan());
    let orchestrator = orchestrator(backend.clone());
    let (sink, rx) = EventSink::channel();

    let document = orchestrator
        .run(1, &params(DocumentType::TermPaper), &sink)
        .await
        .expect("生成应该成功");
    drop(sink);
    let (progress, partials, failures) = collect(rx);

    // 阶段顺序
    let stages: Vec<RunStage> = progress.iter().map(|p| p.stage).collect();
    assert_eq!(
        stages,
        vec![
            RunStage::Planning,
            RunStage::FrontMatter,
            RunStage::Section { index: 1, total: 4 },
            RunStage::Section { index: 2, total: 4 },
            RunStage::Section { index: 3, total: 4 },
            RunStage::Section { index: 4, total: 4 },
            RunStage::BackMatter,
            RunStage::Assembling,
        ]
    );
    assert_eq!(partials.len(), 7);
    assert!(failures.is_empty());

    // 百分比不回退，最终为 100
    let percents: Vec<u8> = progress.iter().map(|p| p.percent).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
    assert_eq!(percents, vec![2, 5, 30, 50, 70, 90, 95, 100]);

    // 小节与大纲一致
    let titles: Vec<&str> = document.sections().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["基本概念", "国外经验", "发展现状", "存在问题"]);
    assert_eq!(document.chapters.len(), 2);
    assert_eq!(document.chapters[1].title, "现状分析");

    // 快照逐步增长
    let section_counts: Vec<usize> = partials.iter().map(|d| d.sections().count()).collect();
    assert_eq!(section_counts, vec![0, 1, 2, 3, 4, 4, 4]);
    assert!(partials[0].introduction.starts_with('引'));

    // 目录: 引言 + 2 章 + 4 小节 + 结论/参考文献/附录
    assert_eq!(document.table_of_contents.len(), 10);
    assert_eq!(document.table_of_contents[1], "第1章 理论基础");
    assert_eq!(document.table_of_contents[2], "1.1 基本概念");

    // 来源去重
    assert_eq!(
        document.source_urls,
        vec!["https://lex.uz/docs/1", "https://stat.uz"]
    );

    // 严谨档位: 参考文献排序，有附录
    let mut sorted = document.references.clone();
    sorted.sort();
    assert_eq!(document.references, sorted);
    assert!(document.appendix.is_some());

    // 每次调用只嵌入有限的上下文
    let section_prompts: Vec<String> = backend
        .requests()
        .into_iter()
        .filter(|r| common::classify(r) == CallKind::Section)
        .map(|r| r.prompt)
        .collect();
    assert_eq!(section_prompts.len(), 4);
    for prompt in &section_prompts {
        assert!(prompt.chars().filter(|c| *c == SECTION_CHAR).count() <= 1000);
    }
    // 第 4 节时已有 3 段 300 字的摘录
    assert_eq!(
        section_prompts[3]
            .chars()
            .filter(|c| *c == SECTION_CHAR)
            .count(),
        900
    );

    let report = score(&document);
    assert_eq!(report.score, 100, "{:?}", report.items);
    assert!(report.passed);
}

#[tokio::test(start_paused = true)]
async fn test_rigorous_pacing_between_sections() {
    let backend = ScriptedBackend::new(two_by_two_plan());
    let orchestrator = orchestrator(backend);

    let start = tokio::time::Instant::now();
    orchestrator
        .run(1, &params(DocumentType::TermPaper), &EventSink::disabled())
        .await
        .unwrap();
    // 4 个小节之间 3 次 1500ms 的间隔
    assert_eq!(start.elapsed(), Duration::from_millis(4500));
}

#[tokio::test(start_paused = true)]
async fn test_lightweight_run() {
    let plan = json!({
        "chapter1_title": "问题的提出",
        "chapter1_subsections": ["原因"],
        "chapter2_title": "分析",
        "chapter2_subsections": ["案例"],
        "chapter3_title": "不应出现",
        "chapter3_subsections": ["x"]
    });
    let backend = ScriptedBackend::new(plan);
    let orchestrator = orchestrator(backend.clone());
    let (sink, rx) = EventSink::channel();

    let start = tokio::time::Instant::now();
    let document = orchestrator
        .run(2, &params(DocumentType::ShortEssay), &sink)
        .await
        .unwrap();
    drop(sink);
    let (progress, partials, _) = collect(rx);

    let percents: Vec<u8> = progress.iter().map(|p| p.percent).collect();
    assert_eq!(percents, vec![5, 10, 50, 80, 90, 100]);
    assert_eq!(partials.len(), 5);

    assert_eq!(document.appendix, None);
    assert_eq!(backend.count(CallKind::BackMatter), 0);
    assert_eq!(backend.count(CallKind::Section), 2);

    // 引言 + 2 章 + 2 小节 + 结论/参考文献
    assert_eq!(document.table_of_contents.len(), 7);
    assert_eq!(document.table_of_contents[1], "问题的提出");

    // 轻量档位保留原始文献顺序
    assert!(document.references[0].starts_with("12."));

    assert_eq!(start.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_is_retried() {
    let backend = ScriptedBackend::new(two_by_two_plan());
    backend.fail_next(CallKind::Plan, BackendError::from_status(429, "quota"));
    backend.fail_next(CallKind::Section, BackendError::from_status(503, "busy"));
    let orchestrator = orchestrator(backend.clone());

    let document = orchestrator
        .run(1, &params(DocumentType::TermPaper), &EventSink::disabled())
        .await
        .unwrap();

    assert_eq!(document.sections().count(), 4);
    assert_eq!(backend.count(CallKind::Plan), 2);
    assert_eq!(backend.count(CallKind::Section), 5);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_call_fails_run() {
    let backend = ScriptedBackend::new(two_by_two_plan());
    backend.fail_next(CallKind::Section, BackendError::from_status(400, "bad prompt"));
    let orchestrator = orchestrator(backend.clone());
    let (sink, rx) = EventSink::channel();

    let err = orchestrator
        .run(1, &params(DocumentType::Thesis), &sink)
        .await
        .unwrap_err();
    drop(sink);
    let (progress, partials, failures) = collect(rx);

    assert!(matches!(
        err,
        AppError::Backend(BackendError::Rejected { status: 400, .. })
    ));
    // 不重试
    assert_eq!(backend.count(CallKind::Section), 1);
    assert_eq!(
        progress.last().map(|p| p.stage),
        Some(RunStage::Section { index: 1, total: 4 })
    );
    assert_eq!(partials.len(), 1);
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("bad prompt"));
}

#[tokio::test]
async fn test_malformed_plan_falls_back() {
    let backend = ScriptedBackend::new(json!("not an object"));
    let orchestrator = orchestrator(backend);

    let outline = orchestrator
        .plan(&params(DocumentType::TermPaper))
        .await
        .unwrap();
    assert_eq!(outline.active_chapters().count(), 2);
    assert!(outline.total_sections() >= 2);
}

#[tokio::test]
async fn test_invalid_parameters_make_no_calls() {
    let backend = ScriptedBackend::new(two_by_two_plan());
    let orchestrator = orchestrator(backend.clone());
    let mut p = params(DocumentType::Thesis);
    p.topic = "AI".into();

    let err = orchestrator
        .run(1, &p, &EventSink::disabled())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(backend.requests().is_empty());
}

#[test]
fn test_missing_credential_is_fatal() {
    let config = Config::default();
    let err = build_backend(&config).err().expect("缺少密钥时应报错");
    assert!(matches!(
        err,
        AppError::Config(ConfigError::MissingCredential { .. })
    ));
}

#[test]
fn test_plan_with_blocking_runtime() {
    let backend = ScriptedBackend::new(two_by_two_plan());
    let orchestrator = orchestrator(backend);
    let outline =
        tokio_test::block_on(orchestrator.plan(&params(DocumentType::Thesis))).unwrap();
    assert_eq!(outline.total_sections(), 4);
}

fn write_params(dir: &std::path::Path, name: &str, topic: &str) {
    std::fs::write(
        dir.join(format!("{}.toml", name)),
        format!(
            r#"
document_type = "kurs_ishi"
topic = "{}"

[institution]
university = "塔什干国立经济大学"
faculty = "经济学院"
group = "E-21"
student = "张三"
supervisor = "李四"
city_year = "塔什干 2025"

[settings]
web_grounding = false
page_target = 30
"#,
            topic
        ),
    )
    .unwrap();
}

const VALID_TOPIC: &str = "数字经济背景下中小企业融资问题研究";

#[tokio::test(start_paused = true)]
async fn test_batch_app_respects_credits() {
    let dir = tempfile::TempDir::new().unwrap();
    let params_dir = dir.path().join("params");
    std::fs::create_dir_all(&params_dir).unwrap();
    for name in ["a", "b"] {
        write_params(&params_dir, name, VALID_TOPIC);
    }

    let config = Config {
        params_folder: params_dir.display().to_string(),
        output_dir: dir.path().join("out").display().to_string(),
        credits: 1,
        max_concurrent_runs: 2,
        ..Config::default()
    };
    let app = App::with_backend(config, ScriptedBackend::new(two_by_two_plan()));

    let outcomes = app.run().await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.contains(&RunOutcome::Completed { score: 100 }));
    assert!(outcomes.contains(&RunOutcome::Skipped));

    assert_eq!(app.ledger().balance(), 0);
    let history = app.store().all().await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].id.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_batch_invalid_params_do_not_consume_credit() {
    let dir = tempfile::TempDir::new().unwrap();
    let params_dir = dir.path().join("params");
    std::fs::create_dir_all(&params_dir).unwrap();
    write_params(&params_dir, "a", "AI");
    write_params(&params_dir, "b", VALID_TOPIC);

    let backend = ScriptedBackend::new(two_by_two_plan());
    let config = Config {
        params_folder: params_dir.display().to_string(),
        output_dir: dir.path().join("out").display().to_string(),
        credits: 1,
        max_concurrent_runs: 1,
        refine_topic: true,
        ..Config::default()
    };
    let app = App::with_backend(config, backend.clone());

    let outcomes = app.run().await.unwrap();
    assert_eq!(
        outcomes,
        vec![RunOutcome::Failed, RunOutcome::Completed { score: 100 }]
    );
    assert_eq!(app.ledger().balance(), 0);

    // 无效参数的运行不调用后端，只有一次大纲调用
    assert_eq!(backend.count(CallKind::Plan), 1);

    // 润色结果过长，保留原主题
    let history = app.store().all().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].topic, VALID_TOPIC);
}

#[tokio::test(start_paused = true)]
async fn test_run_with_given_outline_is_normalized() {
    let backend = ScriptedBackend::new(two_by_two_plan());
    let orchestrator = orchestrator(backend.clone());
    let outline = Outline {
        chapters: vec![
            ChapterPlan::new("A", vec!["1.1. 概念".into()]),
            ChapterPlan::new("B", vec![]),
            ChapterPlan::new("C", vec!["x".into()]),
            ChapterPlan::new("D", vec!["y".into()]),
        ],
    };

    let document = orchestrator
        .run_with_outline(
            1,
            &params(DocumentType::TermPaper),
            outline,
            &EventSink::disabled(),
        )
        .await
        .unwrap();

    assert_eq!(backend.count(CallKind::Plan), 0);
    assert_eq!(document.chapters.len(), 2);
    assert_eq!(
        document.table_of_contents,
        vec![
            "引言",
            "第1章 A",
            "1.1 概念",
            "第2章 B",
            "2.1 现状的系统分析",
            "2.2 主要问题的分类",
            "结论",
            "参考文献",
            "附录",
        ]
    );
}
