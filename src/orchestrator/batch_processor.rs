//! 批量文档生成器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量生成和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、生成后端、历史记录、额度账本
//! 2. **批量加载**：扫描并加载所有文档参数（`Vec<ParamsFile>`）
//! 3. **并发控制**：使用 Semaphore 限制同时进行的运行数量
//! 4. **分批处理**：每批完成后再开始下一批
//! 5. **额度检查**：参数校验通过后扣除一个额度，不足则跳过；校验失败不扣额度
//! 6. **收尾**：保存文档、质量评分、全局统计
//!
//! 各次运行互相独立，除后端客户端外不共享可变状态。

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::clients::{build_backend, GenerativeBackend};
use crate::config::Config;
use crate::models::{load_all_parameters, DocumentParameters, ParamsFile};
use crate::orchestrator::DocumentOrchestrator;
use crate::services::{
    quality_service, validate_parameters, CreditLedger, HistoryStore, ResilientCaller,
    TopicService,
};
use crate::utils::logging;
use crate::workflow::{EventSink, RunEvent};

/// 历史记录文件名
const HISTORY_FILE: &str = "history.json";

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: Arc<DocumentOrchestrator>,
    topic_service: Arc<TopicService>,
    store: Arc<HistoryStore>,
    ledger: Arc<CreditLedger>,
}

/// 单次运行的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// 生成并保存成功，附质量评分
    Completed { score: u32 },
    /// 额度不足，未开始
    Skipped,
    Failed,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);

        let backend = build_backend(&config).context("无法创建生成后端")?;
        Ok(Self::with_backend(config, backend))
    }

    /// 使用指定后端创建
    pub fn with_backend(config: Config, backend: Arc<dyn GenerativeBackend>) -> Self {
        let caller = ResilientCaller::new(backend);
        let store = HistoryStore::new(
            Path::new(&config.output_dir).join(HISTORY_FILE),
            config.history_limit,
        );
        Self {
            orchestrator: Arc::new(DocumentOrchestrator::with_caller(
                caller.clone(),
                &config.model_name,
            )),
            topic_service: Arc::new(TopicService::new(caller, &config.model_name)),
            store: Arc::new(store),
            ledger: Arc::new(CreditLedger::new(config.credits)),
            config,
        }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<Vec<RunOutcome>> {
        info!("\n📁 正在扫描待生成的文档参数...");
        let all_params = load_all_parameters(&self.config.params_folder).await?;

        if all_params.is_empty() {
            warn!("⚠️ 没有找到文档参数 TOML 文件，程序结束");
            return Ok(Vec::new());
        }

        logging::log_params_loaded(all_params.len(), self.batch_size());
        let outcomes = self.process_all(all_params).await?;
        self.print_stats(&outcomes);
        Ok(outcomes)
    }

    fn batch_size(&self) -> usize {
        self.config.max_concurrent_runs.max(1)
    }

    /// 分批处理所有文档
    async fn process_all(&self, all_params: Vec<ParamsFile>) -> Result<Vec<RunOutcome>> {
        let batch_size = self.batch_size();
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total = all_params.len();
        let total_batches = total.div_ceil(batch_size);
        let mut outcomes = Vec::with_capacity(total);

        for (batch_idx, batch) in all_params.chunks(batch_size).enumerate() {
            let batch_start = batch_idx * batch_size;
            logging::log_batch_start(
                batch_idx + 1,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total,
            );

            let batch_outcomes = self
                .process_batch(batch, batch_start, semaphore.clone())
                .await?;
            let success = batch_outcomes
                .iter()
                .filter(|o| matches!(o, RunOutcome::Completed { .. }))
                .count();
            logging::log_batch_complete(batch_idx + 1, success, batch_outcomes.len());
            outcomes.extend(batch_outcomes);
        }

        Ok(outcomes)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch: &[ParamsFile],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<Vec<RunOutcome>> {
        let mut handles = Vec::with_capacity(batch.len());

        for (idx, file) in batch.iter().enumerate() {
            let run_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            debug!("[文档 {}] 参数文件: {}", run_index, file.path.display());

            let params = file.params.clone();
            let orchestrator = self.orchestrator.clone();
            let topic_service = self.topic_service.clone();
            let store = self.store.clone();
            let ledger = self.ledger.clone();
            let refine_topic = self.config.refine_topic;

            let handle = tokio::spawn(async move {
                let _permit = permit;
                process_one(
                    run_index,
                    params,
                    refine_topic,
                    &orchestrator,
                    &topic_service,
                    &store,
                    &ledger,
                )
                .await
            });
            handles.push((run_index, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (run_index, result) in futures::future::join_all(
            handles
                .into_iter()
                .map(|(run_index, handle)| async move { (run_index, handle.await) }),
        )
        .await
        {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!("[文档 {}] 任务执行失败: {}", run_index, e);
                    outcomes.push(RunOutcome::Failed);
                }
            }
        }
        Ok(outcomes)
    }

    fn print_stats(&self, outcomes: &[RunOutcome]) {
        let scores: Vec<u32> = outcomes
            .iter()
            .filter_map(|o| match o {
                RunOutcome::Completed { score } => Some(*score),
                _ => None,
            })
            .collect();
        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o, RunOutcome::Skipped))
            .count();
        let failed = outcomes
            .iter()
            .filter(|o| matches!(o, RunOutcome::Failed))
            .count();
        let average = (!scores.is_empty())
            .then(|| scores.iter().map(|s| *s as f64).sum::<f64>() / scores.len() as f64);

        logging::print_final_stats(
            scores.len(),
            failed,
            skipped,
            outcomes.len(),
            average,
            &self.config.output_log_file,
        );
    }
}

/// 生成一份文档：校验 → (润色主题) → 扣额度 → 编排 → 保存 → 评分
async fn process_one(
    run_index: usize,
    mut params: DocumentParameters,
    refine_topic: bool,
    orchestrator: &DocumentOrchestrator,
    topic_service: &TopicService,
    store: &HistoryStore,
    ledger: &CreditLedger,
) -> RunOutcome {
    let label = format!("[文档 {}]", run_index);

    if let Err(e) = validate_parameters(&params) {
        error!("{} ❌ 参数校验失败 ({}): {}", label, e.field(), e);
        return RunOutcome::Failed;
    }

    if refine_topic {
        let verdict = topic_service.check_topic(&params.topic).await;
        if !verdict.is_valid {
            warn!("{} ⚠️ 主题可能不合适: {}", label, verdict.reason);
        }
        let refined = topic_service.refine_topic(&params.topic).await;
        if refined != params.topic {
            let original = std::mem::replace(&mut params.topic, refined);
            match validate_parameters(&params) {
                Ok(()) => info!("{} 💡 主题已润色: {}", label, params.topic),
                Err(e) => {
                    warn!("{} ⚠️ 润色后的主题无效，保留原主题: {}", label, e);
                    params.topic = original;
                }
            }
        }
    }

    match ledger.try_consume() {
        Ok(remaining) => debug!("{} 额度剩余 {}", label, remaining),
        Err(e) => {
            warn!("{} ⏭️ 跳过: {}", label, e);
            return RunOutcome::Skipped;
        }
    }

    let (sink, rx) = EventSink::channel();
    let drain = tokio::spawn(drain_events(label.clone(), rx));
    let result = orchestrator.run(run_index, &params, &sink).await;
    drop(sink);
    if let Err(e) = drain.await {
        debug!("{} 事件日志任务异常结束: {}", label, e);
    }

    let document = match result {
        Ok(document) => document,
        Err(e) => {
            error!("{} ❌ 生成失败: {}", label, e);
            return RunOutcome::Failed;
        }
    };

    let report = quality_service::score(&document);
    logging::log_quality_report(&label, &report);

    match store.save(document).await {
        Ok(saved) => {
            info!(
                "{} 💾 已保存: {} ({})",
                label,
                saved.id.as_deref().unwrap_or_default(),
                store.path().display()
            );
            RunOutcome::Completed {
                score: report.score,
            }
        }
        Err(e) => {
            error!("{} ❌ 保存失败: {}", label, e);
            RunOutcome::Failed
        }
    }
}

/// 把一次运行的事件写进日志，直到发送端关闭
async fn drain_events(label: String, mut rx: UnboundedReceiver<RunEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::Progress(update) => info!(
                "{} [{:>3}%] {} (剩余 {})",
                label, update.percent, update.message, update.time_estimate
            ),
            RunEvent::Partial(document) => debug!(
                "{} 快照: {} 个小节, {} 个来源",
                label,
                document.sections().count(),
                document.source_urls.len()
            ),
            RunEvent::Failed { message } => error!("{} 运行失败: {}", label, message),
        }
    }
}
