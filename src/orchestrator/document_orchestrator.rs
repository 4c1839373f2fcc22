//! 单份文档编排器 - 编排层
//!
//! ## 职责
//!
//! 按固定顺序驱动一次生成：
//!
//! ```text
//! Planning → FrontMatter → Section(1..N) → BackMatter → Assembling → Done
//!                                  ↘ 任一步出错 → Failed
//! ```
//!
//! - 每个阶段只执行一次，小节按大纲顺序逐个生成，同一次运行内不会并发调用后端
//! - 进入每个阶段时发出进度，内容阶段完成后发出文档快照
//! - 档位在运行开始时由文档类型决定，只影响提示词和参数，不改变阶段顺序
//!
//! 没有取消原语，也没有超时：后端调用挂起时整次运行会一直等待。

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::clients::GenerativeBackend;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{Chapter, Document, DocumentParameters, Outline, Section};
use crate::orchestrator::assembly::build_table_of_contents;
use crate::profile::Profile;
use crate::services::{
    normalize_outline, validate_parameters, MatterService, PlanService, ResilientCaller,
    SectionService,
};
use crate::utils::logging::truncate_text;
use crate::workflow::{EventSink, RunCtx, RunStage};

/// 单份文档编排器
///
/// 不保存任何运行状态，可以被多个独立运行共享。
pub struct DocumentOrchestrator {
    plan_service: PlanService,
    section_service: SectionService,
    matter_service: MatterService,
}

impl DocumentOrchestrator {
    pub fn new(config: &Config, backend: Arc<dyn GenerativeBackend>) -> Self {
        Self::with_caller(ResilientCaller::new(backend), &config.model_name)
    }

    /// 使用指定的调用器（例如自定义重试策略）
    pub fn with_caller(caller: ResilientCaller, model: &str) -> Self {
        Self {
            plan_service: PlanService::new(caller.clone(), model),
            section_service: SectionService::new(caller.clone(), model),
            matter_service: MatterService::new(caller, model),
        }
    }

    /// 只生成大纲，供调用方预览或修改
    pub async fn plan(&self, params: &DocumentParameters) -> AppResult<Outline> {
        validate_parameters(params)?;
        let profile = Profile::for_document(params.document_type);
        self.plan_service.generate_outline(params, profile).await
    }

    /// 完整生成一份文档
    pub async fn run(
        &self,
        run_index: usize,
        params: &DocumentParameters,
        sink: &EventSink,
    ) -> AppResult<Document> {
        self.run_inner(run_index, params, None, sink).await
    }

    /// 使用已确定的大纲生成文档，规划阶段不再调用后端
    ///
    /// 大纲按与后端大纲相同的规则整理（章数上限、编号、缺省小节）。
    pub async fn run_with_outline(
        &self,
        run_index: usize,
        params: &DocumentParameters,
        outline: Outline,
        sink: &EventSink,
    ) -> AppResult<Document> {
        self.run_inner(run_index, params, Some(outline), sink).await
    }

    async fn run_inner(
        &self,
        run_index: usize,
        params: &DocumentParameters,
        outline: Option<Outline>,
        sink: &EventSink,
    ) -> AppResult<Document> {
        if let Err(e) = validate_parameters(params) {
            warn!("[文档 {}] ⚠️ 参数校验失败 ({}): {}", run_index, e.field(), e);
            return Err(e.into());
        }

        let mut ctx = RunCtx::new(run_index, params);
        info!(
            "{} 🚀 开始生成 [{}] {} - {}",
            ctx,
            ctx.profile.name(),
            params.document_type.name(),
            truncate_text(&params.topic, 40)
        );

        match self.execute(&mut ctx, params, outline, sink).await {
            Ok(()) => {
                ctx.finish();
                info!(
                    "{} ✅ 生成完成: {} 个小节, {} 个来源, 耗时 {:.1}s",
                    ctx,
                    ctx.document.sections().count(),
                    ctx.document.source_urls.len(),
                    ctx.document.generation_time_ms as f64 / 1000.0
                );
                Ok(ctx.document)
            }
            Err(e) => {
                let failed_at = ctx.stage();
                ctx.fail();
                error!("{} ❌ 在阶段 {:?} 失败: {}", ctx, failed_at, e);
                sink.failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        ctx: &mut RunCtx,
        params: &DocumentParameters,
        outline: Option<Outline>,
        sink: &EventSink,
    ) -> AppResult<()> {
        let profile = ctx.profile;
        let tuning = profile.tuning();

        // ========== Planning ==========
        sink.progress(ctx.enter(RunStage::Planning, "正在规划大纲..."));
        let outline = match outline {
            Some(outline) => {
                debug!("{} 使用调用方提供的大纲", ctx);
                normalize_outline(outline, profile, params.document_type)
            }
            None => self.plan_service.generate_outline(params, profile).await?,
        };
        let slots = outline.flatten();
        let total = slots.len();
        ctx.set_total_sections(total);

        // ========== FrontMatter ==========
        sink.progress(ctx.enter(RunStage::FrontMatter, "正在撰写引言与结论..."));
        let front = self
            .matter_service
            .generate_front_matter(params, profile)
            .await?;
        front.seed_context(params, profile, &mut ctx.context);
        ctx.document.add_source_urls(front.urls);
        ctx.document.introduction = front.introduction;
        ctx.document.conclusion = front.conclusion;
        ctx.document.references = front.references;
        sink.partial(&ctx.document);

        // ========== Sections ==========
        for (i, slot) in slots.iter().enumerate() {
            let index = i + 1;
            if ctx.document.chapters.len() < slot.chapter_number {
                ctx.document.chapters.push(Chapter {
                    title: slot.chapter_title.to_string(),
                    intro: profile.chapter_intro(slot.chapter_title),
                    sections: Vec::new(),
                });
            }

            let message = format!("{} | {}", slot.chapter_title, slot.section_title);
            sink.progress(ctx.enter(RunStage::Section { index, total }, message));
            info!(
                "{} ✍️ 小节 {}/{}: {}.{} {}",
                ctx, index, total, slot.chapter_number, slot.section_number, slot.section_title
            );

            let draft = self
                .section_service
                .write_section(params, profile, slot, &mut ctx.context)
                .await?;

            ctx.document.add_source_urls(draft.urls);
            if let Some(chapter) = ctx.document.chapters.last_mut() {
                chapter.sections.push(Section {
                    title: slot.section_title.to_string(),
                    content: draft.content,
                });
            }
            sink.partial(&ctx.document);

            if index < total {
                tokio::time::sleep(tuning.pacing).await;
            }
        }

        // ========== BackMatter ==========
        sink.progress(ctx.enter(RunStage::BackMatter, "正在准备附录..."));
        let back = self
            .matter_service
            .generate_back_matter(params, profile)
            .await?;
        ctx.document.add_source_urls(back.urls);
        ctx.document.appendix = back.appendix;
        sink.partial(&ctx.document);

        // ========== Assembling ==========
        ctx.document.table_of_contents = build_table_of_contents(profile, &outline);
        ctx.document.generation_time_ms = ctx.elapsed_ms();
        sink.progress(ctx.enter(RunStage::Assembling, "生成完成"));
        sink.partial(&ctx.document);

        Ok(())
    }
}
