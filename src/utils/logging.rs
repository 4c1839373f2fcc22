//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use std::fs;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{CheckStatus, QualityReport};

/// 初始化 tracing 订阅器
///
/// `RUST_LOG` 优先；否则 `verbose` 时为 debug，默认 info。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n文档生成日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量文档生成模式");
    info!("🤖 后端: {:?} / 模型: {}", config.backend_kind, config.model_name);
    info!("📊 最大并发数: {}", config.max_concurrent_runs);
    info!("💳 初始额度: {}", config.credits);
    info!("{}", "=".repeat(60));
}

/// 记录参数文件加载信息
pub fn log_params_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个待生成的文档", total);
    info!("📋 将以每批 {} 个的方式处理", max_concurrent);
    info!("💡 每批完成后再开始下一批\n");
}

/// 记录批次开始信息
pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批文档: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 成功 {}/{}", batch_num, success, total);
    info!("{}", "─".repeat(60));
}

/// 记录质量报告
pub fn log_quality_report(label: &str, report: &QualityReport) {
    let verdict = if report.passed { "✅ 通过" } else { "⚠️ 未通过" };
    info!("{} 📋 质量评分: {} 分 ({})", label, report.score, verdict);
    for item in &report.items {
        match item.status {
            CheckStatus::Pass => info!("{}   ✓ {}: {}", label, item.label, item.message),
            CheckStatus::Warn | CheckStatus::Fail => warn!(
                "{}   ✗ {}: {} {}",
                label,
                item.label,
                item.message,
                item.recommendation.as_deref().unwrap_or("")
            ),
        }
    }
}

/// 打印最终统计信息
pub fn print_final_stats(
    success: usize,
    failed: usize,
    skipped: usize,
    total: usize,
    average_score: Option<f64>,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("⏭️ 额度不足跳过: {}", skipped);
    if let Some(avg) = average_score {
        info!("📋 平均质量评分: {:.1}", avg);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
