//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::orchestrator::pipeline::PipelineReport;

/// 初始化运行日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &Path) -> AppResult<()> {
    let log_header = format!(
        "{}\n机器人订单处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .map_err(|e| AppError::file_write_failed(log_file_path.display().to_string(), e))
}

/// 把本次运行的结果追加到日志文件
pub fn append_run_summary(log_file_path: &Path, report: &PipelineReport) -> AppResult<()> {
    let write_err = |e| AppError::file_write_failed(log_file_path.display().to_string(), e);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(write_err)?;

    let mut lines = Vec::new();
    for artifacts in &report.succeeded {
        lines.push(format!(
            "成功 | 订单 {} | {}",
            artifacts.order_number,
            artifacts.document.display()
        ));
    }
    for failure in &report.failed {
        lines.push(format!(
            "失败 | 订单 {} | {}",
            failure.order_number, failure.reason
        ));
    }
    lines.push(format!(
        "压缩包 | {} | {} 个文件",
        report.archive.path.display(),
        report.archive.entries.len()
    ));

    file.write_all((lines.join("\n") + "\n").as_bytes())
        .map_err(write_err)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 机器人订单处理");
    info!("🌐 订单页面: {}", config.target_url);
    info!("📁 输出目录: {}", config.output_dir.display());
    info!(
        "🔁 提交重试: 最多 {} 次, 间隔 {} 毫秒",
        config.submit_max_attempts, config.submit_retry_delay_ms
    );
    info!("{}", "=".repeat(60));
}

/// 记录订单加载信息
pub fn log_orders_loaded(total: usize) {
    info!("✓ 找到 {} 个待处理的订单", total);
    info!("💡 订单将按顺序逐个处理\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `report`: 运行结果
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(report: &PipelineReport, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "开始时间: {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    info!(
        "完成时间: {}",
        report.finished_at.format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded.len(), report.total);
    info!("❌ 失败: {}", report.failed.len());
    for failure in &report.failed {
        info!("   - 订单 {}: {}", failure.order_number, failure.reason);
    }
    info!(
        "📦 压缩包: {} ({} 个文件)",
        report.archive.path.display(),
        report.archive.entries.len()
    );
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
