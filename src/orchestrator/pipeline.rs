//! 订单流水线 - 编排层
//!
//! ## 职责
//!
//! 按顺序处理订单列表中的每个订单，最后打包回执。
//!
//! ## 状态
//!
//! ```text
//! NotStarted → Navigated → ProcessingOrder(0) → … → ProcessingOrder(n-1) → Archiving → Done
//!                  └──────────────（订单列表为空）──────────────────────────┘
//! ```
//!
//! ## 设计特点
//!
//! - **严格顺序**：上一个订单的 PDF 合并并关闭之后才开始下一个订单
//! - **失败隔离**：单个订单失败记为 `Failure`，重新打开订单页后继续；
//!   `abort_on_failure` 打开时第一个失败直接终止整次运行
//! - **回执优先**：回执合并完成即算成功，之后回不到下单页只触发页面恢复
//! - **清单归档**：默认只打包本次运行生成的回执

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::config::{ArchiveScope, Config};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{DocumentRenderer, PageGateway};
use crate::services::{scan_documents, ArchiveBuilder, ArchiveBundle, OrderSource, ReceiptArtifacts};
use crate::utils::logging::log_orders_loaded;
use crate::workflow::{OrderCtx, OrderEntry, OrderFlow, OrderOutcome};

/// 流水线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    Navigated,
    /// 正在处理第 i 个订单（从 0 开始）
    ProcessingOrder(usize),
    Archiving,
    Done,
}

impl PipelineState {
    /// 是否允许迁移到 `next`
    pub fn can_advance_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (*self, next) {
            (NotStarted, Navigated) => true,
            (Navigated, ProcessingOrder(0)) | (Navigated, Archiving) => true,
            (ProcessingOrder(i), ProcessingOrder(j)) => j == i + 1,
            (ProcessingOrder(_), Archiving) => true,
            (Archiving, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::NotStarted => write!(f, "NotStarted"),
            PipelineState::Navigated => write!(f, "Navigated"),
            PipelineState::ProcessingOrder(i) => write!(f, "ProcessingOrder({})", i),
            PipelineState::Archiving => write!(f, "Archiving"),
            PipelineState::Done => write!(f, "Done"),
        }
    }
}

/// 失败的订单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFailure {
    pub order_number: String,
    pub reason: String,
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// 订单总数
    pub total: usize,
    pub succeeded: Vec<ReceiptArtifacts>,
    pub failed: Vec<OrderFailure>,
    pub archive: ArchiveBundle,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl PipelineReport {
    /// 全部处理结果（成功在前，失败在后）
    pub fn outcomes(&self) -> Vec<OrderOutcome> {
        let mut outcomes: Vec<OrderOutcome> = self
            .succeeded
            .iter()
            .cloned()
            .map(OrderOutcome::Success)
            .collect();
        outcomes.extend(self.failed.iter().map(|f| OrderOutcome::Failure {
            order_number: f.order_number.clone(),
            reason: f.reason.clone(),
        }));
        outcomes
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 订单流水线
///
/// 持有页面和渲染器，是唯一会修改页面状态的地方
pub struct OrderPipeline<G: PageGateway, R: DocumentRenderer> {
    config: Config,
    page: G,
    renderer: R,
    flow: OrderFlow,
    state: PipelineState,
}

impl<G: PageGateway, R: DocumentRenderer> OrderPipeline<G, R> {
    pub fn new(config: Config, page: G, renderer: R) -> Self {
        let flow = OrderFlow::from_config(&config);
        Self {
            config,
            page,
            renderer,
            flow,
            state: PipelineState::NotStarted,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn page(&self) -> &G {
        &self.page
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行整条流水线，每个实例只能运行一次
    pub async fn run<S: OrderSource + ?Sized>(&mut self, source: &S) -> AppResult<PipelineReport> {
        let started_at = Local::now();
        let Self {
            config,
            page,
            renderer,
            flow,
            state,
        } = self;
        let page: &G = page;

        if *state != PipelineState::NotStarted {
            return Err(AppError::InvalidState {
                from: state.to_string(),
                to: PipelineState::Navigated.to_string(),
            });
        }

        // ========== 打开订单页 ==========
        std::fs::create_dir_all(&config.output_dir).map_err(|e| {
            AppError::file_write_failed(config.output_dir.display().to_string(), e)
        })?;
        info!("🌐 正在打开订单页面: {}", config.target_url);
        page.navigate(&config.target_url).await?;
        advance(state, PipelineState::Navigated)?;

        // ========== 获取订单 ==========
        let orders = source.fetch_orders().await?;
        let total = orders.len();
        log_orders_loaded(total);

        // ========== 逐个处理 ==========
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let mut entry = Some(OrderEntry::assume(page));

        for (index, record) in orders.iter().enumerate() {
            advance(state, PipelineState::ProcessingOrder(index))?;
            let ctx = OrderCtx::new(record, index + 1, total);
            info!("\n{} {}", ctx, "─".repeat(30));

            let Some(current) = entry.take() else {
                warn!("{} ⚠️ 浏览器会话已不可用，跳过", ctx);
                failed.push(OrderFailure {
                    order_number: ctx.order_number.clone(),
                    reason: "浏览器会话无法恢复，订单未处理".to_string(),
                });
                continue;
            };

            match flow.run(current, &*renderer, record, &ctx).await {
                Ok((artifacts, next)) => {
                    info!("{} ✅ 订单处理完成", ctx);
                    succeeded.push(artifacts);
                    entry = match next {
                        Some(next) => Some(next),
                        None => recover(page, &config.target_url, &ctx).await,
                    };
                }
                Err(e) => {
                    error!("{} ❌ 订单处理失败: {}", ctx, e);
                    if config.abort_on_failure {
                        return Err(e);
                    }
                    failed.push(OrderFailure {
                        order_number: ctx.order_number.clone(),
                        reason: e.to_string(),
                    });
                    entry = recover(page, &config.target_url, &ctx).await;
                }
            }
        }

        // ========== 归档 ==========
        advance(state, PipelineState::Archiving)?;
        let archive = build_archive(config, &succeeded)?;
        advance(state, PipelineState::Done)?;

        Ok(PipelineReport {
            total,
            succeeded,
            failed,
            archive,
            started_at,
            finished_at: Local::now(),
        })
    }
}

/// 校验并执行状态迁移
fn advance(state: &mut PipelineState, next: PipelineState) -> AppResult<()> {
    if !state.can_advance_to(next) {
        return Err(AppError::InvalidState {
            from: state.to_string(),
            to: next.to_string(),
        });
    }
    tracing::debug!("流水线状态: {} → {}", state, next);
    *state = next;
    Ok(())
}

/// 订单失败后重新打开订单页，恢复"下单视图"前置条件
///
/// 恢复失败时返回 None，后续订单不再处理
async fn recover<'p, G: PageGateway>(
    page: &'p G,
    target_url: &str,
    ctx: &OrderCtx,
) -> Option<OrderEntry<'p, G>> {
    info!("{} 🔄 重新打开订单页面...", ctx);
    match page.navigate(target_url).await {
        Ok(()) => Some(OrderEntry::assume(page)),
        Err(e) => {
            error!("{} ❌ 无法重新打开订单页面: {}", ctx, e);
            None
        }
    }
}

/// 按配置的归档范围生成压缩包
fn build_archive(config: &Config, succeeded: &[ReceiptArtifacts]) -> AppResult<ArchiveBundle> {
    info!("📦 正在打包回执...");
    let builder = ArchiveBuilder::new(config.archive_path());
    let produced: Vec<PathBuf> = succeeded.iter().map(|a| a.document.clone()).collect();

    match config.archive_scope {
        ArchiveScope::Manifest => builder.build_from_manifest(&produced),
        ArchiveScope::Directory => {
            for stale in find_stale_documents(&config.output_dir, &produced)? {
                warn!(
                    "⚠️ 输出目录中存在非本次运行生成的回执，将一并打包: {}",
                    stale.display()
                );
            }
            builder.build_from_directory(&config.output_dir)
        }
    }
}

/// 目录中不属于本次运行的 PDF
pub fn find_stale_documents(output_dir: &Path, produced: &[PathBuf]) -> AppResult<Vec<PathBuf>> {
    let produced_names: HashSet<_> = produced.iter().filter_map(|p| p.file_name()).collect();
    Ok(scan_documents(output_dir)?
        .into_iter()
        .filter(|p| p.file_name().map_or(true, |n| !produced_names.contains(n)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        use PipelineState::*;

        assert!(NotStarted.can_advance_to(Navigated));
        assert!(Navigated.can_advance_to(ProcessingOrder(0)));
        assert!(Navigated.can_advance_to(Archiving));
        assert!(ProcessingOrder(0).can_advance_to(ProcessingOrder(1)));
        assert!(ProcessingOrder(4).can_advance_to(Archiving));
        assert!(Archiving.can_advance_to(Done));

        assert!(!NotStarted.can_advance_to(ProcessingOrder(0)));
        assert!(!Navigated.can_advance_to(ProcessingOrder(1)));
        assert!(!ProcessingOrder(1).can_advance_to(ProcessingOrder(3)));
        assert!(!ProcessingOrder(1).can_advance_to(Done));
        assert!(!Done.can_advance_to(Navigated));
    }

    #[test]
    fn test_advance_rejects_skipping() {
        let mut state = PipelineState::Navigated;
        let err = advance(&mut state, PipelineState::Done).unwrap_err();

        assert!(err.to_string().contains("Navigated"));
        assert_eq!(state, PipelineState::Navigated);
    }

    #[test]
    fn test_find_stale_documents() {
        let dir = tempfile::tempdir().unwrap();
        let produced = dir.path().join("receipt-1.pdf");
        std::fs::write(&produced, b"%PDF").unwrap();
        std::fs::write(dir.path().join("receipt-OLD.pdf"), b"%PDF").unwrap();

        let stale = find_stale_documents(dir.path(), &[produced]).unwrap();

        assert_eq!(stale, vec![dir.path().join("receipt-OLD.pdf")]);
    }
}
