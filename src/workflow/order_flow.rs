//! 订单处理流程 - 流程层
//!
//! 核心职责：定义"一个订单"的完整处理流程
//!
//! 流程顺序：
//! 1. 关闭弹窗 → 填写表单 → 提交并确认
//! 2. 提取回执 → 渲染 PDF → 截图 → 合并
//! 3. 点击"再下一单"回到下单页

use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{DocumentRenderer, PageGateway};
use crate::models::OrderRecord;
use crate::services::{OrderFormDriver, ReceiptArtifacts, ReceiptProducer};
use crate::workflow::order_ctx::OrderCtx;
use crate::workflow::page_state::OrderEntry;

/// 订单处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    /// 产物已生成并合并
    Success(ReceiptArtifacts),
    /// 处理失败
    Failure { order_number: String, reason: String },
}

impl OrderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OrderOutcome::Success(_))
    }
}

/// 订单处理流程
///
/// - 编排单个订单的处理步骤
/// - 不持有页面，只借用页面状态
/// - 只依赖业务能力（services）
pub struct OrderFlow {
    driver: OrderFormDriver,
    producer: ReceiptProducer,
}

impl OrderFlow {
    /// 创建新的订单处理流程
    pub fn new(driver: OrderFormDriver, producer: ReceiptProducer) -> Self {
        Self { driver, producer }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            OrderFormDriver::from_config(config),
            ReceiptProducer::from_config(config),
        )
    }

    pub fn driver(&self) -> &OrderFormDriver {
        &self.driver
    }

    pub fn producer(&self) -> &ReceiptProducer {
        &self.producer
    }

    /// 处理一个订单，成功时返回产物和重新回到下单页的页面状态
    ///
    /// 回执合并完成后订单即视为成功；此后"再下一单"失败只返回 `None`，
    /// 由调用方恢复页面。下单或产物生成失败时页面状态未知，同样由调用方负责恢复
    pub async fn run<'p, G, R>(
        &self,
        entry: OrderEntry<'p, G>,
        renderer: &R,
        record: &OrderRecord,
        ctx: &OrderCtx,
    ) -> AppResult<(ReceiptArtifacts, Option<OrderEntry<'p, G>>)>
    where
        G: PageGateway,
        R: DocumentRenderer + ?Sized,
    {
        info!("{} 📝 开始下单: {}", ctx, record);

        // ========== 步骤 1: 下单 ==========
        let confirmed = self.driver.submit_order(entry, record, ctx).await?;
        info!("{} ✓ 订单已确认", ctx);

        // ========== 步骤 2: 产物 ==========
        let artifacts = self.producer.produce(&confirmed, renderer, ctx).await?;

        // ========== 步骤 3: 回到下单页 ==========
        let entry = match self.driver.order_another(confirmed).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(
                    "{} ⚠️ 无法回到下单页: {}",
                    ctx,
                    e.for_order(&ctx.order_number)
                );
                None
            }
        };

        Ok((artifacts, entry))
    }
}
