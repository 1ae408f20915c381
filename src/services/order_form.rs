//! 订单表单驱动 - 业务能力层
//!
//! 只负责"把一个订单填进表单并提交到出现回执"，不关心产物和批量流程

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Config, Selectors};
use crate::error::{AppResult, OrderError};
use crate::infrastructure::{Locator, PageGateway};
use crate::models::OrderRecord;
use crate::workflow::order_ctx::OrderCtx;
use crate::workflow::page_state::{Confirmed, FilledForm, OrderEntry};

/// 提交重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitPolicy {
    /// 最多"提交并检查回执"的次数（至少 1）
    pub max_attempts: u32,
    /// 两次提交之间的等待
    pub retry_delay: Duration,
}

impl SubmitPolicy {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.submit_max_attempts,
            Duration::from_millis(config.submit_retry_delay_ms),
        )
    }
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self::new(20, Duration::from_millis(250))
    }
}

/// 订单表单驱动
///
/// 职责：
/// - 关闭遮挡表单的弹窗
/// - 按固定顺序填写 head → body → legs → address
/// - 提交并轮询回执，直到确认成功或重试耗尽
/// - 从回执页返回下单页
pub struct OrderFormDriver {
    selectors: Selectors,
    policy: SubmitPolicy,
}

impl OrderFormDriver {
    /// 创建新的表单驱动
    pub fn new(selectors: Selectors, policy: SubmitPolicy) -> Self {
        Self { selectors, policy }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.selectors.clone(), SubmitPolicy::from_config(config))
    }

    pub fn policy(&self) -> SubmitPolicy {
        self.policy
    }

    /// 如果弹窗存在则点击确认按钮关闭
    ///
    /// 没有弹窗时什么也不做，可重复调用。返回是否点击了按钮
    pub async fn dismiss_dialog<G: PageGateway>(&self, entry: &OrderEntry<'_, G>) -> AppResult<bool> {
        let ok_button = Locator::button(&self.selectors.modal_ok_text);
        let page = entry.page();

        if !page.is_present(&ok_button).await? {
            debug!("未发现弹窗，跳过");
            return Ok(false);
        }

        page.click(&ok_button).await?;
        debug!("✓ 已关闭弹窗");
        Ok(true)
    }

    /// 填写表单
    pub async fn fill_form<'p, G: PageGateway>(
        &self,
        entry: OrderEntry<'p, G>,
        record: &OrderRecord,
    ) -> AppResult<FilledForm<'p, G>> {
        let page = entry.page();
        let tag = |e: crate::error::AppError| e.for_order(&record.order_number);

        page.select_option(&Locator::css(&self.selectors.head_select), &record.head)
            .await
            .map_err(tag)?;

        let body_radio = format!("{}{}", self.selectors.body_radio_prefix, record.body);
        page.click(&Locator::css(body_radio)).await.map_err(tag)?;

        page.fill(&Locator::placeholder(&self.selectors.legs_placeholder), &record.legs)
            .await
            .map_err(tag)?;

        page.fill(&Locator::css(&self.selectors.address_input), &record.address)
            .await
            .map_err(tag)?;

        Ok(FilledForm::new(page))
    }

    /// 提交订单并等待回执出现
    ///
    /// 每一轮：点击提交 → 检查回执。第 k 轮看到回执即返回，不会多提交
    pub async fn submit<'p, G: PageGateway>(
        &self,
        form: FilledForm<'p, G>,
        ctx: &OrderCtx,
    ) -> AppResult<Confirmed<'p, G>> {
        let page = form.page();
        let order_button = Locator::button(&self.selectors.order_button_text);
        let receipt = Locator::css(&self.selectors.receipt);

        for attempt in 1..=self.policy.max_attempts {
            page.click(&order_button)
                .await
                .map_err(|e| e.for_order(&ctx.order_number))?;

            if page.is_present(&receipt).await? {
                if attempt > 1 {
                    info!("{} ✓ 第 {} 次提交成功", ctx, attempt);
                } else {
                    debug!("{} ✓ 提交成功", ctx);
                }
                return Ok(Confirmed::new(page));
            }

            warn!(
                "{} ⚠️ 未出现回执 (尝试 {}/{})",
                ctx, attempt, self.policy.max_attempts
            );
            if attempt < self.policy.max_attempts && !self.policy.retry_delay.is_zero() {
                sleep(self.policy.retry_delay).await;
            }
        }

        Err(OrderError::SubmissionFailed {
            order_number: ctx.order_number.clone(),
            attempts: self.policy.max_attempts,
        }
        .into())
    }

    /// 完整的下单步骤：关闭弹窗 → 填写 → 提交确认
    pub async fn submit_order<'p, G: PageGateway>(
        &self,
        entry: OrderEntry<'p, G>,
        record: &OrderRecord,
        ctx: &OrderCtx,
    ) -> AppResult<Confirmed<'p, G>> {
        if self.dismiss_dialog(&entry).await? {
            debug!("{} 已关闭弹窗", ctx);
        }
        let form = self.fill_form(entry, record).await?;
        self.submit(form, ctx).await
    }

    /// 从回执页回到下单页
    pub async fn order_another<'p, G: PageGateway>(
        &self,
        confirmed: Confirmed<'p, G>,
    ) -> AppResult<OrderEntry<'p, G>> {
        let page = confirmed.page();
        page.click(&Locator::button(&self.selectors.order_another_text))
            .await?;
        Ok(OrderEntry::assume(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_has_at_least_one_attempt() {
        let policy = SubmitPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_policy_from_config() {
        let config = Config {
            submit_max_attempts: 7,
            submit_retry_delay_ms: 40,
            ..Config::default()
        };
        let policy = SubmitPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 7);
        assert_eq!(policy.retry_delay, Duration::from_millis(40));
    }
}
