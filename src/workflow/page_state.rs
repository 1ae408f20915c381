//! 页面状态 - 流程层
//!
//! 把"当前页面处于哪个视图"编码进类型：
//!
//! ```text
//! OrderEntry ──fill_form──▶ FilledForm ──submit──▶ Confirmed ──order_another──▶ OrderEntry
//! ```
//!
//! `FilledForm` 和 `Confirmed` 只能由 [`OrderFormDriver`](crate::services::OrderFormDriver)
//! 构造，因此不可能在提交之前生成回执，也不可能在回执页上重复填写表单。
//! 所有状态都只借用同一个页面，同一时刻只有一个状态值存在。

use crate::infrastructure::PageGateway;

/// 下单视图：表单可填写
pub struct OrderEntry<'p, G: PageGateway> {
    page: &'p G,
}

impl<'p, G: PageGateway> OrderEntry<'p, G> {
    /// 声明页面当前处于下单视图
    ///
    /// 只应在导航到订单页之后调用
    pub fn assume(page: &'p G) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &'p G {
        self.page
    }
}

/// 表单已填写，尚未提交成功
pub struct FilledForm<'p, G: PageGateway> {
    page: &'p G,
}

impl<'p, G: PageGateway> FilledForm<'p, G> {
    pub(crate) fn new(page: &'p G) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &'p G {
        self.page
    }
}

/// 回执视图：订单已确认
pub struct Confirmed<'p, G: PageGateway> {
    page: &'p G,
}

impl<'p, G: PageGateway> Confirmed<'p, G> {
    pub(crate) fn new(page: &'p G) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &'p G {
        self.page
    }
}
