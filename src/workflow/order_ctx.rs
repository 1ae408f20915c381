//! 订单处理上下文
//!
//! 封装"我正在处理第几个订单、订单号是什么"这一信息

use std::fmt::Display;

use crate::models::OrderRecord;

/// 订单处理上下文
#[derive(Debug, Clone)]
pub struct OrderCtx {
    /// 订单号
    pub order_number: String,

    /// 产物文件名使用的键
    pub artifact_key: String,

    /// 订单在本次运行中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本次运行的订单总数
    pub total: usize,
}

impl OrderCtx {
    /// 创建新的订单上下文
    pub fn new(record: &OrderRecord, index: usize, total: usize) -> Self {
        Self {
            order_number: record.order_number.clone(),
            artifact_key: record.artifact_key(),
            index,
            total,
        }
    }
}

impl Display for OrderCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[订单 {}/{} 订单号#{}]",
            self.index, self.total, self.order_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctx_display_and_key() {
        let record = OrderRecord::new("A 12", "1", "2", "3", "Street");
        let ctx = OrderCtx::new(&record, 2, 5);

        assert_eq!(ctx.artifact_key, "A_12");
        assert_eq!(ctx.to_string(), "[订单 2/5 订单号#A 12]");
    }
}
