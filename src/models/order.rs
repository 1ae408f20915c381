use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::SourceError;

/// 一行订单数据
///
/// 对应 CSV 表头 `Order number,Head,Body,Legs,Address`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderRecord {
    /// 订单号，所有产物都以它命名
    #[serde(rename = "Order number")]
    pub order_number: String,

    /// 头部型号（下拉框 value）
    #[serde(rename = "Head")]
    pub head: String,

    /// 身体型号（单选框 id 后缀）
    #[serde(rename = "Body")]
    pub body: String,

    /// 腿部零件号（自由文本）
    #[serde(rename = "Legs")]
    pub legs: String,

    /// 收货地址
    #[serde(rename = "Address")]
    pub address: String,
}

impl OrderRecord {
    pub fn new(
        order_number: impl Into<String>,
        head: impl Into<String>,
        body: impl Into<String>,
        legs: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            order_number: order_number.into(),
            head: head.into(),
            body: body.into(),
            legs: legs.into(),
            address: address.into(),
        }
    }

    /// 检查必填字段，`row` 为数据行号（从 1 开始，仅用于报错）
    pub fn validate(&self, row: usize) -> Result<(), SourceError> {
        let fields = [
            ("Order number", &self.order_number),
            ("Head", &self.head),
            ("Body", &self.body),
            ("Legs", &self.legs),
            ("Address", &self.address),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(SourceError::MissingField { row, field });
            }
        }
        Ok(())
    }

    /// 用于文件名的订单键，非 `[A-Za-z0-9_-]` 字符替换为 `_`
    pub fn artifact_key(&self) -> String {
        artifact_key(&self.order_number)
    }
}

impl fmt::Display for OrderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "订单#{} (head={}, body={}, legs={})",
            self.order_number, self.head, self.body, self.legs
        )
    }
}

/// 把订单号转换为可以安全用作文件名的键
pub fn artifact_key(order_number: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]").expect("静态正则表达式"));
    re.replace_all(order_number.trim(), "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_key_keeps_plain_ids() {
        assert_eq!(artifact_key("17"), "17");
        assert_eq!(artifact_key(" A-7_b "), "A-7_b");
    }

    #[test]
    fn test_artifact_key_replaces_path_chars() {
        assert_eq!(artifact_key("../etc/passwd"), "___etc_passwd");
        assert_eq!(artifact_key("12 34"), "12_34");
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let record = OrderRecord::new("5", "1", "", "3", "Street 1");
        match record.validate(5) {
            Err(SourceError::MissingField { row, field }) => {
                assert_eq!(row, 5);
                assert_eq!(field, "Body");
            }
            other => panic!("应为 MissingField, 实际: {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_complete_record() {
        let record = OrderRecord::new("1", "2", "3", "4", "Random Street 1");
        assert!(record.validate(1).is_ok());
        assert_eq!(record.artifact_key(), "1");
    }
}
