//! 页面能力接口 - 基础设施层
//!
//! 流程层和业务层只通过这个 trait 操作页面，
//! 不直接接触 chromiumoxide，测试时可以替换为内存实现

use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::error::AppResult;

/// 页面元素定位方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// CSS 选择器
    Css(String),
    /// 按钮文字（完全匹配，忽略首尾空白）
    ButtonText(String),
    /// 输入框 placeholder
    Placeholder(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn button(text: impl Into<String>) -> Self {
        Locator::ButtonText(text.into())
    }

    pub fn placeholder(text: impl Into<String>) -> Self {
        Locator::Placeholder(text.into())
    }

    /// 生成在页面中查找该元素的 JS 表达式（找不到时结果为 null）
    pub fn to_js_query(&self) -> String {
        // serde_json 负责字符串转义
        let quoted = |s: &str| serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string());
        match self {
            Locator::Css(selector) => format!("document.querySelector({})", quoted(selector)),
            Locator::ButtonText(text) => format!(
                "Array.from(document.querySelectorAll('button')).find(b => b.textContent.trim() === {}) || null",
                quoted(text)
            ),
            Locator::Placeholder(text) => format!(
                "Array.from(document.querySelectorAll('input, textarea')).find(e => e.getAttribute('placeholder') === {}) || null",
                quoted(text)
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css({})", selector),
            Locator::ButtonText(text) => write!(f, "button('{}')", text),
            Locator::Placeholder(text) => write!(f, "placeholder('{}')", text),
        }
    }
}

/// 浏览器页面能力
///
/// 职责：
/// - 持有（或代理）唯一的当前页面
/// - 只暴露导航、点击、填写、截图等能力
/// - 不认识订单，不处理业务流程
///
/// 找不到元素时返回 `BrowserError::ElementNotFound`
#[async_trait]
pub trait PageGateway: Send + Sync {
    /// 导航到指定 URL
    async fn navigate(&self, url: &str) -> AppResult<()>;

    /// 点击元素
    async fn click(&self, locator: &Locator) -> AppResult<()>;

    /// 在下拉框中按 value 选择选项
    async fn select_option(&self, locator: &Locator, value: &str) -> AppResult<()>;

    /// 填写输入框（覆盖原有内容）
    async fn fill(&self, locator: &Locator, value: &str) -> AppResult<()>;

    /// 元素当前是否存在
    async fn is_present(&self, locator: &Locator) -> AppResult<bool>;

    /// 读取元素的 innerHTML
    async fn inner_html(&self, locator: &Locator) -> AppResult<String>;

    /// 对元素截图并保存为 PNG
    async fn screenshot(&self, locator: &Locator, output: &Path) -> AppResult<()>;
}
