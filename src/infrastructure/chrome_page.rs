//! Chrome 页面 - 基础设施层
//!
//! 持有唯一的 page 资源，用 JS 实现 [`PageGateway`] 的各项能力

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::page_gateway::{Locator, PageGateway};

/// 截图前临时打在目标元素上的属性
const CAPTURE_ATTR: &str = "data-robot-capture";

/// 等待元素内图片加载完成的最大轮询次数
const IMAGE_WAIT_ROUNDS: usize = 20;

/// Chrome 页面
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 每次操作后等待 `action_delay`（慢速模式）
/// - 不认识订单，不处理业务流程
pub struct ChromePage {
    page: Page,
    action_delay: Duration,
}

impl ChromePage {
    /// 创建新的页面包装，`action_delay` 为每次操作后的等待时间
    pub fn new(page: Page, action_delay: Duration) -> Self {
        Self { page, action_delay }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 找到元素后执行 `body`，元素不存在时返回 ElementNotFound
    ///
    /// `body` 中可以使用变量 `el`
    async fn with_element(&self, locator: &Locator, body: &str) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const el = {};
                if (!el) return false;
                {}
                return true;
            }})()
            "#,
            locator.to_js_query(),
            body
        );

        let found: bool = self.eval_as(js_code).await?;
        if !found {
            return Err(AppError::element_not_found(locator.to_string()));
        }
        self.slow_down().await;
        Ok(())
    }

    async fn slow_down(&self) {
        if !self.action_delay.is_zero() {
            sleep(self.action_delay).await;
        }
    }

    /// 等待元素内的图片全部加载完成
    async fn wait_for_images(&self, locator: &Locator) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const el = {};
                if (!el) return true;
                const imgs = el.tagName === 'IMG' ? [el] : Array.from(el.querySelectorAll('img'));
                return imgs.every(img => img.complete && img.naturalWidth > 0);
            }})()
            "#,
            locator.to_js_query()
        );

        for _ in 0..IMAGE_WAIT_ROUNDS {
            let loaded: bool = self.eval_as(js_code.as_str()).await?;
            if loaded {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        warn!("⚠️ 图片未在预期时间内加载完成: {}", locator);
        Ok(())
    }
}

#[async_trait]
impl PageGateway for ChromePage {
    async fn navigate(&self, url: &str) -> AppResult<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|source| BrowserError::NavigationFailed {
                url: url.to_string(),
                source,
            })?;
        self.slow_down().await;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> AppResult<()> {
        debug!("点击: {}", locator);
        self.with_element(locator, "el.scrollIntoView({ block: 'center' }); el.click();")
            .await
    }

    async fn select_option(&self, locator: &Locator, value: &str) -> AppResult<()> {
        debug!("选择: {} = {}", locator, value);
        // React 受控组件需要走原生 setter 并派发 change 事件
        let body = format!(
            r#"
            const setter = Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, 'value').set;
            setter.call(el, {});
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            "#,
            serde_json::to_string(value)?
        );
        self.with_element(locator, &body).await
    }

    async fn fill(&self, locator: &Locator, value: &str) -> AppResult<()> {
        debug!("填写: {} = {}", locator, value);
        let body = format!(
            r#"
            const proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
            const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
            el.focus();
            setter.call(el, {});
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            "#,
            serde_json::to_string(value)?
        );
        self.with_element(locator, &body).await
    }

    async fn is_present(&self, locator: &Locator) -> AppResult<bool> {
        let js_code = format!("({}) !== null", locator.to_js_query());
        self.eval_as(js_code).await
    }

    async fn inner_html(&self, locator: &Locator) -> AppResult<String> {
        let js_code = format!(
            r#"
            (() => {{
                const el = {};
                return el ? el.innerHTML : null;
            }})()
            "#,
            locator.to_js_query()
        );

        let html: Option<String> = self.eval_as(js_code).await?;
        html.ok_or_else(|| AppError::element_not_found(locator.to_string()))
    }

    async fn screenshot(&self, locator: &Locator, output: &Path) -> AppResult<()> {
        debug!("截图: {} -> {}", locator, output.display());
        self.wait_for_images(locator).await?;

        // 先给目标元素打标记，再用 CSS 选择器拿到元素句柄
        self.with_element(
            locator,
            &format!("el.setAttribute('{}', '1'); el.scrollIntoView({{ block: 'center' }});", CAPTURE_ATTR),
        )
        .await?;

        let marker = format!("[{}=\"1\"]", CAPTURE_ATTR);
        let element = self.page.find_element(marker.as_str()).await?;
        element
            .save_screenshot(CaptureScreenshotFormat::Png, output)
            .await?;

        self.eval(format!(
            "(() => {{ document.querySelectorAll('[{attr}]').forEach(e => e.removeAttribute('{attr}')); return true; }})()",
            attr = CAPTURE_ATTR
        ))
        .await?;
        Ok(())
    }
}
