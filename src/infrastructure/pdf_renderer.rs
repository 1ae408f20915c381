//! HTML → PDF 渲染 - 基础设施层

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, Page};
use tracing::debug;

use crate::error::{AppResult, DocumentError};

/// 把 HTML 渲染为 PDF 字节
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// `html` 可以是完整文档，也可以是片段
    async fn render_html(&self, html: &str) -> AppResult<Vec<u8>>;
}

/// 用独立的 Chrome 标签页打印 PDF
///
/// 渲染页与订单页分开，渲染不会改变订单页状态
pub struct ChromePdfRenderer {
    page: Page,
}

impl ChromePdfRenderer {
    /// 在浏览器中新开一个空白标签页用于渲染
    pub async fn new(browser: &Browser) -> AppResult<Self> {
        let page = browser.new_page("about:blank").await?;
        Ok(Self { page })
    }
}

#[async_trait]
impl DocumentRenderer for ChromePdfRenderer {
    async fn render_html(&self, html: &str) -> AppResult<Vec<u8>> {
        debug!("渲染 PDF, HTML 长度: {}", html.len());
        self.page.set_content(wrap_document(html)).await?;

        let params = PrintToPdfParams {
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            ..Default::default()
        };
        let bytes = self.page.pdf(params).await?;

        if bytes.is_empty() {
            return Err(DocumentError::EmptyRender("Chrome 打印结果为空".to_string()).into());
        }
        Ok(bytes)
    }
}

/// 片段补全为带编码声明的完整文档
pub fn wrap_document(html: &str) -> String {
    let trimmed = html.trim_start();
    if trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") {
        return html.to_string();
    }
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>{}</body></html>",
        html
    )
}
