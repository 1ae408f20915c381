//! 回执产物生成 - 业务能力层
//!
//! 在回执视图上依次完成：提取回执 HTML → 渲染 PDF → 机器人截图 → 截图并入 PDF

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{Config, Selectors};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{DocumentRenderer, Locator, PageGateway};
use crate::services::document::ReceiptDocument;
use crate::utils::logging::truncate_text;
use crate::workflow::order_ctx::OrderCtx;
use crate::workflow::page_state::Confirmed;

/// 单个订单的产物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptArtifacts {
    pub order_number: String,
    /// 合并后的回执 PDF（回执页在前，机器人图片页在后）
    pub document: PathBuf,
    /// 机器人截图
    pub image: PathBuf,
}

/// 回执产物生成器
///
/// 职责：
/// - 只在回执视图上工作（需要 `Confirmed`）
/// - 产物按订单键确定性命名：`receipt-<key>.pdf` / `robot-<key>.png`
/// - 返回前关闭 PDF，保证后续归档能读取
pub struct ReceiptProducer {
    output_dir: PathBuf,
    receipt: Locator,
    robot_preview: Locator,
}

impl ReceiptProducer {
    pub fn new(output_dir: impl Into<PathBuf>, selectors: &Selectors) -> Self {
        Self {
            output_dir: output_dir.into(),
            receipt: Locator::css(&selectors.receipt),
            robot_preview: Locator::css(&selectors.robot_preview),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.output_dir, &config.selectors)
    }

    /// 回执 PDF 路径
    pub fn receipt_path(&self, artifact_key: &str) -> PathBuf {
        receipt_path(&self.output_dir, artifact_key)
    }

    /// 机器人截图路径
    pub fn robot_path(&self, artifact_key: &str) -> PathBuf {
        self.output_dir.join(format!("robot-{}.png", artifact_key))
    }

    /// 生成并合并单个订单的产物
    ///
    /// 合并完成前回执写在 `.partial` 暂存文件中，成功后才改名为最终文件名；
    /// 任何一步失败都会删除本订单已写出的暂存文件和截图
    pub async fn produce<G, R>(
        &self,
        confirmed: &Confirmed<'_, G>,
        renderer: &R,
        ctx: &OrderCtx,
    ) -> AppResult<ReceiptArtifacts>
    where
        G: PageGateway,
        R: DocumentRenderer + ?Sized,
    {
        let document_path = self.receipt_path(&ctx.artifact_key);
        let staging = staging_path(&document_path);
        let image_path = self.robot_path(&ctx.artifact_key);

        let page_count = match self
            .render_and_merge(confirmed.page(), renderer, ctx, &staging, &image_path)
            .await
        {
            Ok(page_count) => page_count,
            Err(e) => {
                discard_partial(&[staging.as_path(), image_path.as_path()]);
                return Err(e);
            }
        };

        if let Err(e) = std::fs::rename(&staging, &document_path) {
            discard_partial(&[staging.as_path(), image_path.as_path()]);
            return Err(AppError::file_write_failed(
                document_path.display().to_string(),
                e,
            ));
        }

        info!(
            "{} 📄 回执已生成: {} (共 {} 页)",
            ctx,
            document_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy(),
            page_count
        );

        Ok(ReceiptArtifacts {
            order_number: ctx.order_number.clone(),
            document: document_path,
            image: image_path,
        })
    }

    /// 写出回执到 `staging`、截图、合并，返回合并后的页数
    async fn render_and_merge<G, R>(
        &self,
        page: &G,
        renderer: &R,
        ctx: &OrderCtx,
        staging: &Path,
        image_path: &Path,
    ) -> AppResult<usize>
    where
        G: PageGateway,
        R: DocumentRenderer + ?Sized,
    {
        // 1. 回执 HTML → PDF
        let receipt_html = page
            .inner_html(&self.receipt)
            .await
            .map_err(|e| e.for_order(&ctx.order_number))?;
        debug!("{} 回执内容: {}", ctx, truncate_text(&receipt_html, 80));

        let pdf_bytes = renderer.render_html(&receipt_html).await?;
        ReceiptDocument::create(staging, &pdf_bytes)?;
        debug!("{} ✓ 回执已渲染: {}", ctx, staging.display());

        // 2. 机器人截图
        page.screenshot(&self.robot_preview, image_path)
            .await
            .map_err(|e| e.for_order(&ctx.order_number))?;
        debug!("{} ✓ 截图已保存: {}", ctx, image_path.display());

        // 3. 截图追加为回执最后一页，save 后文档即关闭
        let mut document = ReceiptDocument::open(staging)?;
        document
            .append_images(&[image_path.to_path_buf()], renderer)
            .await?;
        let page_count = document.page_count();
        document.save()?;
        Ok(page_count)
    }
}

/// 合并完成前使用的暂存路径（扩展名不是 pdf，不会被目录扫描打包）
fn staging_path(document_path: &Path) -> PathBuf {
    let mut name = document_path.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

/// 删除失败订单留下的文件
fn discard_partial(paths: &[&Path]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("已删除未完成的产物: {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("⚠️ 无法删除未完成的产物 {}: {}", path.display(), e),
        }
    }
}

/// 回执 PDF 的确定性路径
pub fn receipt_path(output_dir: &Path, artifact_key: &str) -> PathBuf {
    output_dir.join(format!("receipt-{}.pdf", artifact_key))
}
