//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建输出目录、写日志头、启动/连接浏览器
//! 2. **资源管理**：持有 Browser，订单页和渲染页都从这里创建
//! 3. **运行**：下载订单并交给 [`OrderPipeline`]
//! 4. **全局统计**：输出并记录最终结果

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{ChromePage, ChromePdfRenderer};
use crate::orchestrator::pipeline::{OrderPipeline, PipelineReport};
use crate::services::HttpCsvSource;
use crate::utils::logging::{append_run_summary, init_log_file, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    pipeline: OrderPipeline<ChromePage, ChromePdfRenderer>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("无法创建输出目录: {}", config.output_dir.display()))?;

        // 初始化日志文件
        init_log_file(&run_log_path(&config))?;

        log_startup(&config);

        // 启动或连接浏览器
        let browser = browser::open_browser(&config).await?;

        // 订单页（慢速模式在这里统一配置）
        let page = browser
            .new_page("about:blank")
            .await
            .context("创建订单页失败")?;
        let order_page = ChromePage::new(page, Duration::from_millis(config.action_delay_ms));

        // 渲染 PDF 用的独立标签页
        let renderer = ChromePdfRenderer::new(&browser).await?;

        let pipeline = OrderPipeline::new(config.clone(), order_page, renderer);

        Ok(Self {
            config,
            browser,
            pipeline,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<PipelineReport> {
        let source = HttpCsvSource::new(&self.config.orders_url, &self.config.orders_file);

        let report = self
            .pipeline
            .run(&source)
            .await
            .context("订单流水线执行失败")?;

        let log_path = run_log_path(&self.config);
        append_run_summary(&log_path, &report)?;
        print_final_stats(&report, &log_path);

        Ok(report)
    }

    /// 关闭浏览器
    ///
    /// 只关闭自己启动的浏览器，连接的外部浏览器保持打开
    pub async fn shutdown(mut self) -> Result<()> {
        if self.config.browser_debug_port.is_some() {
            return Ok(());
        }
        info!("正在关闭浏览器...");
        if let Err(e) = self.browser.close().await {
            warn!("⚠️ 关闭浏览器失败: {}", e);
        }
        Ok(())
    }
}

fn run_log_path(config: &Config) -> PathBuf {
    config.output_dir.join(&config.run_log_file)
}
