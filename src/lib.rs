//! # Robot Order Submit
//!
//! 一个用于自动化机器人下单的 Rust 应用程序：
//! 逐行读取订单 CSV，在浏览器中填写并提交订单表单，
//! 把回执保存为 PDF 并附上机器人截图，最后把所有回执打包成 zip。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageGateway` - 页面能力接口（导航、点击、填写、截图）
//! - `DocumentRenderer` - HTML → PDF 渲染能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个订单
//! - `OrderFormDriver` - 填写并提交订单表单
//! - `ReceiptProducer` - 生成回执 PDF 和机器人截图
//! - `ArchiveBuilder` - 打包 zip
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个订单"的完整处理流程
//! - `OrderCtx` - 上下文封装（订单号 + 序号）
//! - `OrderFlow` - 流程编排（下单 → 回执 → 再下一单）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 订单流水线，顺序处理全部订单并归档
//! - `orchestrator/app` - 应用入口，管理浏览器资源
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{ArchiveScope, Config, Selectors};
pub use error::{AppError, AppResult};
pub use infrastructure::{DocumentRenderer, Locator, PageGateway};
pub use models::OrderRecord;
pub use orchestrator::{App, OrderPipeline, PipelineReport, PipelineState};
pub use services::{ArchiveBundle, OrderSource, ReceiptArtifacts};
pub use workflow::{OrderCtx, OrderFlow, OrderOutcome};
