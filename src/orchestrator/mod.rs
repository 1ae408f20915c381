//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责按顺序调度订单并在最后归档，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行、关闭）
//! - 管理浏览器资源（Browser、订单页、渲染页）
//! - 输出全局统计信息
//!
//! ### `pipeline` - 订单流水线
//! - 打开订单页、获取订单列表
//! - 逐个调用 `OrderFlow`，收集成功/失败结果
//! - 失败后恢复订单页
//! - 生成压缩包
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 Browser)
//!     ↓
//! pipeline (处理 Vec<OrderRecord>)
//!     ↓
//! workflow::OrderFlow (处理单个订单)
//!     ↓
//! services (能力层：表单 / 回执 / 文档 / 归档)
//!     ↓
//! infrastructure (基础设施：PageGateway / DocumentRenderer)
//! ```

pub mod app;
pub mod pipeline;

// 重新导出主要类型
pub use app::App;
pub use pipeline::{OrderFailure, OrderPipeline, PipelineReport, PipelineState};
