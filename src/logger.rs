//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化全局日志（RUST_LOG 优先，默认 info）
///
/// 重复调用时静默忽略，方便测试中多次初始化
pub fn init() {
    init_with_verbose(false);
}

/// 初始化全局日志，`verbose` 为 true 时默认级别为 debug
pub fn init_with_verbose(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("robot_order_submit={},warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
