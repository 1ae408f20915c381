use anyhow::{bail, Result};
use robot_order_submit::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logger::init_with_verbose(config.verbose_logging);

    // 初始化并运行应用
    let mut app = App::initialize(config).await?;
    let result = app.run().await;
    app.shutdown().await?;

    let report = result?;
    if !report.all_succeeded() {
        bail!(
            "{} 个订单处理失败（共 {} 个），已成功的回执已打包",
            report.failed.len(),
            report.total
        );
    }

    Ok(())
}
