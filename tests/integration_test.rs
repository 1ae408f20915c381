use robot_order_submit::browser::open_browser;
use robot_order_submit::config::Config;
use robot_order_submit::infrastructure::{ChromePdfRenderer, DocumentRenderer};
use robot_order_submit::logger;
use robot_order_submit::orchestrator::App;
use robot_order_submit::services::{HttpCsvSource, OrderSource};

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_full_run_against_live_site() {
    // 初始化日志
    logger::init();

    // 输出到临时目录
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        output_dir: dir.path().join("output"),
        orders_file: dir.path().join("orders.csv"),
        ..Config::from_env().expect("加载配置失败")
    };

    let mut app = App::initialize(config).await.expect("初始化失败");
    let report = app.run().await.expect("运行失败");
    app.shutdown().await.expect("关闭浏览器失败");

    assert_eq!(report.succeeded.len(), report.total, "所有订单都应该成功");
    assert_eq!(report.archive.entries.len(), report.total);
}

#[tokio::test]
#[ignore]
async fn test_download_orders() {
    // 初始化日志
    logger::init();

    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_env().expect("加载配置失败");

    let source = HttpCsvSource::new(&config.orders_url, dir.path().join("orders.csv"));
    let orders = source.fetch_orders().await.expect("下载订单失败");

    assert!(!orders.is_empty(), "订单列表不应为空");
    println!("共 {} 个订单", orders.len());
}

#[tokio::test]
#[ignore]
async fn test_render_pdf_with_browser() {
    // 初始化日志
    logger::init();

    let config = Config::from_env().expect("加载配置失败");
    let browser = open_browser(&config).await.expect("打开浏览器失败");

    let renderer = ChromePdfRenderer::new(&browser).await.expect("创建渲染页失败");
    let bytes = renderer
        .render_html("<h3>Receipt</h3>")
        .await
        .expect("渲染失败");

    assert!(bytes.starts_with(b"%PDF"), "渲染结果应该是 PDF");
}
