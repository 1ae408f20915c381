use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigError, AppResult};

/// 归档范围
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveScope {
    /// 只归档本次运行成功生成的回执
    #[default]
    Manifest,
    /// 扫描输出目录下所有 PDF（会包含历史运行遗留的文件）
    Directory,
}

impl std::str::FromStr for ArchiveScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manifest" => Ok(Self::Manifest),
            "directory" => Ok(Self::Directory),
            other => Err(format!("未知的归档范围: {}", other)),
        }
    }
}

/// 订单页面上用到的选择器
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// 弹窗确认按钮文字
    pub modal_ok_text: String,
    pub head_select: String,
    /// 身体部件单选框 id 前缀，后接订单中的 body 值
    pub body_radio_prefix: String,
    pub legs_placeholder: String,
    pub address_input: String,
    pub order_button_text: String,
    pub receipt: String,
    pub robot_preview: String,
    pub order_another_text: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            modal_ok_text: "OK".to_string(),
            head_select: "#head".to_string(),
            body_radio_prefix: "#id-body-".to_string(),
            legs_placeholder: "Enter the part number for the legs".to_string(),
            address_input: "#address".to_string(),
            order_button_text: "Order".to_string(),
            receipt: "#receipt".to_string(),
            robot_preview: "#robot-preview-image".to_string(),
            order_another_text: "Order another robot".to_string(),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 订单页面 URL
    pub target_url: String,
    /// 订单 CSV 下载地址
    pub orders_url: String,
    /// 订单 CSV 本地保存路径
    pub orders_file: PathBuf,
    /// 输出目录（回执、截图、压缩包）
    pub output_dir: PathBuf,
    /// 压缩包文件名
    pub archive_name: String,
    pub archive_scope: ArchiveScope,
    /// 浏览器调试端口，设置后连接已有浏览器，否则启动无头浏览器
    pub browser_debug_port: Option<u16>,
    /// 自定义浏览器可执行文件路径
    pub chrome_executable: Option<PathBuf>,
    /// 每次页面操作后的等待时间（毫秒）
    pub action_delay_ms: u64,
    /// 单个订单最多提交次数
    pub submit_max_attempts: u32,
    /// 两次提交之间的等待时间（毫秒）
    pub submit_retry_delay_ms: u64,
    /// 任一订单失败时立即终止整次运行（不生成压缩包）
    pub abort_on_failure: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件名（位于输出目录下）
    pub run_log_file: String,
    pub selectors: Selectors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "https://robotsparebinindustries.com/#/robot-order".to_string(),
            orders_url: "https://robotsparebinindustries.com/orders.csv".to_string(),
            orders_file: PathBuf::from("orders.csv"),
            output_dir: PathBuf::from("output"),
            archive_name: "robot-orders.zip".to_string(),
            archive_scope: ArchiveScope::Manifest,
            browser_debug_port: None,
            chrome_executable: None,
            action_delay_ms: 500,
            submit_max_attempts: 20,
            submit_retry_delay_ms: 250,
            abort_on_failure: false,
            verbose_logging: false,
            run_log_file: "run.log".to_string(),
            selectors: Selectors::default(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → 配置文件（ROBOT_ORDER_CONFIG） → 环境变量
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("ROBOT_ORDER_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        let config = base.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        let config = toml::from_str(content).map_err(|source| ConfigError::FileParseFailed {
            path: origin.to_string(),
            source,
        })?;
        Ok(config)
    }

    /// 只从环境变量读取（缺省使用默认值）
    pub fn from_env() -> AppResult<Self> {
        Self::default().apply_env()
    }

    fn apply_env(self) -> AppResult<Self> {
        let d = self;
        Ok(Self {
            target_url: std::env::var("TARGET_URL").unwrap_or(d.target_url),
            orders_url: std::env::var("ORDERS_URL").unwrap_or(d.orders_url),
            orders_file: std::env::var("ORDERS_FILE").map(PathBuf::from).unwrap_or(d.orders_file),
            output_dir: std::env::var("OUTPUT_DIR").map(PathBuf::from).unwrap_or(d.output_dir),
            archive_name: std::env::var("ARCHIVE_NAME").unwrap_or(d.archive_name),
            archive_scope: parse_env("ARCHIVE_SCOPE", "manifest|directory")?.unwrap_or(d.archive_scope),
            browser_debug_port: parse_env("BROWSER_DEBUG_PORT", "u16")?.or(d.browser_debug_port),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").map(PathBuf::from).ok().or(d.chrome_executable),
            action_delay_ms: parse_env("ACTION_DELAY_MS", "u64")?.unwrap_or(d.action_delay_ms),
            submit_max_attempts: parse_env("SUBMIT_MAX_ATTEMPTS", "u32")?.unwrap_or(d.submit_max_attempts),
            submit_retry_delay_ms: parse_env("SUBMIT_RETRY_DELAY_MS", "u64")?.unwrap_or(d.submit_retry_delay_ms),
            abort_on_failure: parse_env("ABORT_ON_FAILURE", "bool")?.unwrap_or(d.abort_on_failure),
            verbose_logging: parse_env("VERBOSE_LOGGING", "bool")?.unwrap_or(d.verbose_logging),
            run_log_file: std::env::var("RUN_LOG_FILE").unwrap_or(d.run_log_file),
            selectors: d.selectors,
        })
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.submit_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "submit_max_attempts",
                reason: "至少需要提交 1 次".to_string(),
            });
        }
        if self.target_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "target_url",
                reason: "不能为空".to_string(),
            });
        }
        if self.orders_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "orders_url",
                reason: "不能为空".to_string(),
            });
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "output_dir",
                reason: "不能为空".to_string(),
            });
        }
        if !self.archive_name.ends_with(".zip") {
            return Err(ConfigError::InvalidValue {
                key: "archive_name",
                reason: format!("必须以 .zip 结尾: {}", self.archive_name),
            });
        }
        Ok(())
    }

    /// 压缩包完整路径
    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join(&self.archive_name)
    }
}

/// 读取并解析环境变量，不存在时返回 None
fn parse_env<T: std::str::FromStr>(
    var_name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
