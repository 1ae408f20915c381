use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 订单处理错误
    #[error("订单错误: {0}")]
    Order(#[from] OrderError),
    /// 文档（PDF / 压缩包）错误
    #[error("文档错误: {0}")]
    Document(#[from] DocumentError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 订单数据源错误
    #[error("数据源错误: {0}")]
    Source(#[from] SourceError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 流水线状态迁移非法
    #[error("流水线状态错误: 无法从 {from} 迁移到 {to}")]
    InvalidState { from: String, to: String },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {message}")]
    LaunchFailed { message: String },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 页面元素不存在
    #[error("页面元素不存在: {locator}")]
    ElementNotFound { locator: String },
    /// 执行脚本失败
    #[error("执行脚本失败: {0}")]
    ScriptExecutionFailed(#[from] chromiumoxide::error::CdpError),
    /// 脚本返回值无法解析
    #[error("脚本返回值无法解析: {0}")]
    ScriptResultInvalid(#[from] serde_json::Error),
}

/// 订单处理错误
#[derive(Debug, Error)]
pub enum OrderError {
    /// 表单元素缺失或页面结构变化
    #[error("订单 {order_number} 的页面元素不存在: {locator}")]
    UiElementNotFound {
        locator: String,
        order_number: String,
    },
    /// 提交重试耗尽仍未出现回执
    #[error("订单 {order_number} 提交失败 (已尝试 {attempts} 次)")]
    SubmissionFailed { order_number: String, attempts: u32 },
}

/// 文档错误
#[derive(Debug, Error)]
pub enum DocumentError {
    /// PDF 读写失败
    #[error("PDF处理失败 ({path}): {source}")]
    Pdf {
        path: String,
        #[source]
        source: lopdf::Error,
    },
    /// PDF 结构不符合预期
    #[error("PDF结构异常 ({path}): {message}")]
    Malformed { path: String, message: String },
    /// 渲染结果为空
    #[error("渲染结果为空: {0}")]
    EmptyRender(String),
    /// 压缩包写入失败
    #[error("压缩包写入失败 ({path}): {source}")]
    Archive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 其他 IO 错误（无路径信息）
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 订单数据源错误
#[derive(Debug, Error)]
pub enum SourceError {
    /// 下载订单文件失败
    #[error("下载订单文件失败 ({url}): {source}")]
    DownloadFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// CSV 解析失败
    #[error("CSV解析失败: {0}")]
    Csv(#[from] csv::Error),
    /// 订单缺少必填字段
    #[error("第 {row} 行订单缺少字段: {field}")]
    MissingField { row: usize, field: &'static str },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    FileParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值非法
    #[error("配置项 {key} 非法: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(BrowserError::ScriptResultInvalid(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::Io(err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Source(SourceError::Csv(err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建元素不存在错误
    pub fn element_not_found(locator: impl Into<String>) -> Self {
        AppError::Browser(BrowserError::ElementNotFound {
            locator: locator.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建 PDF 处理错误
    pub fn pdf(path: impl Into<String>, source: lopdf::Error) -> Self {
        AppError::Document(DocumentError::Pdf {
            path: path.into(),
            source,
        })
    }

    /// 把页面元素缺失错误归属到具体订单
    ///
    /// 其他错误原样返回
    pub fn for_order(self, order_number: &str) -> Self {
        match self {
            AppError::Browser(BrowserError::ElementNotFound { locator }) => {
                AppError::Order(OrderError::UiElementNotFound {
                    locator,
                    order_number: order_number.to_string(),
                })
            }
            other => other,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
