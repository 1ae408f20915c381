//! 订单数据源 - 业务能力层

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::error::{AppError, AppResult, SourceError};
use crate::models::{load_orders_from_csv, OrderRecord};

/// 提供按顺序排列的订单列表
#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn fetch_orders(&self) -> AppResult<Vec<OrderRecord>>;
}

/// 先下载订单 CSV（覆盖本地文件），再读取
pub struct HttpCsvSource {
    url: String,
    target: PathBuf,
}

impl HttpCsvSource {
    pub fn new(url: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            target: target.into(),
        }
    }

    /// 下载订单文件，返回字节数
    async fn download(&self) -> AppResult<usize> {
        info!("⬇️ 正在下载订单文件: {}", self.url);
        let download_err = |source| SourceError::DownloadFailed {
            url: self.url.clone(),
            source,
        };

        let bytes = reqwest::get(&self.url)
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(download_err)?
            .bytes()
            .await
            .map_err(download_err)?;

        if let Some(parent) = self.target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.target, &bytes)
            .await
            .map_err(|e| AppError::file_write_failed(self.target.display().to_string(), e))?;

        Ok(bytes.len())
    }
}

#[async_trait]
impl OrderSource for HttpCsvSource {
    async fn fetch_orders(&self) -> AppResult<Vec<OrderRecord>> {
        let size = self.download().await?;
        info!("✓ 订单文件已保存: {} ({} 字节)", self.target.display(), size);
        load_orders_from_csv(&self.target)
    }
}

/// 读取本地 CSV，不下载
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl OrderSource for CsvFileSource {
    async fn fetch_orders(&self) -> AppResult<Vec<OrderRecord>> {
        load_orders_from_csv(&self.path)
    }
}

/// 内存中的订单列表
#[async_trait]
impl OrderSource for Vec<OrderRecord> {
    async fn fetch_orders(&self) -> AppResult<Vec<OrderRecord>> {
        Ok(self.clone())
    }
}
