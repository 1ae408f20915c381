use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::order::OrderRecord;

/// 从 CSV 文件读取订单列表（保持文件中的顺序）
pub fn load_orders_from_csv(csv_path: &Path) -> AppResult<Vec<OrderRecord>> {
    let file = std::fs::File::open(csv_path)
        .map_err(|e| AppError::file_read_failed(csv_path.display().to_string(), e))?;

    let orders = read_orders(file)?;
    info!(
        "✓ 从 {} 读取到 {} 个订单",
        csv_path.file_name().unwrap_or_default().to_string_lossy(),
        orders.len()
    );
    Ok(orders)
}

/// 从任意数据流读取订单
pub fn read_orders<R: Read>(reader: R) -> AppResult<Vec<OrderRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut orders = Vec::new();
    for (index, row) in csv_reader.deserialize::<OrderRecord>().enumerate() {
        let record = row?;
        record.validate(index + 1)?;
        debug!("读取订单: {}", record);
        orders.push(record);
    }
    Ok(orders)
}
