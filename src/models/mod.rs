pub mod loaders;
pub mod order;

pub use loaders::{load_orders_from_csv, read_orders};
pub use order::{artifact_key, OrderRecord};
