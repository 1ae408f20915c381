pub mod order_ctx;
pub mod order_flow;
pub mod page_state;

pub use order_ctx::OrderCtx;
pub use order_flow::{OrderFlow, OrderOutcome};
pub use page_state::{Confirmed, FilledForm, OrderEntry};
