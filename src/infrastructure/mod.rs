pub mod chrome_page;
pub mod page_gateway;
pub mod pdf_renderer;

pub use chrome_page::ChromePage;
pub use page_gateway::{Locator, PageGateway};
pub use pdf_renderer::{ChromePdfRenderer, DocumentRenderer};
