pub mod archive_builder;
pub mod document;
pub mod order_form;
pub mod order_source;
pub mod receipt_producer;

pub use archive_builder::{scan_documents, ArchiveBuilder, ArchiveBundle};
pub use document::ReceiptDocument;
pub use order_form::{OrderFormDriver, SubmitPolicy};
pub use order_source::{CsvFileSource, HttpCsvSource, OrderSource};
pub use receipt_producer::{ReceiptArtifacts, ReceiptProducer};
