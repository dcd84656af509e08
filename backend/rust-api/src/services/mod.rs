pub mod ingest;
pub mod ocr_engine;
pub mod receipt_parser;

pub use ingest::{fetch_signed_object, ingest_receipt, FetchError, IngestError};
pub use ocr_engine::{OcrEngine, OcrError, TesseractEngine};
