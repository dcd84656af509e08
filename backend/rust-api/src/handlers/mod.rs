pub mod boletas;
pub mod health;
pub mod ocr;

pub use boletas::{create_boleta, delete_boleta, get_boleta, get_stats, list_boletas, ListParams};
pub use health::health_check;
pub use ocr::{extract_from_storage, upload_and_extract};
