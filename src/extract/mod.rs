//! Text extraction: prices from search pages, labelled fields from asset
//! descriptions, and cleanup of raw OCR output.

pub mod fields;
pub mod ocr;
pub mod prices;

pub use fields::{extract_fields, ExtractedFields};
pub use ocr::clean_ocr;
pub use prices::PriceExtractor;
