//! Per-format text extraction and OCR

mod dispatch;
pub mod ocr;

pub use dispatch::TextExtractor;
pub use ocr::OcrAdapter;
