//! Output rendering and persistence

mod format;
mod persist;
mod workbook;

pub use format::{format_output, FormatOptions};
pub use persist::{cleanup_old_files, save_results};
pub use workbook::{read_template_headers, write_workbook, SheetRows};
