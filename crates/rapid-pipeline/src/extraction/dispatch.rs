//! Multi-format text extraction dispatched by file kind

use calamine::Reader;

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::types::{FileKind, FileRecord};

/// Clean up PDF text: drop null characters, collapse glyph artifacts, trim
/// per-line whitespace left behind by pdf-extract
fn cleanup_pdf_text(text: &str) -> String {
    let text = text
        .replace('\0', "")
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff");

    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text extractor dispatching on [`FileKind`].
///
/// Pure over the file's bytes: no filesystem or network access on any path.
pub struct TextExtractor {
    config: ExtractionConfig,
}

impl TextExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extract text from a file.
    ///
    /// Returns `Ok(None)` for raster images so the caller routes them to the
    /// OCR adapter; images skip validation entirely since type alone is never
    /// an error for them. Non-image files are validated against the size
    /// ceiling and extension allow-list first.
    pub fn extract(&self, record: &FileRecord) -> Result<Option<String>> {
        let kind = record.kind();

        if kind.is_image() {
            return Ok(None);
        }

        // Unknown kinds are a type failure, not an allow-list violation
        if let FileKind::Unsupported(ext) = &kind {
            return Err(Error::UnsupportedFileType(ext.clone()));
        }

        self.validate(record)?;

        let text = match kind {
            FileKind::Pdf => self.extract_pdf(record)?,
            FileKind::Spreadsheet => self.extract_spreadsheet(record)?,
            FileKind::WordDocument => self.extract_docx(record)?,
            FileKind::Csv => self.extract_csv(record)?,
            FileKind::PlainText | FileKind::Markdown => {
                String::from_utf8_lossy(&record.content).to_string()
            }
            FileKind::Image | FileKind::Unsupported(_) => {
                unreachable!("handled above")
            }
        };

        Ok(Some(text))
    }

    /// Validate size and type before extraction
    fn validate(&self, record: &FileRecord) -> Result<()> {
        if record.size() > self.config.max_file_size {
            return Err(Error::validation(format!(
                "File '{}' exceeds {}MB limit",
                record.name,
                self.config.max_file_size / (1024 * 1024)
            )));
        }

        let ext = record.extension();
        if !self.config.allowed_extensions.iter().any(|a| *a == ext) {
            return Err(Error::validation(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                ext,
                self.config.allowed_extensions.join(", ")
            )));
        }

        Ok(())
    }

    /// Extract PDF text with pdf-extract, falling back to a lopdf
    /// content-stream walk when the primary parser chokes on fonts
    fn extract_pdf(&self, record: &FileRecord) -> Result<String> {
        let content = match pdf_extract::extract_text_from_mem(&record.content) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("[{}] pdf-extract failed: {}, trying fallback", record.name, e);
                Self::extract_pdf_fallback(&record.name, &record.content)?
            }
        };

        let content = cleanup_pdf_text(&content);

        if content.trim().is_empty() {
            return Err(Error::extraction(
                &record.name,
                "No text content could be extracted from PDF",
            ));
        }

        Ok(content)
    }

    /// Fallback PDF text extraction using lopdf directly
    fn extract_pdf_fallback(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(filename, format!("Failed to load PDF: {}", e)))?;

        let mut all_text = String::new();
        for (page_num, page_id) in doc.get_pages() {
            match doc.get_page_content(page_id) {
                Ok(content) => {
                    let text = Self::extract_text_from_content(&content);
                    if !text.is_empty() {
                        all_text.push_str(&format!("\n--- Page {} ---\n", page_num));
                        all_text.push_str(&text);
                    }
                }
                Err(e) => {
                    tracing::debug!("Could not get content for page {}: {}", page_num, e);
                }
            }
        }

        if all_text.trim().is_empty() {
            return Err(Error::extraction(
                filename,
                "PDF appears to be image-based or has no extractable text",
            ));
        }

        Ok(all_text)
    }

    /// Extract text show operators from a PDF content stream
    fn extract_text_from_content(content: &[u8]) -> String {
        let content_str = String::from_utf8_lossy(content);
        let mut text = String::new();
        let mut in_text_block = false;

        for line in content_str.lines() {
            let line = line.trim();

            if line == "BT" {
                in_text_block = true;
                continue;
            }
            if line == "ET" {
                in_text_block = false;
                continue;
            }

            if in_text_block && (line.ends_with("Tj") || line.ends_with("TJ")) {
                if let (Some(start), Some(end)) = (line.find('('), line.rfind(')')) {
                    if start < end {
                        let decoded = line[start + 1..end]
                            .replace("\\n", "\n")
                            .replace("\\(", "(")
                            .replace("\\)", ")")
                            .replace("\\\\", "\\");
                        text.push_str(&decoded);
                        text.push(' ');
                    }
                }
            }
        }

        text
    }

    /// Concatenate all sheets as delimited text
    fn extract_spreadsheet(&self, record: &FileRecord) -> Result<String> {
        let cursor = std::io::Cursor::new(record.content.as_slice());
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| Error::extraction(&record.name, e.to_string()))?;

        let mut content = String::new();
        for sheet_name in workbook.sheet_names().to_vec() {
            if let Ok(range) = workbook.worksheet_range(&sheet_name) {
                content.push_str(&format!("Sheet: {}\n", sheet_name));

                for row in range.rows() {
                    let row_text: Vec<String> = row
                        .iter()
                        .map(|cell| match cell {
                            calamine::Data::Empty => String::new(),
                            calamine::Data::String(s) => s.clone(),
                            calamine::Data::Float(f) => f.to_string(),
                            calamine::Data::Int(i) => i.to_string(),
                            calamine::Data::Bool(b) => b.to_string(),
                            calamine::Data::DateTime(dt) => dt.to_string(),
                            _ => String::new(),
                        })
                        .collect();

                    if !row_text.iter().all(|s| s.is_empty()) {
                        content.push_str(&row_text.join(" | "));
                        content.push('\n');
                    }
                }
                content.push('\n');
            }
        }

        Ok(content)
    }

    /// Raw run text only; tables and formatting are intentionally dropped
    fn extract_docx(&self, record: &FileRecord) -> Result<String> {
        let doc = docx_rs::read_docx(&record.content)
            .map_err(|e| Error::extraction(&record.name, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(content)
    }

    /// Delimited passthrough of headers and rows
    fn extract_csv(&self, record: &FileRecord) -> Result<String> {
        let mut reader = csv::Reader::from_reader(record.content.as_slice());
        let mut content = String::new();

        if let Ok(headers) = reader.headers() {
            content.push_str(&headers.iter().collect::<Vec<_>>().join(" | "));
            content.push('\n');
        }

        for row in reader.records().flatten() {
            content.push_str(&row.iter().collect::<Vec<_>>().join(" | "));
            content.push('\n');
        }

        Ok(content)
    }
}
