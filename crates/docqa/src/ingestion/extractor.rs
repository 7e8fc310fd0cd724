//! Multi-format text extraction

use calamine::Reader;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{Document, ExtractedText, FormatKind};

/// Replace typographic characters PDF fonts commonly emit with plain equivalents
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ") // Non-breaking space -> space
        .replace('\u{2010}', "-") // Hyphen -> regular hyphen
        .replace('\u{2011}', "-") // Non-breaking hyphen -> hyphen
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

/// Collapse a page onto one line so `"\n"` only ever separates pages
fn normalize_page(text: &str) -> String {
    cleanup_pdf_text(text)
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Converts document bytes into normalized text, one strategy per [`FormatKind`]
#[derive(Debug, Clone, Copy)]
pub struct TextExtractor {
    pdf_timeout: Duration,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl TextExtractor {
    /// Create an extractor; `pdf_timeout` bounds the primary PDF text pass
    pub fn new(pdf_timeout: Duration) -> Self {
        Self { pdf_timeout }
    }

    /// Extract text from a document of the given kind
    pub fn extract(&self, document: &Document, kind: FormatKind) -> Result<ExtractedText> {
        let filename = document.display_name();
        let data = document.data().as_ref();

        let text = match kind {
            FormatKind::PlainText | FormatKind::Markdown => Self::extract_text(filename, data)?,
            FormatKind::Pdf => self.extract_pdf(filename, data)?,
            FormatKind::Spreadsheet => Self::extract_spreadsheet(filename, data)?,
            FormatKind::Unsupported => {
                return Err(Error::UnsupportedFormat(document.filename().to_string()))
            }
        };

        let text = ExtractedText::new(filename, text)?;
        tracing::info!(
            "[{}] extracted {} chars ({})",
            filename,
            text.len(),
            kind.display_name()
        );
        Ok(text)
    }

    /// Decode UTF-8 text verbatim
    fn extract_text(filename: &str, data: &[u8]) -> Result<String> {
        String::from_utf8(data.to_vec()).map_err(|e| Error::decode(filename, e.to_string()))
    }

    /// Extract PDF text page by page, skipping pages without text
    fn extract_pdf(&self, filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(filename, format!("Failed to load PDF: {}", e)))?;
        let page_count = doc.get_pages().len();

        let pages = match Self::extract_pages_with_timeout(data, self.pdf_timeout) {
            Ok(pages) => pages,
            Err(reason) => {
                tracing::warn!("[{}] pdf-extract failed: {}, trying fallback", filename, reason);
                Self::extract_pages_fallback(&doc)
            }
        };

        let segments: Vec<String> = pages
            .iter()
            .map(|page| normalize_page(page))
            .filter(|page| !page.is_empty())
            .collect();

        tracing::debug!(
            "[{}] {} of {} pages contain text",
            filename,
            segments.len(),
            page_count
        );

        Ok(segments.join("\n"))
    }

    /// Run pdf-extract on a worker thread so a pathological font cannot hang the run
    fn extract_pages_with_timeout(
        data: &[u8],
        timeout: Duration,
    ) -> std::result::Result<Vec<String>, String> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem_by_pages(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(pages)) => {
                let _ = handle.join();
                Ok(pages)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e.to_string())
            }
            // The thread keeps running detached; its copy of the bytes is freed when it ends
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Err(format!("timed out after {}s", timeout.as_secs()))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                Err("extraction thread panicked".to_string())
            }
        }
    }

    /// Per-page extraction straight from the content streams
    fn extract_pages_fallback(doc: &lopdf::Document) -> Vec<String> {
        doc.get_pages()
            .keys()
            .map(|&page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("Could not extract text from page {}: {}", page_number, e);
                    String::new()
                }
            })
            .collect()
    }

    /// Render the first worksheet as a whitespace-aligned table
    fn extract_spreadsheet(filename: &str, data: &[u8]) -> Result<String> {
        let cursor = std::io::Cursor::new(data);
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| Error::extraction(filename, e.to_string()))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::extraction(filename, "Workbook has no worksheets"))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| Error::extraction(filename, e.to_string()))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
            .filter(|row| !row.iter().all(|cell| cell.is_empty()))
            .collect();

        Ok(render_table(&rows))
    }
}

fn cell_text(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::Empty => String::new(),
        calamine::Data::String(s) => s.trim().to_string(),
        calamine::Data::Float(f) => f.to_string(),
        calamine::Data::Int(i) => i.to_string(),
        calamine::Data::Bool(b) => b.to_string(),
        calamine::Data::DateTime(dt) => dt.to_string(),
        calamine::Data::DateTimeIso(s) | calamine::Data::DurationIso(s) => s.clone(),
        calamine::Data::Error(e) => format!("#{:?}", e),
    }
}

/// Right-align every column to its widest cell
///
/// The first row is the header. No index column is added.
fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            widths
                .iter()
                .enumerate()
                .map(|(i, width)| {
                    let cell = row.get(i).map(String::as_str).unwrap_or("");
                    format!("{:>width$}", cell, width = width)
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::io::Write;

    fn extract(filename: &str, data: Vec<u8>) -> Result<ExtractedText> {
        let document = Document::new(filename, data);
        let kind = document.format();
        TextExtractor::default().extract(&document, kind)
    }

    /// Build a PDF with one page per entry; `None` pages have no text at all
    fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for page in pages {
            let operations = match page {
                Some(text) => {
                    let mut operations = vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 24.into()]),
                        Operation::new("Td", vec![72.into(), 700.into()]),
                    ];
                    for (i, line) in text.lines().enumerate() {
                        if i > 0 {
                            operations.push(Operation::new("Td", vec![0.into(), (-40).into()]));
                        }
                        operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
                    }
                    operations.push(Operation::new("ET", vec![]));
                    operations
                }
                None => vec![],
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    /// Build a minimal single-sheet workbook with inline string cells
    fn build_xlsx(rows: &[&[&str]]) -> Vec<u8> {
        let mut sheet_rows = String::new();
        for (r, row) in rows.iter().enumerate() {
            sheet_rows.push_str(&format!("<row r=\"{}\">", r + 1));
            for (c, value) in row.iter().enumerate() {
                let col = (b'A' + c as u8) as char;
                sheet_rows.push_str(&format!(
                    "<c r=\"{}{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                    col,
                    r + 1,
                    value
                ));
            }
            sheet_rows.push_str("</row>");
        }

        let files = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#.to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
            ),
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Cities" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                    sheet_rows
                ),
            ),
        ];

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, body) in files {
            writer.start_file(name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_plain_text_round_trip() {
        let content = "Paris is the capital of France.\nÜmlauts survive: café, naïve.\n";
        let text = extract("facts.txt", content.as_bytes().to_vec()).unwrap();
        assert_eq!(text.as_str(), content);
    }

    #[test]
    fn test_markdown_is_verbatim() {
        let content = "# Title\n\n- item *one*\n";
        let text = extract("notes.md", content.as_bytes().to_vec()).unwrap();
        assert_eq!(text.as_str(), content);
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let err = extract("broken.txt", vec![0x66, 0x6f, 0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), "DecodeError");
    }

    #[test]
    fn test_whitespace_only_is_empty_document() {
        let err = extract("blank.txt", b"  \n\n\t ".to_vec()).unwrap_err();
        assert_eq!(err.kind(), "EmptyDocumentError");
    }

    #[test]
    fn test_unsupported_is_rejected_without_extraction() {
        let document = Document::new("tool.exe", vec![0x4d, 0x5a]);
        let err = TextExtractor::default()
            .extract(&document, FormatKind::Unsupported)
            .unwrap_err();
        assert_eq!(err.kind(), "UnsupportedFormatError");
    }

    #[test]
    fn test_pdf_skips_pages_without_text() {
        let pdf = build_pdf(&[Some("Alpha"), None, Some("Gamma")]);
        let text = extract("three.pdf", pdf).unwrap();

        let segments: Vec<&str> = text.as_str().split('\n').collect();
        assert_eq!(segments.len(), 2, "got {:?}", text.as_str());
        assert!(segments[0].contains("Alpha"));
        assert!(segments[1].contains("Gamma"));
    }

    #[test]
    fn test_multi_line_page_stays_one_segment() {
        let pdf = build_pdf(&[Some("Alpha one\nAlpha two"), None, Some("Gamma")]);
        let text = extract("lines.pdf", pdf).unwrap();

        let segments: Vec<&str> = text.as_str().split('\n').collect();
        assert_eq!(segments.len(), 2, "got {:?}", text.as_str());
        assert!(segments[0].contains("Alpha one"));
        assert!(segments[0].contains("Alpha two"));
        assert!(segments[1].contains("Gamma"));
    }

    #[test]
    fn test_pdf_without_any_text_is_empty_document() {
        let pdf = build_pdf(&[None, None]);
        let err = extract("scanned.pdf", pdf).unwrap_err();
        assert_eq!(err.kind(), "EmptyDocumentError");
    }

    #[test]
    fn test_invalid_pdf_is_extraction_error() {
        let err = extract("fake.pdf", b"this is not a pdf".to_vec()).unwrap_err();
        assert_eq!(err.kind(), "ExtractionError");
    }

    #[test]
    fn test_spreadsheet_keeps_column_order() {
        let xlsx = build_xlsx(&[
            &["City", "Country", "Population"],
            &["Paris", "France", "2161000"],
            &["Lyon", "France", "513000"],
        ]);
        let text = extract("cities.xlsx", xlsx).unwrap();

        let lines: Vec<Vec<&str>> = text
            .as_str()
            .lines()
            .map(|l| l.split_whitespace().collect())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], vec!["City", "Country", "Population"]);
        assert_eq!(lines[1], vec!["Paris", "France", "2161000"]);
        assert_eq!(lines[2], vec!["Lyon", "France", "513000"]);
    }

    #[test]
    fn test_malformed_spreadsheet_is_extraction_error() {
        let err = extract("broken.xlsx", b"PK not really a zip".to_vec()).unwrap_err();
        assert_eq!(err.kind(), "ExtractionError");
    }

    #[test]
    fn test_render_table_pads_short_rows() {
        let rows = vec![
            vec!["a".to_string(), "bb".to_string()],
            vec!["ccc".to_string()],
        ];
        assert_eq!(render_table(&rows), "  a  bb\nccc");
    }

    #[test]
    fn test_normalize_page_replaces_ligatures() {
        assert_eq!(normalize_page("  \u{FB01}nal\u{00A0}draft \n\n"), "final draft");
    }

    #[test]
    fn test_normalize_page_joins_lines() {
        assert_eq!(normalize_page("first line\n\n  second line  \n"), "first line second line");
    }
}
