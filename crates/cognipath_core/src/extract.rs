//! crates/cognipath_core/src/extract.rs
//!
//! Converts uploaded files into plain text for prompt context.
//!
//! A corrupt file never fails the batch: its text becomes a sentinel line naming it.
//! Only an unrecognized extension is reported as an error, so callers can tell
//! "unsupported" apart from "empty".

use crate::domain::{ExtractedDocument, UploadedFile};
use regex::Regex;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

/// Per-document cap, in characters. Bounds the size of the remote call payload.
pub const MAX_DOCUMENT_CHARS: usize = 100_000;

/// Appended to the rendered text of a document that hit the cap.
pub const TRUNCATION_MARKER: &str = "...[truncated]";

const DOCX_BODY_PART: &str = "word/document.xml";

static DOCX_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*?)?(?:/>|>(.*?)</w:p>)").expect("paragraph pattern is valid")
});

static DOCX_TEXT_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").expect("text run pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Unsupported file format: {filename}")]
    UnsupportedFormat { filename: String },
}

/// File kinds the extractor understands, keyed by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "txt" | "md" => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }
}

/// Documents ready for a prompt, plus the names of files that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionBatch {
    pub documents: Vec<ExtractedDocument>,
    pub skipped: Vec<String>,
}

/// Extracts every file in order. Unsupported files are skipped and reported, never fatal.
pub fn extract_documents(files: &[UploadedFile]) -> ExtractionBatch {
    let mut batch = ExtractionBatch::default();
    for file in files {
        match extract_document(file) {
            Ok(document) => batch.documents.push(document),
            Err(e) => {
                warn!("Skipping uploaded file: {}", e);
                batch.skipped.push(file.filename.clone());
            }
        }
    }
    batch
}

/// Extracts and caps the text of a single file.
pub fn extract_document(file: &UploadedFile) -> Result<ExtractedDocument, ExtractError> {
    let format = DocumentFormat::from_filename(&file.filename).ok_or_else(|| {
        ExtractError::UnsupportedFormat {
            filename: file.filename.clone(),
        }
    })?;

    let raw_text = match read_text(format, &file.bytes) {
        Ok(text) => text,
        Err(reason) => {
            warn!("Error extracting text from {}: {}", file.filename, reason);
            unreadable_sentinel(&file.filename)
        }
    };

    let (text, truncated) = cap_text(&raw_text);
    Ok(ExtractedDocument {
        filename: file.filename.clone(),
        text,
        truncated,
    })
}

/// Text placed in the prompt when a file could not be read.
pub fn unreadable_sentinel(filename: &str) -> String {
    format!("[Error reading file: {}]", filename)
}

/// Cuts `text` down to `MAX_DOCUMENT_CHARS` characters, reporting whether anything was cut.
pub fn cap_text(text: &str) -> (String, bool) {
    match text.char_indices().nth(MAX_DOCUMENT_CHARS) {
        Some((byte_index, _)) => (text[..byte_index].to_string(), true),
        None => (text.to_string(), false),
    }
}

fn read_text(format: DocumentFormat, bytes: &[u8]) -> Result<String, String> {
    match format {
        DocumentFormat::Pdf => read_pdf(bytes),
        DocumentFormat::Docx => read_docx(bytes),
        DocumentFormat::PlainText => Ok(decode_lossless_utf8(bytes)),
    }
}

fn read_pdf(bytes: &[u8]) -> Result<String, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    if doc.is_encrypted() {
        return Err("document is encrypted".to_string());
    }

    let mut text = String::new();
    // `get_pages` is keyed by page number, so iteration is in page order.
    for page_number in doc.get_pages().keys() {
        let page_text = doc
            .extract_text(&[*page_number])
            .map_err(|e| format!("page {}: {}", page_number, e))?;
        // lopdf already ends each page with a line break; keep exactly one.
        text.push_str(page_text.trim_end_matches(['\r', '\n']));
        text.push('\n');
    }
    Ok(text)
}

fn read_docx(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY_PART)
        .map_err(|e| format!("{}: {}", DOCX_BODY_PART, e))?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    let mut text = String::new();
    for paragraph in DOCX_PARAGRAPH.captures_iter(&xml) {
        if let Some(body) = paragraph.get(1) {
            for run in DOCX_TEXT_RUN.captures_iter(body.as_str()) {
                text.push_str(&html_escape::decode_html_entities(&run[1]));
            }
        }
        text.push('\n');
    }
    Ok(text)
}

/// Decodes UTF-8, dropping invalid byte sequences instead of failing or substituting.
fn decode_lossless_utf8(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn upload(filename: &str, bytes: impl Into<Vec<u8>>) -> UploadedFile {
        UploadedFile {
            filename: filename.to_string(),
            bytes: bytes::Bytes::from(bytes.into()),
        }
    }

    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCX_BODY_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page_text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*page_text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn pdf_pages_are_read_in_order_one_line_each() {
        let pdf = pdf_with_pages(&["PageOne", "PageTwo"]);
        let doc = extract_document(&upload("slides.PDF", pdf)).unwrap();
        assert_eq!(doc.text, "PageOne\nPageTwo\n");
        assert!(!doc.truncated);
    }

    #[test]
    fn plain_text_drops_invalid_bytes() {
        let bytes = b"caf\xc3\xa9 \xff\xfeok".to_vec();
        let doc = extract_document(&upload("notes.TXT", bytes)).unwrap();
        assert_eq!(doc.text, "café ok");
        assert!(!doc.truncated);
    }

    #[test]
    fn markdown_is_read_as_text() {
        let doc = extract_document(&upload("README.md", "# Title\nbody")).unwrap();
        assert_eq!(doc.text, "# Title\nbody");
    }

    #[test]
    fn unknown_extension_is_unsupported_not_empty() {
        let err = extract_document(&upload("slides.pptx", "whatever")).unwrap_err();
        assert_eq!(
            err,
            ExtractError::UnsupportedFormat {
                filename: "slides.pptx".into()
            }
        );
        assert!(extract_document(&upload("no_extension", "x")).is_err());
    }

    #[test]
    fn empty_text_file_is_empty_not_an_error() {
        let doc = extract_document(&upload("empty.txt", Vec::<u8>::new())).unwrap();
        assert_eq!(doc.text, "");
    }

    #[test]
    fn corrupt_files_become_sentinel_text() {
        let pdf = extract_document(&upload("broken.pdf", "not a pdf")).unwrap();
        assert_eq!(pdf.text, "[Error reading file: broken.pdf]");

        let docx = extract_document(&upload("broken.docx", "not a zip")).unwrap();
        assert_eq!(docx.text, "[Error reading file: broken.docx]");
    }

    #[test]
    fn docx_paragraphs_are_joined_with_newlines() {
        let body = concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world</w:t></w:r></w:p>"#,
            r#"<w:p/>"#,
            r#"<w:p w:rsidR="00A1"><w:r><w:tab/><w:t>Fish &amp; chips</w:t></w:r></w:p>"#,
        );
        let doc = extract_document(&upload("lesson.docx", docx_with_body(body))).unwrap();
        assert_eq!(doc.text, "Hello world\n\nFish & chips\n");
    }

    #[test]
    fn docx_self_closing_paragraph_with_attributes_is_a_blank_line() {
        let body = concat!(
            r#"<w:p><w:r><w:t>One</w:t></w:r></w:p>"#,
            r#"<w:p w:rsidR="00A1" w:rsidRDefault="00B2"/>"#,
            r#"<w:p w14:paraId="1A/2B"><w:r><w:t>Three</w:t></w:r></w:p>"#,
        );
        let doc = extract_document(&upload("blank.docx", docx_with_body(body))).unwrap();
        assert_eq!(doc.text, "One\n\nThree\n");
    }

    #[test]
    fn cap_leaves_exact_limit_untouched() {
        let text = "a".repeat(MAX_DOCUMENT_CHARS);
        let doc = extract_document(&upload("exact.txt", text.clone())).unwrap();
        assert_eq!(doc.text, text);
        assert!(!doc.truncated);
        assert_eq!(doc.display_text(), text);
    }

    #[test]
    fn cap_truncates_one_past_the_limit() {
        let text = "é".repeat(MAX_DOCUMENT_CHARS + 1);
        let doc = extract_document(&upload("long.md", text)).unwrap();
        assert_eq!(doc.text.chars().count(), MAX_DOCUMENT_CHARS);
        assert!(doc.truncated);
        assert!(doc.display_text().ends_with(TRUNCATION_MARKER));
        assert_eq!(
            doc.display_text().chars().count(),
            MAX_DOCUMENT_CHARS + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let file = upload("lesson.docx", docx_with_body("<w:p><w:r><w:t>Same</w:t></w:r></w:p>"));
        assert_eq!(extract_document(&file), extract_document(&file));
    }

    #[test]
    fn batch_skips_unsupported_files_and_keeps_order() {
        let batch = extract_documents(&[
            upload("a.txt", "first"),
            upload("b.exe", "nope"),
            upload("c.md", "second"),
        ]);
        let names: Vec<_> = batch.documents.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "c.md"]);
        assert_eq!(batch.skipped, vec!["b.exe".to_string()]);
    }
}
