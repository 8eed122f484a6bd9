//! services/api/src/adapters/extract.rs
//!
//! This module contains the text extraction adapter, the concrete
//! implementation of the `TextExtractor` port. It dispatches a stored file to
//! the extraction routine for its extension and degrades every failure to
//! `Extraction::Empty` so a chat request proceeds with "no content" instead
//! of aborting.

use doc_chat_core::ports::{Extraction, TextExtractor};
use std::path::Path;
use tracing::warn;

/// Extracts text from files on local disk, selecting the routine by file
/// extension. Supported: pdf, docx, doc, txt. Anything else yields no text.
#[derive(Clone, Default)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for FileTextExtractor {
    fn extract(&self, path: &Path) -> Extraction {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let result = match extension.as_deref() {
            Some("pdf") => extract_pdf(path),
            Some("docx") | Some("doc") => extract_docx(path),
            Some("txt") => extract_txt(path),
            _ => Err("unsupported file extension".to_string()),
        };

        match result {
            Ok(text) if !text.trim().is_empty() => Extraction::Text(text),
            Ok(_) => Extraction::Empty {
                reason: "document contained no extractable text".to_string(),
            },
            Err(reason) => {
                warn!(path = %path.display(), %reason, "text extraction failed");
                Extraction::Empty { reason }
            }
        }
    }
}

/// Per-page text, concatenated with newline separators.
fn extract_pdf(path: &Path) -> Result<String, String> {
    let document = lopdf::Document::load(path).map_err(|e| e.to_string())?;
    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        let page_text = document
            .extract_text(&[*page_number])
            .map_err(|e| e.to_string())?;
        text.push_str(&page_text);
        text.push('\n');
    }
    Ok(text)
}

/// Per-paragraph text, concatenated with newline separators.
fn extract_docx(path: &Path) -> Result<String, String> {
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};

    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| e.to_string())?;

    let mut text = String::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            for paragraph_child in paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in run.children {
                        if let RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

/// UTF-8 read with a permissive Windows-1252 fallback for legacy exports.
fn extract_txt(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn utf8_txt_is_read_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "notes.txt", "UNNES research abstract".as_bytes());
        assert_eq!(
            FileTextExtractor::new().extract(&path),
            Extraction::Text("UNNES research abstract".to_string())
        );
    }

    #[test]
    fn non_utf8_txt_falls_back_to_windows_1252() {
        let dir = TempDir::new().unwrap();
        // "café" with a Windows-1252 e-acute (0xE9), invalid as UTF-8.
        let path = write_fixture(&dir, "legacy.txt", &[b'c', b'a', b'f', 0xE9]);
        match FileTextExtractor::new().extract(&path) {
            Extraction::Text(text) => assert_eq!(text, "café"),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn corrupt_pdf_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "broken.pdf", b"this is not a pdf");
        assert!(matches!(
            FileTextExtractor::new().extract(&path),
            Extraction::Empty { .. }
        ));
    }

    #[test]
    fn corrupt_docx_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "broken.docx", b"this is not a zip archive");
        assert!(matches!(
            FileTextExtractor::new().extract(&path),
            Extraction::Empty { .. }
        ));
    }

    #[test]
    fn unsupported_extension_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "program.exe", b"MZ");
        assert!(matches!(
            FileTextExtractor::new().extract(&path),
            Extraction::Empty { .. }
        ));
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let path = Path::new("/definitely/not/here.txt");
        assert!(matches!(
            FileTextExtractor::new().extract(path),
            Extraction::Empty { .. }
        ));
    }

    #[test]
    fn whitespace_only_text_counts_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "blank.txt", b"  \n\t  ");
        assert!(matches!(
            FileTextExtractor::new().extract(&path),
            Extraction::Empty { .. }
        ));
    }
}
