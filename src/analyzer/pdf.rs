// src/analyzer/pdf.rs
// =============================================================================
// PDF analyzer.
//
// Downloads the file, loads it with `lopdf` and reads the document Info
// dictionary referenced from the trailer (Title, Author, Subject, ...).
//
// PDF "text strings" come in two encodings:
// - UTF-16BE, marked by a leading FE FF byte order mark
// - PDFDocEncoding otherwise, which matches Latin-1 for printable text
// =============================================================================

use async_trait::async_trait;
use lopdf::{Dictionary, Document, Object};
use serde::Serialize;
use std::io::Read;
use url::Url;

use super::{file_name, parse_blocking, Analyzer};
use crate::error::AnalyzeError;
use crate::http::Fetcher;

/// Metadata extracted from a PDF. Unset fields are omitted from the JSON.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PdfMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_date: Option<String>,
}

pub struct PdfAnalyzer {
    fetcher: Fetcher,
    metadata: PdfMetadata,
}

impl PdfAnalyzer {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            metadata: PdfMetadata::default(),
        }
    }
}

#[async_trait]
impl Analyzer for PdfAnalyzer {
    async fn process(&mut self, url: &Url) -> Result<(), AnalyzeError> {
        let file = self.fetcher.fetch_document(url).await?;

        let mut metadata = parse_blocking(move || Ok(read_metadata(file)?)).await?;
        metadata.url = Some(url.to_string());
        metadata.source = file_name(url);

        self.metadata = metadata;
        Ok(())
    }

    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.metadata)
    }
}

/// Parses a PDF and reads its Info dictionary.
///
/// A PDF without an Info dictionary is still valid: only `version` is set.
pub fn read_metadata<R: Read>(source: R) -> Result<PdfMetadata, lopdf::Error> {
    let document = Document::load_from(source)?;

    let mut metadata = PdfMetadata {
        version: non_empty(document.version.clone()),
        ..PdfMetadata::default()
    };

    if let Some(info) = info_dictionary(&document) {
        metadata.title = text_field(&document, info, b"Title");
        metadata.author = text_field(&document, info, b"Author");
        metadata.subject = text_field(&document, info, b"Subject");
        metadata.producer = text_field(&document, info, b"Producer");
        metadata.creator = text_field(&document, info, b"Creator");
        metadata.creation_date = text_field(&document, info, b"CreationDate");
        metadata.mod_date = text_field(&document, info, b"ModDate");
    }

    Ok(metadata)
}

// The trailer's /Info entry is normally an indirect reference, but a direct
// dictionary is tolerated too
fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    match document.trailer.get(b"Info").ok()? {
        Object::Reference(id) => document.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn text_field(document: &Document, info: &Dictionary, key: &[u8]) -> Option<String> {
    let object = match info.get(key).ok()? {
        Object::Reference(id) => document.get_object(*id).ok()?,
        direct => direct,
    };
    match object {
        Object::String(bytes, _) => non_empty(decode_text_string(bytes)),
        Object::Name(name) => non_empty(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE_u8, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF_u8, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim_end_matches('\0').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
