// src/analyzer/ooxml.rs
// =============================================================================
// Office Open XML analyzer (docx, xlsx, pptx).
//
// These formats are zip archives. The metadata lives in two XML parts:
// - docProps/core.xml: title, creator, dates (Dublin Core based)
// - docProps/app.xml:  application name, page/word counts, company
//
// Either part may be missing; that just leaves its properties empty. A body
// that isn't a zip archive, or an XML part that doesn't parse, fails the
// whole document.
//
// The JSON keys mirror the element names used inside the parts, so the
// output looks like:
//   {"url": "...", "CoreProperty": {"title": "..."}, "AppProperty": {"pages": "4"}}
// =============================================================================

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::io::{self, Read, Seek};
use url::Url;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{parse_blocking, Analyzer};
use crate::error::AnalyzeError;
use crate::http::Fetcher;

const CORE_PART: &str = "docProps/core.xml";
const APP_PART: &str = "docProps/app.xml";

// Property parts are a few KB; anything bigger is not a real Office file
const MAX_PART_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CoreProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(rename = "lastModifiedBy", skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct AppProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_security: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraphs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_doc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
}

impl CoreProperties {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn set(&mut self, element: &str, value: String) {
        let slot = match element {
            "title" => &mut self.title,
            "creator" => &mut self.creator,
            "lastModifiedBy" => &mut self.last_modified_by,
            "revision" => &mut self.revision,
            "created" => &mut self.created,
            "modified" => &mut self.modified,
            "language" => &mut self.language,
            _ => return,
        };
        *slot = Some(value);
    }
}

impl AppProperties {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn set(&mut self, element: &str, value: String) {
        let slot = match element {
            "Application" => &mut self.application,
            "DocSecurity" => &mut self.doc_security,
            "Pages" => &mut self.pages,
            "Words" => &mut self.words,
            "Characters" => &mut self.characters,
            "Company" => &mut self.company,
            "Lines" => &mut self.lines,
            "Paragraphs" => &mut self.paragraphs,
            "TotalTime" => &mut self.total_time,
            "SharedDoc" => &mut self.shared_doc,
            "AppVersion" => &mut self.app_version,
            _ => return,
        };
        *slot = Some(value);
    }
}

/// Metadata extracted from an Office Open XML package.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct OoxmlMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "CoreProperty", skip_serializing_if = "CoreProperties::is_empty")]
    pub core: CoreProperties,
    #[serde(rename = "AppProperty", skip_serializing_if = "AppProperties::is_empty")]
    pub app: AppProperties,
}

pub struct OoxmlAnalyzer {
    fetcher: Fetcher,
    metadata: OoxmlMetadata,
}

impl OoxmlAnalyzer {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            metadata: OoxmlMetadata::default(),
        }
    }
}

#[async_trait]
impl Analyzer for OoxmlAnalyzer {
    async fn process(&mut self, url: &Url) -> Result<(), AnalyzeError> {
        let file = self.fetcher.fetch_document(url).await?;

        let mut metadata = parse_blocking(move || read_metadata(file)).await?;
        metadata.url = Some(url.to_string());

        self.metadata = metadata;
        Ok(())
    }

    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.metadata)
    }
}

/// Opens an Office package and reads its property parts. Only the central
/// directory and the two property parts are read from `source`.
pub fn read_metadata<R: Read + Seek>(source: R) -> Result<OoxmlMetadata, AnalyzeError> {
    let mut archive = ZipArchive::new(source)?;
    let mut metadata = OoxmlMetadata::default();

    if let Some(xml) = read_part(&mut archive, CORE_PART)? {
        for (element, value) in child_values(&xml)? {
            metadata.core.set(&element, value);
        }
    }
    if let Some(xml) = read_part(&mut archive, APP_PART)? {
        for (element, value) in child_values(&xml)? {
            metadata.app.set(&element, value);
        }
    }

    Ok(metadata)
}

// Reads one archive member, or None when the package doesn't have it
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, AnalyzeError> {
    let file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if file.size() > MAX_PART_BYTES {
        return Err(io::Error::new(io::ErrorKind::InvalidData, format!("{name} is too large")).into());
    }

    let mut bytes = Vec::new();
    file.take(MAX_PART_BYTES).read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

// Collects (local element name, text) for every direct child of the root
// element. Deeper elements (e.g. app.xml's HeadingPairs vectors) are skipped.
//
// Example:
//   <cp:coreProperties><dc:title>Plan</dc:title></cp:coreProperties>
//   -> [("title", "Plan")]
fn child_values(xml: &[u8]) -> Result<Vec<(String, String)>, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut values = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                if depth == 2 {
                    current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
            }
            Event::End(_) => {
                if depth == 2 {
                    current = None;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) if depth == 2 => {
                if let Some(element) = &current {
                    let value = t.unescape()?.trim().to_string();
                    if !value.is_empty() {
                        values.push((element.clone(), value));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::fixtures::{ooxml_bytes, APP_XML, CORE_XML};
    use std::io::Cursor;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_reads_core_and_app_properties() {
        let metadata = read_metadata(Cursor::new(ooxml_bytes(Some(CORE_XML), Some(APP_XML)))).unwrap();

        assert_eq!(metadata.core.title.as_deref(), Some("Budget & Plan"));
        assert_eq!(metadata.core.creator.as_deref(), Some("Jane Doe"));
        assert_eq!(metadata.core.last_modified_by.as_deref(), Some("John Roe"));
        assert_eq!(metadata.core.revision.as_deref(), Some("3"));
        assert_eq!(metadata.core.created.as_deref(), Some("2024-01-02T03:04:05Z"));
        assert_eq!(metadata.core.language, None);

        assert_eq!(metadata.app.application.as_deref(), Some("Microsoft Office Word"));
        assert_eq!(metadata.app.pages.as_deref(), Some("4"));
        assert_eq!(metadata.app.words.as_deref(), Some("1200"));
        assert_eq!(metadata.app.total_time.as_deref(), Some("12"));
        assert_eq!(metadata.app.company.as_deref(), Some("Acme"));
        assert_eq!(metadata.app.app_version.as_deref(), Some("16.0000"));
        assert_eq!(metadata.app.lines, None);
    }

    #[test]
    fn test_missing_parts_are_not_an_error() {
        let metadata = read_metadata(Cursor::new(ooxml_bytes(None, None))).unwrap();
        assert_eq!(metadata, OoxmlMetadata::default());

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_not_a_zip_is_rejected() {
        let err = read_metadata(Cursor::new(b"PK but not really")).unwrap_err();
        assert!(matches!(err, AnalyzeError::Archive(_)));
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        let bytes = ooxml_bytes(Some("<cp:coreProperties><dc:title>x</dc:creator>"), None);
        assert!(read_metadata(Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_nested_elements_are_ignored() {
        let values = child_values(APP_XML.as_bytes()).unwrap();
        assert!(values.iter().all(|(name, _)| name != "lpstr"));
        assert!(values.iter().any(|(name, value)| name == "Template" && value == "Normal.dotm"));
    }

    #[test]
    fn test_json_layout() {
        let mut metadata = read_metadata(Cursor::new(ooxml_bytes(Some(CORE_XML), None))).unwrap();
        metadata.url = Some("https://example.com/plan.docx".into());

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["url"], "https://example.com/plan.docx");
        assert_eq!(json["CoreProperty"]["lastModifiedBy"], "John Roe");
        assert!(json.get("AppProperty").is_none());
    }

    #[tokio::test]
    async fn test_process_downloads_and_analyzes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/deck.pptx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(ooxml_bytes(Some(CORE_XML), Some(APP_XML))))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/deck.pptx", server.uri())).unwrap();
        let fetcher = Fetcher::new(Duration::from_secs(5), 1024 * 1024).unwrap();
        let mut analyzer = OoxmlAnalyzer::new(fetcher);
        analyzer.process(&url).await.unwrap();

        let json: serde_json::Value = serde_json::from_slice(&analyzer.to_json().unwrap()).unwrap();
        assert_eq!(json["url"], url.as_str());
        assert_eq!(json["CoreProperty"]["title"], "Budget & Plan");
        assert_eq!(json["AppProperty"]["company"], "Acme");
    }
}
