//! @acp:module "Container Loader"
//! @acp:summary "Open REQIFZ bundles and parse the exchange document into an owned node tree"
//! @acp:domain reqif
//! @acp:layer io
//!
//! A REQIFZ bundle is a zip archive holding one `.reqif` XML document plus
//! optional attachments (images, OLE objects). Only the exchange document is
//! read; every other entry is ignored. The whole archive is read into memory
//! once, so no file handle outlives [`load_bundle`] on any exit path.

mod node;

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use zip::ZipArchive;

use crate::config::NamespaceConfig;
use crate::error::{ReqifError, Result};

pub use node::{RawChild, RawNode};

/// Extension of the exchange document inside a bundle
pub const EXCHANGE_EXTENSION: &str = ".reqif";

/// @acp:summary "Parsed exchange document owned by a single pipeline run"
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Bundle the document came from
    pub source: PathBuf,
    /// Archive entry name of the exchange document
    pub entry_name: String,
    /// Hex SHA-256 of the bundle bytes
    pub fingerprint: String,
    /// Root element (`REQ-IF`)
    pub root: RawNode,
    /// Non-fatal observations made while loading
    pub notes: Vec<ContainerNote>,
}

/// Recovered container-level observations
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContainerNote {
    /// More than one `.reqif` entry; the first one was used
    ExtraExchangeDocuments { used: String, ignored: Vec<String> },
    /// Root element lives in an unexpected namespace
    UnexpectedNamespace { found: Option<String>, expected: String },
    /// Rich-text values hold elements outside the XHTML namespace
    ForeignContentNamespace {
        found: Option<String>,
        expected: String,
        elements: usize,
    },
}

impl std::fmt::Display for ContainerNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerNote::ExtraExchangeDocuments { used, ignored } => write!(
                f,
                "archive holds {} extra .reqif entries, using '{}'",
                ignored.len(),
                used
            ),
            ContainerNote::UnexpectedNamespace { found, expected } => write!(
                f,
                "root namespace {} differs from expected '{}'",
                found.as_deref().unwrap_or("<none>"),
                expected
            ),
            ContainerNote::ForeignContentNamespace {
                found,
                expected,
                elements,
            } => write!(
                f,
                "{} rich-text element(s) in namespace {} instead of '{}'",
                elements,
                found.as_deref().unwrap_or("<none>"),
                expected
            ),
        }
    }
}

/// Load a bundle from disk and parse its exchange document.
pub fn load_bundle(path: &Path, namespaces: &NamespaceConfig) -> Result<RawDocument> {
    let bytes = std::fs::read(path).map_err(|e| ReqifError::Container {
        path: path.to_path_buf(),
        source: zip::result::ZipError::Io(e),
    })?;
    load_bundle_bytes(path, &bytes, namespaces)
}

/// Parse a bundle that is already in memory. `path` is only used for
/// diagnostics.
pub fn load_bundle_bytes(
    path: &Path,
    bytes: &[u8],
    namespaces: &NamespaceConfig,
) -> Result<RawDocument> {
    let fingerprint = format!("{:x}", Sha256::digest(bytes));

    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| ReqifError::Container {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut notes = Vec::new();
    let entry_name = find_exchange_entry(&mut archive, path, &mut notes)?;

    let xml = {
        let mut entry = archive
            .by_name(&entry_name)
            .map_err(|e| ReqifError::Container {
                path: path.to_path_buf(),
                source: e,
            })?;
        // declared size comes from the archive header; never reserve past the bundle size
        let mut buf = Vec::with_capacity(entry.size().min(bytes.len() as u64) as usize);
        entry.read_to_end(&mut buf).map_err(|e| ReqifError::Container {
            path: path.to_path_buf(),
            source: zip::result::ZipError::Io(e),
        })?;
        String::from_utf8(buf).map_err(|e| ReqifError::MalformedDocument {
            path: path.to_path_buf(),
            reason: format!("document is not valid UTF-8: {}", e),
        })?
    };

    let root = parse_document(path, &xml, namespaces, &mut notes)?;

    tracing::debug!(
        bundle = %path.display(),
        entry = %entry_name,
        "Parsed exchange document"
    );

    Ok(RawDocument {
        source: path.to_path_buf(),
        entry_name,
        fingerprint,
        root,
        notes,
    })
}

/// Parse exchange-document XML text into the owned node tree.
pub fn parse_document(
    path: &Path,
    xml: &str,
    namespaces: &NamespaceConfig,
    notes: &mut Vec<ContainerNote>,
) -> Result<RawNode> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| ReqifError::MalformedDocument {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "REQ-IF" {
        return Err(ReqifError::MalformedDocument {
            path: path.to_path_buf(),
            reason: format!(
                "expected root element REQ-IF, found {}",
                root.tag_name().name()
            ),
        });
    }

    let found = root.tag_name().namespace();
    if found != Some(namespaces.reqif.as_str()) {
        let note = ContainerNote::UnexpectedNamespace {
            found: found.map(str::to_string),
            expected: namespaces.reqif.clone(),
        };
        tracing::warn!(bundle = %path.display(), "{}", note);
        notes.push(note);
    }

    for note in foreign_content(&doc, &namespaces.xhtml) {
        tracing::warn!(bundle = %path.display(), "{}", note);
        notes.push(note);
    }

    Ok(RawNode::from_xml(root))
}

/// Group the top-level elements of every `THE-VALUE` whose namespace is not
/// the XHTML one, one note per foreign namespace in document order.
fn foreign_content(doc: &roxmltree::Document<'_>, xhtml: &str) -> Vec<ContainerNote> {
    let mut counts: indexmap::IndexMap<Option<&str>, usize> = indexmap::IndexMap::new();
    for value in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "THE-VALUE")
    {
        for child in value.children().filter(|c| c.is_element()) {
            let ns = child.tag_name().namespace();
            if ns != Some(xhtml) {
                *counts.entry(ns).or_default() += 1;
            }
        }
    }

    counts
        .into_iter()
        .map(|(found, elements)| ContainerNote::ForeignContentNamespace {
            found: found.map(str::to_string),
            expected: xhtml.to_string(),
            elements,
        })
        .collect()
}

fn find_exchange_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
    notes: &mut Vec<ContainerNote>,
) -> Result<String> {
    let mut candidates: Vec<String> = archive
        .file_names()
        .filter(|name| {
            !name.ends_with('/') && name.to_ascii_lowercase().ends_with(EXCHANGE_EXTENSION)
        })
        .map(str::to_string)
        .collect();

    // file_names() is unordered; keep archive order for determinism
    candidates.sort_by_key(|name| archive.index_for_name(name).unwrap_or(usize::MAX));

    let mut candidates = candidates.into_iter();
    let used = candidates
        .next()
        .ok_or_else(|| ReqifError::SchemaDocumentMissing {
            path: path.to_path_buf(),
        })?;

    let ignored: Vec<String> = candidates.collect();
    if !ignored.is_empty() {
        let note = ContainerNote::ExtraExchangeDocuments {
            used: used.clone(),
            ignored,
        };
        tracing::warn!(bundle = %path.display(), "{}", note);
        notes.push(note);
    }

    Ok(used)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<REQ-IF xmlns="http://www.omg.org/spec/ReqIF/20110401/reqif.xsd">
  <CORE-CONTENT><REQ-IF-CONTENT><SPEC-OBJECTS/></REQ-IF-CONTENT></CORE-CONTENT>
</REQ-IF>"#;

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn load(bytes: &[u8]) -> Result<RawDocument> {
        load_bundle_bytes(Path::new("test.reqifz"), bytes, &NamespaceConfig::default())
    }

    #[test]
    fn test_loads_document_and_ignores_attachments() {
        let bytes = zip_with(&[
            ("images/logo.png", &[0x89, 0x50, 0x4e, 0x47]),
            ("spec.reqif", MINIMAL.as_bytes()),
        ]);
        let doc = load(&bytes).unwrap();
        assert_eq!(doc.entry_name, "spec.reqif");
        assert_eq!(doc.root.name, "REQ-IF");
        assert!(doc.notes.is_empty());
        assert_eq!(doc.fingerprint.len(), 64);
    }

    #[test]
    fn test_not_an_archive() {
        let err = load(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ReqifError::Container { .. }));
    }

    #[test]
    fn test_missing_exchange_document() {
        let bytes = zip_with(&[("readme.txt", b"hello")]);
        let err = load(&bytes).unwrap_err();
        assert!(matches!(err, ReqifError::SchemaDocumentMissing { .. }));
    }

    #[test]
    fn test_malformed_xml() {
        let bytes = zip_with(&[("spec.reqif", b"<REQ-IF><unclosed></REQ-IF>")]);
        let err = load(&bytes).unwrap_err();
        assert!(matches!(err, ReqifError::MalformedDocument { .. }));
    }

    #[test]
    fn test_unknown_namespace_prefix_is_malformed() {
        let bytes = zip_with(&[("spec.reqif", b"<REQ-IF><html:p>x</html:p></REQ-IF>")]);
        let err = load(&bytes).unwrap_err();
        assert!(matches!(err, ReqifError::MalformedDocument { .. }));
    }

    #[test]
    fn test_wrong_root_is_malformed() {
        let bytes = zip_with(&[("spec.reqif", b"<NOT-REQIF/>")]);
        let err = load(&bytes).unwrap_err();
        assert!(matches!(err, ReqifError::MalformedDocument { .. }));
    }

    #[test]
    fn test_rich_text_outside_xhtml_is_noted() {
        let xml = r#"<REQ-IF xmlns="http://www.omg.org/spec/ReqIF/20110401/reqif.xsd" xmlns:html="http://www.w3.org/1999/xhtml" xmlns:x="urn:legacy">
  <THE-VALUE><html:div>ok</html:div></THE-VALUE>
  <THE-VALUE><x:div>a</x:div><x:p>b</x:p></THE-VALUE>
  <THE-VALUE><div>plain</div></THE-VALUE>
</REQ-IF>"#;
        let doc = load(&zip_with(&[("spec.reqif", xml.as_bytes())])).unwrap();
        assert_eq!(
            doc.notes,
            vec![
                ContainerNote::ForeignContentNamespace {
                    found: Some("urn:legacy".to_string()),
                    expected: "http://www.w3.org/1999/xhtml".to_string(),
                    elements: 2,
                },
                ContainerNote::ForeignContentNamespace {
                    found: Some("http://www.omg.org/spec/ReqIF/20110401/reqif.xsd".to_string()),
                    expected: "http://www.w3.org/1999/xhtml".to_string(),
                    elements: 1,
                },
            ]
        );
    }

    #[test]
    fn test_xhtml_namespace_is_configurable() {
        let xml = r#"<REQ-IF xmlns="http://www.omg.org/spec/ReqIF/20110401/reqif.xsd" xmlns:x="urn:legacy">
  <THE-VALUE><x:div>a</x:div></THE-VALUE>
</REQ-IF>"#;
        let namespaces = NamespaceConfig {
            xhtml: "urn:legacy".to_string(),
            ..NamespaceConfig::default()
        };
        let bytes = zip_with(&[("spec.reqif", xml.as_bytes())]);
        let doc = load_bundle_bytes(Path::new("test.reqifz"), &bytes, &namespaces).unwrap();
        assert!(doc.notes.is_empty());
    }

    #[test]
    fn test_extra_documents_and_foreign_namespace_are_noted() {
        let bytes = zip_with(&[
            ("a.reqif", b"<REQ-IF/>"),
            ("b.REQIF", MINIMAL.as_bytes()),
        ]);
        let doc = load(&bytes).unwrap();
        assert_eq!(doc.entry_name, "a.reqif");
        assert_eq!(doc.notes.len(), 2);
        assert!(matches!(
            doc.notes[0],
            ContainerNote::ExtraExchangeDocuments { .. }
        ));
        assert!(matches!(
            doc.notes[1],
            ContainerNote::UnexpectedNamespace { found: None, .. }
        ));
    }
}
