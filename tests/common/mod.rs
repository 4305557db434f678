//! Shared helpers for integration tests

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Exchange document with two features: door control and window control
pub const DOOR_WINDOW_XML: &str = include_str!("../fixtures/door_window.reqif");

/// Zip archive bytes holding the given `(entry name, content)` pairs
pub fn bundle_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Write a bundle into `dir` and return its path
pub fn write_bundle(dir: &Path, file_name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, bundle_bytes(entries)).unwrap();
    path
}

/// The door/window fixture packed as a bundle in `dir`
pub fn door_window_bundle(dir: &Path) -> PathBuf {
    write_bundle(
        dir,
        "door_window.reqifz",
        &[("automotive_door_window_system.reqif", DOOR_WINDOW_XML)],
    )
}

/// Minimal exchange document with one requirement per markup fragment.
///
/// Objects are `obj-0`, `obj-1`, ... of type "System Requirements" and
/// carry no foreign id.
pub fn requirements_xml(contents: &[&str]) -> String {
    let objects: String = contents
        .iter()
        .enumerate()
        .map(|(i, content)| {
            format!(
                r#"<SPEC-OBJECT IDENTIFIER="obj-{i}">
  <TYPE><SPEC-OBJECT-TYPE-REF>req-type</SPEC-OBJECT-TYPE-REF></TYPE>
  <VALUES>
    <ATTRIBUTE-VALUE-XHTML>
      <DEFINITION><ATTRIBUTE-DEFINITION-XHTML-REF>req-text</ATTRIBUTE-DEFINITION-XHTML-REF></DEFINITION>
      <THE-VALUE>{content}</THE-VALUE>
    </ATTRIBUTE-VALUE-XHTML>
  </VALUES>
</SPEC-OBJECT>
"#
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<REQ-IF xmlns="http://www.omg.org/spec/ReqIF/20110401/reqif.xsd" xmlns:html="http://www.w3.org/1999/xhtml">
  <CORE-CONTENT>
    <REQ-IF-CONTENT>
      <SPEC-TYPES>
        <SPEC-OBJECT-TYPE IDENTIFIER="req-type" LONG-NAME="System Requirements">
          <SPEC-ATTRIBUTES>
            <ATTRIBUTE-DEFINITION-XHTML IDENTIFIER="req-text" LONG-NAME="ReqIF.Text"/>
          </SPEC-ATTRIBUTES>
        </SPEC-OBJECT-TYPE>
      </SPEC-TYPES>
      <SPEC-OBJECTS>
{objects}      </SPEC-OBJECTS>
    </REQ-IF-CONTENT>
  </CORE-CONTENT>
</REQ-IF>
"#
    )
}
