//! MXL container handling: reads compressed MusicXML (.mxl) archives.
//!
//! An .mxl file is a ZIP archive containing:
//!   - META-INF/container.xml: declares the root MusicXML file path
//!   - <rootfile>.xml        : the actual MusicXML content (e.g., score.xml)
//!   - (optional) other files: images, sounds, etc.

use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::{FingerboardError, Result};
use crate::model::Timeline;
use crate::parser;

/// Read and decode a .mxl file from raw bytes.
pub fn parse_mxl(data: &[u8]) -> Result<Timeline> {
    let xml = extract_musicxml_from_mxl(data)?;
    parser::parse_musicxml(&xml)
}

/// Extract the MusicXML content string from .mxl bytes.
pub fn extract_musicxml_from_mxl(data: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| FingerboardError::Archive(format!("failed to open archive: {e}")))?;

    let root_file_path = find_root_file(&mut archive)?;

    let mut root_file = archive.by_name(&root_file_path).map_err(|e| {
        FingerboardError::Archive(format!("root file '{root_file_path}' not found: {e}"))
    })?;
    let mut xml = String::new();
    root_file
        .read_to_string(&mut xml)
        .map_err(|e| FingerboardError::Archive(format!("failed to read '{root_file_path}': {e}")))?;

    Ok(xml)
}

/// Rootfile declared in META-INF/container.xml, else the first
/// .xml/.musicxml entry outside META-INF.
fn find_root_file(archive: &mut ZipArchive<Cursor<&[u8]>>) -> Result<String> {
    let container_xml = match archive.by_name("META-INF/container.xml") {
        Ok(mut container_file) => {
            let mut xml = String::new();
            container_file.read_to_string(&mut xml).map_err(|e| {
                FingerboardError::Archive(format!("failed to read container.xml: {e}"))
            })?;
            Some(xml)
        }
        Err(_) => None,
    };

    if let Some(xml) = container_xml {
        let doc = roxmltree::Document::parse(&xml)
            .map_err(|e| FingerboardError::Archive(format!("invalid container.xml: {e}")))?;
        return doc
            .descendants()
            .filter(|n| n.has_tag_name("rootfile"))
            .find_map(|n| n.attribute("full-path"))
            .map(String::from)
            .ok_or_else(|| FingerboardError::Archive("no rootfile in container.xml".into()));
    }

    let names: Vec<String> = archive.file_names().map(String::from).collect();
    names
        .iter()
        .find(|name| {
            !name.starts_with("META-INF/") && (name.ends_with(".xml") || name.ends_with(".musicxml"))
        })
        .cloned()
        .ok_or_else(|| {
            FingerboardError::Archive(format!("no MusicXML file in archive, entries: {names:?}"))
        })
}
