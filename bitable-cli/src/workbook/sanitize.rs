//! Repair for worksheet XML that strict readers reject
//!
//! Some export tools write an unprefixed `id` attribute on worksheet elements
//! (`<row id="..">`, `<c id="..">`). It is not part of the SpreadsheetML schema
//! and makes the reader fail. Rewriting the archive without those attributes
//! leaves everything else untouched; namespaced attributes such as `r:id` are
//! kept.

use anyhow::{Context, Result};
use quick_xml::Reader as XmlReader;
use quick_xml::Writer as XmlWriter;
use quick_xml::events::{BytesStart, Event};
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Returns true for worksheet parts inside an xlsx package
fn is_worksheet_part(name: &str) -> bool {
    name.starts_with("xl/worksheets/") && name.ends_with(".xml")
}

/// Rewrite an xlsx package, removing `id` attributes from every worksheet part
pub fn strip_worksheet_ids(package: &[u8]) -> Result<Vec<u8>> {
    let mut archive =
        ZipArchive::new(Cursor::new(package)).context("Workbook is not a zip package")?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);
    let mut rewritten = 0usize;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).context("Failed to read zip entry")?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .with_context(|| format!("Failed to read part {}", name))?;

        if is_worksheet_part(&name) {
            buf = strip_id_attributes(&buf)
                .with_context(|| format!("Failed to rewrite worksheet part {}", name))?;
            rewritten += 1;
        }

        writer
            .start_file(name.as_str(), options)
            .with_context(|| format!("Failed to write zip entry header {}", name))?;
        writer
            .write_all(&buf)
            .with_context(|| format!("Failed to write zip entry {}", name))?;
    }

    let cursor = writer.finish().context("Failed to finalize zip package")?;
    log::debug!("Stripped id attributes from {} worksheet part(s)", rewritten);
    Ok(cursor.into_inner())
}

/// Copy an XML document, dropping unprefixed `id` attributes from all elements
pub fn strip_id_attributes(xml: &[u8]) -> Result<Vec<u8>> {
    let mut reader = XmlReader::from_reader(xml);
    let mut writer = XmlWriter::new(Vec::with_capacity(xml.len()));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).context("Malformed worksheet XML")? {
            Event::Eof => break,
            Event::Start(e) => writer.write_event(Event::Start(without_id(&e)?))?,
            Event::Empty(e) => writer.write_event(Event::Empty(without_id(&e)?))?,
            event => writer.write_event(event)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn without_id(elem: &BytesStart<'_>) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    let mut cleaned = BytesStart::new(name);
    for attr in elem.attributes().with_checks(false) {
        let attr = attr.context("Malformed attribute in worksheet XML")?;
        if attr.key.as_ref() == b"id" {
            continue;
        }
        cleaned.push_attribute(attr);
    }
    Ok(cleaned)
}
