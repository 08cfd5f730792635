use anyhow::Context;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";
const RELS_ENTRY: &str = "_rels/.rels";
const DOCUMENT_ENTRY: &str = "word/document.xml";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // XML 1.0 forbids most control characters outright.
            c if (c as u32) < 0x20 && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

fn paragraph(line: &str, bold: bool) -> String {
    if line.is_empty() {
        return "<w:p/>".to_string();
    }
    let props = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    format!(
        r#"<w:p><w:r>{props}<w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        xml_escape(line)
    )
}

pub(crate) fn document_xml(text: &str) -> String {
    let mut body = String::new();
    for (i, line) in text.lines().enumerate() {
        body.push_str(&paragraph(line, i == 0));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
    )
}

/// Builds a .docx package with one paragraph per line; the first line is bold.
pub fn docx_bytes(text: &str) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(CONTENT_TYPES_ENTRY, opts)
        .context("failed to start content types entry")?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())
        .context("failed to write content types entry")?;

    zip.start_file(RELS_ENTRY, opts)
        .context("failed to start relationships entry")?;
    zip.write_all(RELS_XML.as_bytes())
        .context("failed to write relationships entry")?;

    zip.start_file(DOCUMENT_ENTRY, opts)
        .context("failed to start document entry")?;
    zip.write_all(document_xml(text).as_bytes())
        .context("failed to write document entry")?;

    let cursor = zip.finish().context("failed to finalize docx package")?;
    Ok(cursor.into_inner())
}
