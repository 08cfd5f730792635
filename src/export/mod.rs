mod docx;
mod pdf;

pub use docx::docx_bytes;
pub use pdf::pdf_bytes;

use anyhow::Context;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Some(ExportFormat::Txt),
            "pdf" => Some(ExportFormat::Pdf),
            "docx" | "word" => Some(ExportFormat::Docx),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub format: ExportFormat,
    pub bytes: usize,
}

pub fn render_bytes(format: ExportFormat, text: &str) -> anyhow::Result<Vec<u8>> {
    match format {
        ExportFormat::Txt => Ok(text.as_bytes().to_vec()),
        ExportFormat::Pdf => Ok(pdf_bytes(text)),
        ExportFormat::Docx => docx_bytes(text),
    }
}

pub fn write_export(
    format: ExportFormat,
    text: &str,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let bytes = render_bytes(format, text)?;
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    std::fs::write(out_path, &bytes).with_context(|| {
        format!(
            "failed to write {} export {}",
            format.as_str(),
            out_path.to_string_lossy()
        )
    })?;
    log::info!(
        "exported {} bytes as {} to {}",
        bytes.len(),
        format.as_str(),
        out_path.to_string_lossy()
    );
    Ok(ExportSummary {
        format,
        bytes: bytes.len(),
    })
}
