use std::fmt::Debug;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use super::report::{normalize_symbols, EligibilityReport};

/// Opaque document payload produced from report lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub file_name: String,
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("report has no lines to render")]
    EmptyReport,
    #[error("document renderer failed: {0}")]
    Backend(String),
}

pub trait DocumentRenderer: Debug + Send + Sync {
    fn render(&self, report: &EligibilityReport) -> Result<RenderedDocument, RenderError>;
}

/// Download name used for a report generated at `generated_at`.
pub fn report_file_name(generated_at: DateTime<Utc>) -> String {
    format!("report_{}.pdf", generated_at.format("%Y%m%d_%H%M%S"))
}

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 50;
const FONT_SIZE: u32 = 12;
const LEADING: u32 = 16;
const WRAP_COLUMNS: usize = 88;

/// Single-font text PDF. Helvetica's built-in encoding only covers ASCII
/// reliably, so every line is normalized and anything left over becomes `?`.
#[derive(Debug, Clone, Default)]
pub struct PdfReportRenderer;

impl DocumentRenderer for PdfReportRenderer {
    fn render(&self, report: &EligibilityReport) -> Result<RenderedDocument, RenderError> {
        if report.lines.is_empty() {
            return Err(RenderError::EmptyReport);
        }

        let lines: Vec<String> = report
            .lines
            .iter()
            .flat_map(|line| wrap(&ascii_only(&line.text()), WRAP_COLUMNS))
            .collect();

        let lines_per_page = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;
        let pages: Vec<String> = lines
            .chunks(lines_per_page)
            .map(page_content)
            .collect();

        Ok(RenderedDocument {
            file_name: report_file_name(report.generated_at),
            content_type: mime::APPLICATION_PDF,
            bytes: assemble_pdf(&pages),
        })
    }
}

fn ascii_only(text: &str) -> String {
    normalize_symbols(text)
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in text.split(' ') {
        if !current.is_empty() && current.len() + 1 + word.len() > columns {
            wrapped.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
        while current.len() > columns {
            let rest = current.split_off(columns);
            wrapped.push(std::mem::replace(&mut current, rest));
        }
    }
    wrapped.push(current);
    wrapped
}

fn escape_pdf_text(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn page_content(lines: &[String]) -> String {
    let mut content = String::new();
    writeln!(
        content,
        "BT /F1 {FONT_SIZE} Tf {LEADING} TL {MARGIN} {} Td",
        PAGE_HEIGHT - MARGIN
    )
    .expect("write text header");
    for line in lines {
        writeln!(content, "({}) Tj T*", escape_pdf_text(line)).expect("write text line");
    }
    content.push_str("ET\n");
    content
}

fn assemble_pdf(pages: &[String]) -> Vec<u8> {
    // Objects: 1 catalog, 2 page tree, 3 font, then a page/content pair per page.
    let mut objects: Vec<String> = Vec::with_capacity(3 + pages.len() * 2);
    let kids = (0..pages.len())
        .map(|index| format!("{} 0 R", 4 + index * 2))
        .collect::<Vec<_>>()
        .join(" ");

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{kids}] /Count {} >>",
        pages.len()
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

    for (index, content) in pages.iter().enumerate() {
        let content_id = 5 + index * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}endstream",
            content.len()
        ));
    }

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        write!(pdf, "{} 0 obj\n{body}\nendobj\n", index + 1).expect("write object");
    }

    let xref_offset = pdf.len();
    write!(pdf, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).expect("write xref");
    for offset in offsets {
        writeln!(pdf, "{offset:010} 00000 n ").expect("write xref entry");
    }
    write!(
        pdf,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    )
    .expect("write trailer");

    pdf.into_bytes()
}
