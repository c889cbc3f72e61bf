//! Rendering of analytics results as downloadable CSV or PDF files.
//!
//! Records are flattened through `serde_json` so every result type exports
//! the same way: the first record's field names become the CSV header, and
//! the PDF lists each record's `key: value` pairs.

use std::str::FromStr;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const LEADING: i64 = 16;
const BODY_SIZE: i64 = 12;
const TITLE_SIZE: i64 = 18;
/// Body characters that fit between the margins, at half the font size each
const LINE_CHARS: usize = ((PAGE_WIDTH - 2 * MARGIN) / (BODY_SIZE / 2)) as usize;
const CONTINUATION_INDENT: &str = "    ";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format '{0}'. Supported formats: csv, pdf")]
    UnsupportedFormat(String),

    #[error("Record {0} is not an object")]
    NotAnObject(usize),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("PDF export failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Export I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// A rendered export ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name)
    }
}

pub fn export_records<T: Serialize>(
    records: &[T],
    name: &str,
    format: ExportFormat,
) -> Result<ExportFile, ExportError> {
    let rows = to_rows(records)?;
    let bytes = match format {
        ExportFormat::Csv => render_csv(&rows)?,
        ExportFormat::Pdf => render_pdf(&rows, name)?,
    };

    Ok(ExportFile {
        file_name: format!("{}.{}", name, format.extension()),
        format,
        bytes,
    })
}

fn to_rows<T: Serialize>(records: &[T]) -> Result<Vec<Map<String, Value>>, ExportError> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| match serde_json::to_value(record)? {
            Value::Object(row) => Ok(row),
            _ => Err(ExportError::NotAnObject(idx + 1)),
        })
        .collect()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_csv(rows: &[Map<String, Value>]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if let Some(first) = rows.first() {
        let headers: Vec<&String> = first.keys().collect();
        writer.write_record(&headers)?;

        for row in rows {
            writer.write_record(
                headers
                    .iter()
                    .map(|key| row.get(key.as_str()).map(cell).unwrap_or_default()),
            )?;
        }
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// The base-14 fonts only cover ASCII reliably.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

/// Splits a body line into pieces of at most `LINE_CHARS` characters.
/// Continuation pieces are indented.
fn wrap(line: &str) -> Vec<String> {
    let chars: Vec<char> = printable(line).chars().collect();
    if chars.len() <= LINE_CHARS {
        return vec![chars.into_iter().collect()];
    }

    let (head, mut rest) = chars.split_at(LINE_CHARS);
    let mut pieces = vec![head.iter().collect::<String>()];
    let width = LINE_CHARS - CONTINUATION_INDENT.len();
    while !rest.is_empty() {
        let (piece, tail) = rest.split_at(width.min(rest.len()));
        pieces.push(format!(
            "{}{}",
            CONTINUATION_INDENT,
            piece.iter().collect::<String>()
        ));
        rest = tail;
    }
    pieces
}

fn page_operations(title: Option<&str>, lines: &[String]) -> Vec<Operation> {
    let mut ops = Vec::new();
    let mut top = PAGE_HEIGHT - MARGIN;

    if let Some(title) = title {
        let title = printable(title);
        // Helvetica glyphs average about half the font size in width
        let width = title.len() as i64 * TITLE_SIZE / 2;
        let x = ((PAGE_WIDTH - width) / 2).max(MARGIN);
        ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(TITLE_SIZE)]),
            Operation::new("Td", vec![Object::Integer(x), Object::Integer(top)]),
            Operation::new("Tj", vec![Object::string_literal(title)]),
            Operation::new("ET", vec![]),
        ]);
        top -= 2 * LEADING;
    }

    ops.extend([
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), Object::Integer(BODY_SIZE)]),
        Operation::new("TL", vec![Object::Integer(LEADING)]),
        Operation::new("Td", vec![Object::Integer(MARGIN), Object::Integer(top)]),
    ]);
    for line in lines {
        ops.push(Operation::new("Tj", vec![Object::string_literal(printable(line))]));
        ops.push(Operation::new("T*", vec![]));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

fn render_pdf(rows: &[Map<String, Value>], name: &str) -> Result<Vec<u8>, ExportError> {
    let mut lines = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        lines.push(format!("Record {}:", idx + 1));
        for (key, value) in row {
            lines.extend(wrap(&format!("  {}: {}", key, cell(value))));
        }
        lines.push(String::new());
    }

    let lines_per_page = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;
    let title = format!("{} Report", name);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    let mut remaining = lines.as_slice();
    loop {
        let first_page = kids.is_empty();
        // the title takes two lines on the first page
        let capacity = if first_page {
            lines_per_page - 2
        } else {
            lines_per_page
        };
        let (chunk, rest) = remaining.split_at(capacity.min(remaining.len()));

        let content = Content {
            operations: page_operations(first_page.then_some(title.as_str()), chunk),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());

        remaining = rest;
        if remaining.is_empty() {
            break;
        }
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(page_count),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlatformStats, SkillCount};

    fn skills(n: usize) -> Vec<SkillCount> {
        (0..n)
            .map(|i| SkillCount {
                skill: format!("skill-{}", i),
                count: (n - i) as u64,
            })
            .collect()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(" PDF ".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!(matches!(
            "xlsx".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(f)) if f == "xlsx"
        ));
    }

    #[test]
    fn test_csv_uses_first_record_field_order() {
        let stats = PlatformStats {
            total_users: 10,
            total_freelancers: 6,
            total_clients: 3,
            total_projects: 4,
            total_bids: 12,
            total_reviews: 2,
            completed_projects: 1,
        };

        let file = export_records(&[stats], "platform_stats", ExportFormat::Csv).unwrap();
        assert_eq!(file.file_name, "platform_stats.csv");
        assert_eq!(
            String::from_utf8(file.bytes).unwrap(),
            "totalUsers,totalFreelancers,totalClients,totalProjects,totalBids,totalReviews,completedProjects\n\
             10,6,3,4,12,2,1\n"
        );
    }

    #[test]
    fn test_csv_renders_renamed_keys_and_quotes() {
        let rows = vec![SkillCount {
            skill: "ui, ux".to_string(),
            count: 3,
        }];
        let file = export_records(&rows, "skill_popularity", ExportFormat::Csv).unwrap();
        assert_eq!(
            String::from_utf8(file.bytes).unwrap(),
            "_id,count\n\"ui, ux\",3\n"
        );
    }

    #[test]
    fn test_csv_of_empty_result_is_empty() {
        let file = export_records::<SkillCount>(&[], "skill_popularity", ExportFormat::Csv).unwrap();
        assert!(file.bytes.is_empty());
    }

    #[test]
    fn test_non_object_records_are_rejected() {
        let result = export_records(&[1, 2], "numbers", ExportFormat::Csv);
        assert!(matches!(result, Err(ExportError::NotAnObject(1))));
    }

    #[test]
    fn test_pdf_lists_records() {
        let file = export_records(&skills(2), "skill_popularity", ExportFormat::Pdf).unwrap();
        assert_eq!(file.file_name, "skill_popularity.pdf");
        assert_eq!(file.format.content_type(), "application/pdf");
        assert!(file.bytes.starts_with(b"%PDF-1.5"));

        let text = String::from_utf8_lossy(&file.bytes);
        assert!(text.contains("(skill_popularity Report)"));
        assert!(text.contains("(Record 1:)"));
        assert!(text.contains("(  _id: skill-0)"));
        assert!(text.contains("(Record 2:)"));

        let doc = Document::load_mem(&file.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_pdf_paginates_long_exports() {
        // four lines per record overflows a single page
        let file = export_records(&skills(40), "skill_popularity", ExportFormat::Pdf).unwrap();
        let doc = Document::load_mem(&file.bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn test_pdf_of_empty_result_has_title_page() {
        let file = export_records::<SkillCount>(&[], "signup_trends", ExportFormat::Pdf).unwrap();
        let doc = Document::load_mem(&file.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_long_values_wrap_within_margins() {
        let long = "x".repeat(200);
        let pieces = wrap(&format!("  _id: {}", long));

        assert_eq!(LINE_CHARS, 82);
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|piece| piece.len() <= LINE_CHARS));
        assert!(pieces[1].starts_with(CONTINUATION_INDENT));
        let joined: String = pieces.iter().map(|piece| piece.trim_start()).collect();
        assert_eq!(joined, format!("_id: {}", long));

        assert_eq!(wrap("  count: 3"), vec!["  count: 3".to_string()]);
    }

    #[test]
    fn test_pdf_wraps_long_skill_names() {
        let rows = vec![SkillCount {
            skill: "y".repeat(150),
            count: 1,
        }];
        let file = export_records(&rows, "skill_popularity", ExportFormat::Pdf).unwrap();
        let text = String::from_utf8_lossy(&file.bytes);
        assert!(!text.contains(&"y".repeat(LINE_CHARS)));
        assert!(text.contains(&format!("({}{})", CONTINUATION_INDENT, "y".repeat(75))));
    }

    #[test]
    fn test_printable_replaces_non_ascii() {
        assert_eq!(printable("café\t"), "caf??");
    }
}
