//! Record parser: uploaded CSV / spreadsheet bytes to contact records
//!
//! The schema is fixed: `FirstName`, `Phone` and optional `Notes`, matched
//! by exact (case-sensitive) header name. Any other column is ignored. Rows
//! missing a first name or phone are dropped without being reported; the
//! caller only sees the final count.

use calamine::{Data, Reader, Xls, Xlsx};
use listdist_common::db::ContactRecord;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use thiserror::Error;

pub const FIRST_NAME_COLUMN: &str = "FirstName";
pub const PHONE_COLUMN: &str = "Phone";
pub const NOTES_COLUMN: &str = "Notes";

/// Accepted upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Xlsx,
    Xls,
}

impl UploadFormat {
    /// Detect from the uploaded file name's extension (case-insensitive)
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_str()?;
        Self::from_extension(ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            _ => None,
        }
    }

    /// Detect from a declared MIME type (parameters such as `charset` ignored)
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
        match mime.as_str() {
            "text/csv" | "application/csv" => Some(Self::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some(Self::Xlsx),
            "application/vnd.ms-excel" => Some(Self::Xls),
            _ => None,
        }
    }

    /// Extension is authoritative: any extension outside the allowed set
    /// rejects the upload. The content type is consulted only when the file
    /// name has no extension at all.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Option<Self> {
        match file_name.filter(|name| Path::new(name).extension().is_some()) {
            Some(name) => Self::from_file_name(name),
            None => content_type.and_then(Self::from_content_type),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
        }
    }
}

/// Structural parse failure; aborts the whole upload
#[derive(Debug, Error)]
pub enum RecordParseError {
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unreadable spreadsheet: {0}")]
    Spreadsheet(String),
}

/// Parse an uploaded file into records, in row order
///
/// Zero valid rows is `Ok(vec![])`, not an error.
pub fn parse_records(
    bytes: &[u8],
    format: UploadFormat,
) -> Result<Vec<ContactRecord>, RecordParseError> {
    match format {
        UploadFormat::Csv => parse_csv(bytes),
        UploadFormat::Xlsx => {
            let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| RecordParseError::Spreadsheet(e.to_string()))?;
            first_sheet_records(workbook)
        }
        UploadFormat::Xls => {
            let workbook: Xls<_> = Xls::new(Cursor::new(bytes))
                .map_err(|e| RecordParseError::Spreadsheet(e.to_string()))?;
            first_sheet_records(workbook)
        }
    }
}

/// Column positions resolved once from the header row
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ColumnIndex {
    first_name: Option<usize>,
    phone: Option<usize>,
    notes: Option<usize>,
}

impl ColumnIndex {
    /// First occurrence of each column name wins
    fn from_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        for (i, header) in headers.into_iter().enumerate() {
            // UTF-8 BOM only ever precedes the first header cell
            let name = header.as_ref().trim_start_matches('\u{feff}');
            let slot = match name {
                FIRST_NAME_COLUMN => &mut index.first_name,
                PHONE_COLUMN => &mut index.phone,
                NOTES_COLUMN => &mut index.notes,
                _ => continue,
            };
            slot.get_or_insert(i);
        }
        index
    }

    /// Without both required columns no row can qualify
    fn has_required(&self) -> bool {
        self.first_name.is_some() && self.phone.is_some()
    }

    fn extract<'a, F>(&self, cell: F) -> Option<ContactRecord>
    where
        F: Fn(usize) -> Option<&'a str>,
    {
        let get = |col: Option<usize>| col.and_then(&cell);
        ContactRecord::new(get(self.first_name), get(self.phone), get(self.notes))
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<ContactRecord>, RecordParseError> {
    // flexible: short or long rows are tolerated, missing cells read as absent
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let columns = ColumnIndex::from_headers(reader.headers()?.iter());

    let mut records = Vec::new();
    for row in reader.records() {
        // A malformed row aborts everything, even if the columns are missing
        let row = row?;
        if !columns.has_required() {
            continue;
        }
        if let Some(record) = columns.extract(|i| row.get(i)) {
            records.push(record);
        }
    }

    Ok(records)
}

fn first_sheet_records<RS, R>(mut workbook: R) -> Result<Vec<ContactRecord>, RecordParseError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| RecordParseError::Spreadsheet(e.to_string()))?,
        None => return Ok(Vec::new()),
    };

    let mut rows = range.rows();
    let columns = match rows.next() {
        Some(header) => {
            ColumnIndex::from_headers(header.iter().map(|c| cell_to_text(c).unwrap_or_default()))
        }
        None => return Ok(Vec::new()),
    };

    if !columns.has_required() {
        return Ok(Vec::new());
    }

    let records = rows
        .filter_map(|row| {
            let cells: Vec<Option<String>> = row.iter().map(cell_to_text).collect();
            columns.extract(|i| cells.get(i).and_then(|c| c.as_deref()))
        })
        .collect();

    Ok(records)
}

/// Render a spreadsheet cell as text
///
/// Whole-number floats print without a fractional part, so a phone number
/// stored as `5551234.0` comes back as `5551234`. Empty and error cells are
/// absent.
pub fn cell_to_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_float(*f)),
        other => Some(other.to_string()),
    }
}

fn format_float(f: f64) -> String {
    // 2^53: beyond this an f64 no longer holds every integer exactly
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    if f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(records: &[ContactRecord]) -> Vec<&str> {
        records.iter().map(|r| r.first_name()).collect()
    }

    #[test]
    fn test_format_detection_by_extension() {
        assert_eq!(UploadFormat::from_file_name("leads.csv"), Some(UploadFormat::Csv));
        assert_eq!(UploadFormat::from_file_name("LEADS.XLSX"), Some(UploadFormat::Xlsx));
        assert_eq!(UploadFormat::from_file_name("old.xls"), Some(UploadFormat::Xls));
        assert_eq!(UploadFormat::from_file_name("notes.txt"), None);
        assert_eq!(UploadFormat::from_file_name("csv"), None);
    }

    #[test]
    fn test_format_detection_falls_back_to_content_type() {
        assert_eq!(
            UploadFormat::detect(None, Some("text/csv; charset=utf-8")),
            Some(UploadFormat::Csv)
        );
        assert_eq!(
            UploadFormat::detect(Some("upload"), Some("application/vnd.ms-excel")),
            Some(UploadFormat::Xls)
        );
        // Extension wins over a conflicting content type
        assert_eq!(
            UploadFormat::detect(Some("a.csv"), Some("application/vnd.ms-excel")),
            Some(UploadFormat::Csv)
        );
        assert_eq!(UploadFormat::detect(Some("a.pdf"), Some("application/pdf")), None);
    }

    #[test]
    fn test_unlisted_extension_ignores_content_type() {
        assert_eq!(UploadFormat::detect(Some("contacts.txt"), Some("text/csv")), None);
        assert_eq!(
            UploadFormat::detect(Some("report.pdf"), Some("application/vnd.ms-excel")),
            None
        );
        assert_eq!(
            UploadFormat::detect(Some("leads.CSV.bak"), Some("text/csv")),
            None
        );
        // No extension at all: the declared type decides
        assert_eq!(
            UploadFormat::detect(Some("leads"), Some("text/csv")),
            Some(UploadFormat::Csv)
        );
    }

    #[test]
    fn test_csv_basic_rows_in_order() {
        let csv = "FirstName,Phone,Notes\nJohn,123,VIP\nSarah,456,\nMike,789,lead\n";
        let records = parse_records(csv.as_bytes(), UploadFormat::Csv).unwrap();

        assert_eq!(names(&records), vec!["John", "Sarah", "Mike"]);
        assert_eq!(records[0].notes(), "VIP");
        assert_eq!(records[1].notes(), "");
        assert_eq!(records[2].phone(), "789");
    }

    #[test]
    fn test_csv_drops_rows_missing_required_fields() {
        let csv = "FirstName,Phone,Notes\nJohn,123,a\n,456,b\nMike,,c\n  ,  ,d\nAnna,999,e\n";
        let records = parse_records(csv.as_bytes(), UploadFormat::Csv).unwrap();
        assert_eq!(names(&records), vec!["John", "Anna"]);
    }

    #[test]
    fn test_csv_column_order_and_extra_columns() {
        let csv = "Id,Phone,Email,FirstName\n1,555-0100,a@x.com,Zoe\n";
        let records = parse_records(csv.as_bytes(), UploadFormat::Csv).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].first_name(), "Zoe");
        assert_eq!(records[0].phone(), "555-0100");
        assert_eq!(records[0].notes(), "");
    }

    #[test]
    fn test_csv_headers_are_case_sensitive() {
        let csv = "firstname,phone\nJohn,123\n";
        let records = parse_records(csv.as_bytes(), UploadFormat::Csv).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_csv_missing_phone_column_yields_empty() {
        let csv = "FirstName,Notes\nJohn,hello\n";
        let records = parse_records(csv.as_bytes(), UploadFormat::Csv).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_csv_keeps_phone_text_verbatim() {
        let csv = "FirstName,Phone\nJohn,007123\nSarah,+1 (555) 010\n";
        let records = parse_records(csv.as_bytes(), UploadFormat::Csv).unwrap();
        assert_eq!(records[0].phone(), "007123");
        assert_eq!(records[1].phone(), "+1 (555) 010");
    }

    #[test]
    fn test_csv_trims_values_and_handles_quotes() {
        let csv = "FirstName,Phone,Notes\n\"  John  \",\" 123 \",\"likes, commas\"\n";
        let records = parse_records(csv.as_bytes(), UploadFormat::Csv).unwrap();
        assert_eq!(records[0].first_name(), "John");
        assert_eq!(records[0].phone(), "123");
        assert_eq!(records[0].notes(), "likes, commas");
    }

    #[test]
    fn test_csv_short_rows_tolerated() {
        let csv = "FirstName,Phone,Notes\nJohn,123\nSarah\n";
        let records = parse_records(csv.as_bytes(), UploadFormat::Csv).unwrap();
        assert_eq!(names(&records), vec!["John"]);
        assert_eq!(records[0].notes(), "");
    }

    #[test]
    fn test_csv_strips_utf8_bom() {
        let csv = "\u{feff}FirstName,Phone\nJohn,123\n";
        let records = parse_records(csv.as_bytes(), UploadFormat::Csv).unwrap();
        assert_eq!(names(&records), vec!["John"]);
    }

    #[test]
    fn test_csv_empty_file_yields_empty() {
        let records = parse_records(b"", UploadFormat::Csv).unwrap();
        assert!(records.is_empty());

        let records = parse_records(b"FirstName,Phone,Notes\n", UploadFormat::Csv).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_csv_invalid_utf8_is_parse_error() {
        let bytes = b"FirstName,Phone\nJo\xffhn,123\n";
        let err = parse_records(bytes, UploadFormat::Csv).unwrap_err();
        assert!(matches!(err, RecordParseError::Csv(_)));
    }

    #[test]
    fn test_parse_is_restartable() {
        let csv = b"FirstName,Phone\nA,1\nB,2\n";
        let first = parse_records(csv, UploadFormat::Csv).unwrap();
        let second = parse_records(csv, UploadFormat::Csv).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupt_spreadsheet_is_parse_error() {
        let garbage = b"this is not a zip archive";
        assert!(matches!(
            parse_records(garbage, UploadFormat::Xlsx),
            Err(RecordParseError::Spreadsheet(_))
        ));
        assert!(matches!(
            parse_records(garbage, UploadFormat::Xls),
            Err(RecordParseError::Spreadsheet(_))
        ));
    }

    #[test]
    fn test_cell_to_text_numeric_phone() {
        assert_eq!(cell_to_text(&Data::Float(5551234.0)).as_deref(), Some("5551234"));
        assert_eq!(cell_to_text(&Data::Float(9876543210.0)).as_deref(), Some("9876543210"));
        assert_eq!(cell_to_text(&Data::Int(42)).as_deref(), Some("42"));
        assert_eq!(cell_to_text(&Data::Float(12.5)).as_deref(), Some("12.5"));
    }

    #[test]
    fn test_cell_to_text_strings_and_blanks() {
        assert_eq!(cell_to_text(&Data::String("John".into())).as_deref(), Some("John"));
        assert_eq!(cell_to_text(&Data::Bool(true)).as_deref(), Some("true"));
        assert_eq!(cell_to_text(&Data::Empty), None);
    }

    #[test]
    fn test_column_index_first_occurrence_wins() {
        let index = ColumnIndex::from_headers(["Phone", "FirstName", "Phone", "Notes"]);
        assert_eq!(
            index,
            ColumnIndex {
                first_name: Some(1),
                phone: Some(0),
                notes: Some(3),
            }
        );
    }
}
