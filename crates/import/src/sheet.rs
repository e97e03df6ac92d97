use std::io::Cursor;

use calamine::{Data, Reader};

use crate::error::ImportError;

/// A single spreadsheet cell, reduced to the three shapes the pipeline
/// cares about. Numbers are kept numeric so Excel date serials survive
/// until date parsing; everything else is text.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

const EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Trimmed text rendering. Whole numbers print without a trailing `.0`
    /// so numeric transaction ids round-trip as the user typed them.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }
}

/// One data row plus its 1-based source row number (header is row 1), kept
/// for user-facing messages.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: u32,
    pub cells: Vec<Cell>,
}

impl RawRow {
    /// Cell at `idx`, treating anything past the row's end as empty.
    pub fn cell(&self, idx: usize) -> &Cell {
        self.cells.get(idx).unwrap_or(&EMPTY_CELL)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }
}

/// First worksheet of an upload: header row separated from data rows.
/// The reader never conflates the two — downstream code indexes data rows
/// only through a resolved column map.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub header: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Read the first sheet of an uploaded file. Format is chosen by file
/// extension: csv/txt go through the csv reader, the Excel family through
/// calamine. A file with no rows at all, or no readable first sheet, is a
/// hard `EmptyFile` failure — no partial result.
pub fn read_sheet(data: &[u8], file_name: &str) -> Result<Sheet, ImportError> {
    let ext = file_name
        .rsplit('.')
        .next()
        .filter(|e| *e != file_name)
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" | "txt" => read_csv(data),
        "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => read_workbook(data),
        other => Err(ImportError::UnsupportedFile(other.to_string())),
    }
}

fn read_workbook(data: &[u8]) -> Result<Sheet, ImportError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data))
        .map_err(|_| ImportError::EmptyFile)?;

    let sheet_names = workbook.sheet_names();
    let first = sheet_names.first().ok_or(ImportError::EmptyFile)?.clone();

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| ImportError::Sheet(e.to_string()))?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => cells.iter().map(|c| convert_cell(c).as_text()).collect(),
        None => return Err(ImportError::EmptyFile),
    };

    let data_rows = rows
        .enumerate()
        .map(|(i, cells)| RawRow {
            line: i as u32 + 2,
            cells: cells.iter().map(convert_cell).collect(),
        })
        .collect();

    Ok(Sheet { header, rows: data_rows })
}

fn read_csv(data: &[u8]) -> Result<Sheet, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?.iter().map(|s| s.trim().to_string()).collect(),
        None => return Err(ImportError::EmptyFile),
    };

    let mut rows = Vec::new();
    for (i, record) in records.enumerate() {
        let record = record?;
        rows.push(RawRow {
            line: i as u32 + 2,
            cells: record
                .iter()
                .map(|s| {
                    if s.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(s.to_string())
                    }
                })
                .collect(),
        });
    }

    Ok(Sheet { header, rows })
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}
