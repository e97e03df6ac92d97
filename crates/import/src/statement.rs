use chrono::NaiveDate;
use khata_core::TransactionType;
use serde::Serialize;

use crate::error::ImportError;
use crate::format::{matches_token, AmountFormat, StatementFormat};
use crate::header::{AmountColumns, ColumnMap};
use crate::sheet::{read_sheet, RawRow, Sheet};
use crate::value::{cell_amount, cell_date};

/// One classified statement row, awaiting human review. Never persisted by
/// the importer — confirming a draft is a separate caller-driven step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftTransaction {
    pub id: u32,
    pub date: Option<NaiveDate>,
    pub description: String,
    pub transaction_id: Option<String>,
    pub amount: f64,
    pub debit: f64,
    pub credit: f64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub category: String,
    pub notes: String,
}

/// Drafts in source-row order, plus the count of non-empty rows the
/// classifier dropped (zero amounts, unrecognized dr/cr indicators). The
/// count keeps those drops visible to the reviewer without inventing
/// half-classified drafts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementBatch {
    pub drafts: Vec<DraftTransaction>,
    pub skipped_rows: usize,
}

/// Parse an already-read sheet against a bank format. Fails before touching
/// any data row if a configured column is missing from the header.
pub fn parse_statement(
    sheet: &Sheet,
    format: &StatementFormat,
) -> Result<StatementBatch, ImportError> {
    let format = format.clone().normalized();
    let columns = ColumnMap::resolve(&sheet.header, &format)?;

    let mut drafts = Vec::new();
    let mut skipped = 0usize;

    for row in &sheet.rows {
        if row.is_blank() {
            continue;
        }

        let Some((tx_type, amount)) = classify(row, &columns, &format) else {
            skipped += 1;
            continue;
        };
        let amount = amount.abs();

        let date = cell_date(row.cell(columns.date));
        if date.is_none() {
            tracing::debug!(line = row.line, "statement row has unparsable date");
        }

        let transaction_id = columns
            .transaction_id
            .map(|idx| row.cell(idx).as_text())
            .filter(|s| !s.is_empty());

        let (debit, credit) = match tx_type {
            TransactionType::Income => (0.0, amount),
            TransactionType::Expense => (amount, 0.0),
        };

        drafts.push(DraftTransaction {
            id: drafts.len() as u32 + 1,
            date,
            description: row.cell(columns.description).as_text(),
            transaction_id,
            amount,
            debit,
            credit,
            tx_type,
            category: String::new(),
            notes: String::new(),
        });
    }

    tracing::info!(
        bank = %format.bank_name,
        drafts = drafts.len(),
        skipped,
        "statement parsed"
    );

    Ok(StatementBatch { drafts, skipped_rows: skipped })
}

/// Read + parse in one call, for callers holding raw upload bytes.
pub fn import_statement(
    data: &[u8],
    file_name: &str,
    format: &StatementFormat,
) -> Result<StatementBatch, ImportError> {
    let sheet = read_sheet(data, file_name)?;
    parse_statement(&sheet, format)
}

/// Classification. `None` means the row carries no usable transaction and
/// is skipped: both amount columns zero, a zero amount, or an indicator
/// matching neither token list.
fn classify(
    row: &RawRow,
    columns: &ColumnMap,
    format: &StatementFormat,
) -> Option<(TransactionType, f64)> {
    match &columns.amounts {
        AmountColumns::Separate { debit, credit } => {
            let debit = cell_amount(row.cell(*debit));
            let credit = cell_amount(row.cell(*credit));
            if debit == 0.0 && credit == 0.0 {
                None
            } else if credit > 0.0 {
                Some((TransactionType::Income, credit))
            } else {
                Some((TransactionType::Expense, debit))
            }
        }
        AmountColumns::Indicator { amount, drcr } => {
            let amount = cell_amount(row.cell(*amount));
            if amount == 0.0 {
                return None;
            }
            let indicator = row.cell(*drcr).as_text().to_uppercase();
            let AmountFormat::DrcrWithAmount { debit_tokens, credit_tokens, .. } =
                &format.amount_format
            else {
                return None;
            };
            // Debit vocabulary is always checked first.
            if matches_token(&indicator, debit_tokens) {
                Some((TransactionType::Expense, amount))
            } else if matches_token(&indicator, credit_tokens) {
                Some((TransactionType::Income, amount))
            } else {
                None
            }
        }
    }
}
