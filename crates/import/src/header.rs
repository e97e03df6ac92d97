use crate::error::ImportError;
use crate::format::{AmountFormat, StatementFormat};

/// Find a configured column name in the actual header row. Both sides are
/// trimmed and lower-cased; first match wins.
pub fn find_column(header: &[String], name: &str) -> Option<usize> {
    let want = name.trim().to_lowercase();
    header.iter().position(|h| h.trim().to_lowercase() == want)
}

/// Like `find_column`, but a miss fails the whole call naming the
/// configured column the user asked for.
pub fn require_column(header: &[String], name: &str) -> Result<usize, ImportError> {
    find_column(header, name).ok_or_else(|| ImportError::ColumnNotFound(name.trim().to_string()))
}

/// A statement format resolved against a real header row: every configured
/// column pinned to a fixed index before any data row is touched. An
/// optional column that is configured but absent is as fatal as a missing
/// required one — every name the user wrote down must exist.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub date: usize,
    pub description: usize,
    pub transaction_id: Option<usize>,
    pub amounts: AmountColumns,
}

#[derive(Debug, Clone)]
pub enum AmountColumns {
    Separate { debit: usize, credit: usize },
    Indicator { amount: usize, drcr: usize },
}

impl ColumnMap {
    pub fn resolve(header: &[String], format: &StatementFormat) -> Result<Self, ImportError> {
        let date = require_column(header, &format.date_column)?;
        let description = require_column(header, &format.description_column)?;

        let transaction_id = match format.transaction_id_column.as_deref() {
            Some(name) if !name.trim().is_empty() => Some(require_column(header, name)?),
            _ => None,
        };

        let amounts = match &format.amount_format {
            AmountFormat::SeparateDebitCredit { debit_column, credit_column } => {
                AmountColumns::Separate {
                    debit: require_column(header, debit_column)?,
                    credit: require_column(header, credit_column)?,
                }
            }
            AmountFormat::DrcrWithAmount { amount_column, drcr_column, .. } => {
                AmountColumns::Indicator {
                    amount: require_column(header, amount_column)?,
                    drcr: require_column(header, drcr_column)?,
                }
            }
        };

        Ok(ColumnMap { date, description, transaction_id, amounts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    fn drcr_format() -> StatementFormat {
        StatementFormat {
            bank_name: "HDFC".to_string(),
            date_column: "Txn Date".to_string(),
            description_column: "Narration".to_string(),
            transaction_id_column: None,
            amount_format: AmountFormat::DrcrWithAmount {
                amount_column: "Amount".to_string(),
                drcr_column: "Type".to_string(),
                debit_tokens: vec!["DR".to_string()],
                credit_tokens: vec!["CR".to_string()],
            },
        }
    }

    #[test]
    fn lookup_is_case_and_whitespace_insensitive() {
        let h = header(&["  Txn Date ", "NARRATION", "Amount"]);
        assert_eq!(find_column(&h, "txn date"), Some(0));
        assert_eq!(find_column(&h, " Narration"), Some(1));
        assert_eq!(find_column(&h, "Balance"), None);
    }

    #[test]
    fn first_match_wins_on_duplicate_headers() {
        let h = header(&["Amount", "amount"]);
        assert_eq!(find_column(&h, "AMOUNT"), Some(0));
    }

    #[test]
    fn resolve_maps_every_configured_column() {
        let h = header(&["Txn Date", "Narration", "Amount", "Type"]);
        let map = ColumnMap::resolve(&h, &drcr_format()).unwrap();
        assert_eq!(map.date, 0);
        assert_eq!(map.description, 1);
        assert!(map.transaction_id.is_none());
        assert!(matches!(map.amounts, AmountColumns::Indicator { amount: 2, drcr: 3 }));
    }

    #[test]
    fn missing_required_column_names_the_configured_header() {
        let h = header(&["Date", "Narration", "Amount", "Type"]);
        let err = ColumnMap::resolve(&h, &drcr_format()).unwrap_err();
        assert!(matches!(err, ImportError::ColumnNotFound(c) if c == "Txn Date"));
    }

    #[test]
    fn configured_but_absent_optional_column_is_fatal() {
        let mut format = drcr_format();
        format.transaction_id_column = Some("Ref No".to_string());
        let h = header(&["Txn Date", "Narration", "Amount", "Type"]);
        let err = ColumnMap::resolve(&h, &format).unwrap_err();
        assert!(matches!(err, ImportError::ColumnNotFound(c) if c == "Ref No"));
    }

    #[test]
    fn blank_optional_column_is_skipped() {
        let mut format = drcr_format();
        format.transaction_id_column = Some("   ".to_string());
        let h = header(&["Txn Date", "Narration", "Amount", "Type"]);
        let map = ColumnMap::resolve(&h, &format).unwrap();
        assert!(map.transaction_id.is_none());
    }
}
