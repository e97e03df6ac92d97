use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// How a bank's statement encodes amounts. The variant carries exactly the
/// columns that layout needs, so a format can never hold a half-configured
/// mix of both layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "amount_format_type", rename_all = "snake_case")]
pub enum AmountFormat {
    /// Two columns, one of which is blank (or zero) on every row.
    SeparateDebitCredit {
        debit_column: String,
        credit_column: String,
    },
    /// One amount column plus a free-text indicator column, classified
    /// against per-bank token vocabularies.
    DrcrWithAmount {
        amount_column: String,
        drcr_column: String,
        debit_tokens: Vec<String>,
        credit_tokens: Vec<String>,
    },
}

impl AmountFormat {
    pub fn type_name(&self) -> &'static str {
        match self {
            AmountFormat::SeparateDebitCredit { .. } => "separate_debit_credit",
            AmountFormat::DrcrWithAmount { .. } => "drcr_with_amount",
        }
    }
}

/// Per-bank column mapping, keyed by `bank_name`. Stored by the registry,
/// consumed read-only by the statement importer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementFormat {
    pub bank_name: String,
    pub date_column: String,
    pub description_column: String,
    pub transaction_id_column: Option<String>,
    #[serde(flatten)]
    pub amount_format: AmountFormat,
}

impl StatementFormat {
    /// Canonical form: token vocabularies trimmed, upper-cased, de-duplicated
    /// and stripped of empties; an empty transaction-id column treated as
    /// unconfigured. Applied at registry-save time and again at first use so
    /// hand-built formats behave like stored ones.
    pub fn normalized(mut self) -> Self {
        self.transaction_id_column = self
            .transaction_id_column
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if let AmountFormat::DrcrWithAmount { debit_tokens, credit_tokens, .. } =
            &mut self.amount_format
        {
            *debit_tokens = normalize_tokens(debit_tokens);
            *credit_tokens = normalize_tokens(credit_tokens);
        }
        self
    }
}

/// Trim, upper-case, drop empties, de-duplicate (first occurrence wins).
pub fn normalize_tokens(tokens: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Token match against an already-normalized (trimmed, upper-cased)
/// indicator: exact equality always counts; tokens of two or more
/// characters also match as substrings. Single-character tokens never
/// substring-match, so a lone "D" cannot claim every description
/// containing the letter.
pub fn matches_token(indicator: &str, tokens: &[String]) -> bool {
    tokens
        .iter()
        .any(|t| indicator == t.as_str() || (t.len() >= 2 && indicator.contains(t.as_str())))
}
