use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&TransactionType::Income).unwrap();
        assert_eq!(json, "\"income\"");
        let json = serde_json::to_string(&TransactionType::Expense).unwrap();
        assert_eq!(json, "\"expense\"");
    }

    #[test]
    fn display_matches_wire_format() {
        assert_eq!(TransactionType::Income.to_string(), "income");
        assert_eq!(TransactionType::Expense.to_string(), "expense");
    }
}
