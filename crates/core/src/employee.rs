use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub i64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person on payroll. Read-only from the import pipeline's point of view:
/// the salary importer only ever matches against the stored name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
}

impl Employee {
    pub fn new(id: i64, name: &str) -> Self {
        Employee {
            id: EmployeeId(id),
            name: name.to_string(),
        }
    }
}
