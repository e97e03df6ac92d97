use std::collections::HashMap;

use chrono::NaiveDate;
use khata_core::{Employee, EmployeeId};
use serde::Serialize;

use crate::error::ImportError;
use crate::header::require_column;
use crate::sheet::{read_sheet, Sheet};
use crate::value::{cell_amount, cell_date};

/// Flat withholding rate applied to every positive gross salary.
pub const TDS_RATE: f64 = 0.10;

/// Salary sheets are not bank-configurable: the three columns are located
/// by these fixed names, case-insensitively.
pub const DATE_HEADER: &str = "Date";
pub const ACCOUNT_HEADER: &str = "Account";
pub const GROSS_HEADER: &str = "Debit";

pub const WARN_INVALID_DATE: &str = "Invalid date";
pub const WARN_MISSING_ACCOUNT: &str = "Missing account";
pub const WARN_EMPLOYEE_NOT_FOUND: &str = "Employee not found";
pub const WARN_INVALID_GROSS: &str = "Invalid gross salary";

/// One payroll row awaiting review. Unlike statement drafts, salary rows
/// are never dropped: a bad date, an unknown payee or a non-positive gross
/// all become warnings the reviewer fixes by hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftSalaryEntry {
    pub id: u32,
    pub row_index: u32,
    pub date: Option<NaiveDate>,
    pub account: String,
    pub employee_id: Option<EmployeeId>,
    pub employee_name: Option<String>,
    pub gross_salary: f64,
    pub tds: f64,
    pub net_salary: f64,
    pub warnings: Vec<String>,
}

/// Case-insensitive exact-name lookup, built once per import call. No
/// fuzzy matching: "Jon Doe" does not resolve to "John Doe".
pub struct EmployeeDirectory {
    by_name: HashMap<String, Employee>,
}

impl EmployeeDirectory {
    pub fn new(employees: Vec<Employee>) -> Self {
        let by_name = employees
            .into_iter()
            .map(|e| (e.name.trim().to_lowercase(), e))
            .collect();
        EmployeeDirectory { by_name }
    }

    pub fn lookup(&self, account: &str) -> Option<&Employee> {
        self.by_name.get(&account.trim().to_lowercase())
    }
}

/// Parse a salary sheet. Every structurally non-empty row yields exactly
/// one entry; `entries.len()` always equals the count of non-blank rows.
pub fn parse_salary_sheet(
    sheet: &Sheet,
    employees: &EmployeeDirectory,
) -> Result<Vec<DraftSalaryEntry>, ImportError> {
    let date_col = require_column(&sheet.header, DATE_HEADER)?;
    let account_col = require_column(&sheet.header, ACCOUNT_HEADER)?;
    let gross_col = require_column(&sheet.header, GROSS_HEADER)?;

    let mut entries = Vec::new();
    for row in &sheet.rows {
        if row.is_blank() {
            continue;
        }
        let mut warnings = Vec::new();

        let date = cell_date(row.cell(date_col));
        if date.is_none() {
            warnings.push(WARN_INVALID_DATE.to_string());
        }

        let account = row.cell(account_col).as_text();
        let matched = if account.is_empty() {
            warnings.push(WARN_MISSING_ACCOUNT.to_string());
            None
        } else {
            let hit = employees.lookup(&account);
            if hit.is_none() {
                warnings.push(WARN_EMPLOYEE_NOT_FOUND.to_string());
            }
            hit
        };

        let gross = cell_amount(row.cell(gross_col));
        if gross <= 0.0 {
            warnings.push(WARN_INVALID_GROSS.to_string());
        }
        // Withholding is computed whether or not the payee resolved.
        let tds = if gross > 0.0 { gross * TDS_RATE } else { 0.0 };
        let net = gross - tds;

        entries.push(DraftSalaryEntry {
            id: entries.len() as u32 + 1,
            row_index: row.line,
            date,
            account,
            employee_id: matched.map(|e| e.id),
            employee_name: matched.map(|e| e.name.clone()),
            gross_salary: gross,
            tds,
            net_salary: net,
            warnings,
        });
    }

    let flagged = entries.iter().filter(|e| !e.warnings.is_empty()).count();
    tracing::info!(entries = entries.len(), flagged, "salary sheet parsed");

    Ok(entries)
}

/// Read + parse in one call, for callers holding raw upload bytes.
pub fn import_salary_sheet(
    data: &[u8],
    file_name: &str,
    employees: Vec<Employee>,
) -> Result<Vec<DraftSalaryEntry>, ImportError> {
    let sheet = read_sheet(data, file_name)?;
    let directory = EmployeeDirectory::new(employees);
    parse_salary_sheet(&sheet, &directory)
}
