pub mod error;
pub mod format;
pub mod header;
pub mod salary;
pub mod sheet;
pub mod statement;
pub mod value;

pub use error::ImportError;
pub use format::{AmountFormat, StatementFormat};
pub use header::ColumnMap;
pub use salary::{import_salary_sheet, DraftSalaryEntry, EmployeeDirectory};
pub use sheet::{read_sheet, Cell, RawRow, Sheet};
pub use statement::{import_statement, DraftTransaction, StatementBatch};
