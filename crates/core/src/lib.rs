pub mod employee;
pub mod transaction;

pub use employee::{Employee, EmployeeId};
pub use transaction::TransactionType;
