pub mod db;

pub use db::{
    create_db, delete_format, get_format, insert_employee, list_employees, list_formats,
    upsert_format, DbPool, StorageError,
};
