use khata_core::{Employee, EmployeeId};
use khata_import::{AmountFormat, StatementFormat};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;
use thiserror::Error;

pub type DbPool = Pool<Sqlite>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored format for '{0}' does not match its amount_format_type")]
    InvalidFormat(String),
    #[error("stored token list is not valid JSON: {0}")]
    TokenEncoding(#[from] serde_json::Error),
}

pub async fn create_db(path: &Path) -> Result<DbPool, StorageError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS statement_formats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bank_name TEXT NOT NULL UNIQUE,
            date_column TEXT NOT NULL,
            description_column TEXT NOT NULL,
            transaction_id_column TEXT,
            amount_format_type TEXT NOT NULL,
            debit_column TEXT,
            credit_column TEXT,
            amount_column TEXT,
            drcr_column TEXT,
            debit_tokens TEXT,
            credit_tokens TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ── statement formats ─────────────────────────────────────────────────────────

/// Insert or replace the format for a bank. The format is normalized
/// (token vocabularies canonicalized) before it is written, so readers can
/// trust stored rows.
pub async fn upsert_format(pool: &DbPool, format: &StatementFormat) -> Result<(), StorageError> {
    let format = format.clone().normalized();

    let (debit_column, credit_column, amount_column, drcr_column, debit_tokens, credit_tokens) =
        match &format.amount_format {
            AmountFormat::SeparateDebitCredit { debit_column, credit_column } => (
                Some(debit_column.clone()),
                Some(credit_column.clone()),
                None,
                None,
                None,
                None,
            ),
            AmountFormat::DrcrWithAmount {
                amount_column,
                drcr_column,
                debit_tokens,
                credit_tokens,
            } => (
                None,
                None,
                Some(amount_column.clone()),
                Some(drcr_column.clone()),
                Some(serde_json::to_string(debit_tokens)?),
                Some(serde_json::to_string(credit_tokens)?),
            ),
        };

    sqlx::query(
        r#"
        INSERT INTO statement_formats (
            bank_name, date_column, description_column, transaction_id_column,
            amount_format_type, debit_column, credit_column,
            amount_column, drcr_column, debit_tokens, credit_tokens
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(bank_name) DO UPDATE SET
            date_column = excluded.date_column,
            description_column = excluded.description_column,
            transaction_id_column = excluded.transaction_id_column,
            amount_format_type = excluded.amount_format_type,
            debit_column = excluded.debit_column,
            credit_column = excluded.credit_column,
            amount_column = excluded.amount_column,
            drcr_column = excluded.drcr_column,
            debit_tokens = excluded.debit_tokens,
            credit_tokens = excluded.credit_tokens
        "#,
    )
    .bind(&format.bank_name)
    .bind(&format.date_column)
    .bind(&format.description_column)
    .bind(&format.transaction_id_column)
    .bind(format.amount_format.type_name())
    .bind(debit_column)
    .bind(credit_column)
    .bind(amount_column)
    .bind(drcr_column)
    .bind(debit_tokens)
    .bind(credit_tokens)
    .execute(pool)
    .await?;

    Ok(())
}

type FormatRow = (
    String,         // bank_name
    String,         // date_column
    String,         // description_column
    Option<String>, // transaction_id_column
    String,         // amount_format_type
    Option<String>, // debit_column
    Option<String>, // credit_column
    Option<String>, // amount_column
    Option<String>, // drcr_column
    Option<String>, // debit_tokens (JSON)
    Option<String>, // credit_tokens (JSON)
);

const FORMAT_COLUMNS: &str = "bank_name, date_column, description_column, transaction_id_column, \
     amount_format_type, debit_column, credit_column, amount_column, drcr_column, \
     debit_tokens, credit_tokens";

fn row_to_format(row: FormatRow) -> Result<StatementFormat, StorageError> {
    let (
        bank_name,
        date_column,
        description_column,
        transaction_id_column,
        format_type,
        debit_column,
        credit_column,
        amount_column,
        drcr_column,
        debit_tokens,
        credit_tokens,
    ) = row;

    let amount_format = match format_type.as_str() {
        "separate_debit_credit" => match (debit_column, credit_column) {
            (Some(debit_column), Some(credit_column)) => {
                AmountFormat::SeparateDebitCredit { debit_column, credit_column }
            }
            _ => return Err(StorageError::InvalidFormat(bank_name)),
        },
        "drcr_with_amount" => match (amount_column, drcr_column) {
            (Some(amount_column), Some(drcr_column)) => AmountFormat::DrcrWithAmount {
                amount_column,
                drcr_column,
                debit_tokens: serde_json::from_str(debit_tokens.as_deref().unwrap_or("[]"))?,
                credit_tokens: serde_json::from_str(credit_tokens.as_deref().unwrap_or("[]"))?,
            },
            _ => return Err(StorageError::InvalidFormat(bank_name)),
        },
        _ => return Err(StorageError::InvalidFormat(bank_name)),
    };

    Ok(StatementFormat {
        bank_name,
        date_column,
        description_column,
        transaction_id_column,
        amount_format,
    })
}

pub async fn get_format(
    pool: &DbPool,
    bank_name: &str,
) -> Result<Option<StatementFormat>, StorageError> {
    let row = sqlx::query_as::<_, FormatRow>(&format!(
        "SELECT {FORMAT_COLUMNS} FROM statement_formats WHERE bank_name = ?"
    ))
    .bind(bank_name)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_format).transpose()
}

pub async fn list_formats(pool: &DbPool) -> Result<Vec<StatementFormat>, StorageError> {
    let rows = sqlx::query_as::<_, FormatRow>(&format!(
        "SELECT {FORMAT_COLUMNS} FROM statement_formats ORDER BY bank_name"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_format).collect()
}

/// Returns true when a row was actually deleted.
pub async fn delete_format(pool: &DbPool, bank_name: &str) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM statement_formats WHERE bank_name = ?")
        .bind(bank_name)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ── employees ─────────────────────────────────────────────────────────────────

pub async fn list_employees(pool: &DbPool) -> Result<Vec<Employee>, StorageError> {
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM employees ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| Employee { id: EmployeeId(id), name })
        .collect())
}

pub async fn insert_employee(pool: &DbPool, name: &str) -> Result<EmployeeId, StorageError> {
    let result = sqlx::query("INSERT INTO employees (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(EmployeeId(result.last_insert_rowid()))
}
