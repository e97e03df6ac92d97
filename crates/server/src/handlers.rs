use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use khata_import::{AmountFormat, DraftSalaryEntry, DraftTransaction, StatementFormat};

use crate::error::{ApiError, Result};

pub struct AppState {
    pub db: khata_storage::DbPool,
}

pub type SharedState = Arc<AppState>;

#[derive(Serialize)]
pub struct StatementResponse {
    pub success: bool,
    pub data: Vec<DraftTransaction>,
    pub skipped_rows: usize,
}

#[derive(Serialize)]
pub struct SalaryResponse {
    pub success: bool,
    pub data: Vec<DraftSalaryEntry>,
}

#[derive(Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

// ── multipart plumbing ────────────────────────────────────────────────────────

struct Upload {
    file: Option<(String, Vec<u8>)>,
    fields: HashMap<String, String>,
}

/// Drain a multipart request into the uploaded file plus its text fields.
async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    let mut file = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload.xlsx").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read file content: {e}")))?;
            file = Some((file_name, bytes.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read field '{name}': {e}")))?;
            fields.insert(name, value);
        }
    }

    Ok(Upload { file, fields })
}

fn require_file(upload: &Upload) -> Result<(&str, &[u8])> {
    upload
        .file
        .as_ref()
        .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
        .ok_or_else(|| ApiError::Validation("No file uploaded".to_string()))
}

// ── statement import ──────────────────────────────────────────────────────────

/// POST /api/statement-import/parse
///
/// Multipart upload: `file` plus either the inline format fields or just
/// `bank_name` to use the stored format for that bank. Inline fields take
/// precedence when both are present.
pub async fn parse_statement_upload(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<Json<StatementResponse>> {
    let upload = read_upload(multipart).await?;
    let (file_name, bytes) = require_file(&upload)?;

    let format = resolve_format(&state, &upload.fields).await?;
    let batch = khata_import::import_statement(bytes, file_name, &format)?;

    Ok(Json(StatementResponse {
        success: true,
        data: batch.drafts,
        skipped_rows: batch.skipped_rows,
    }))
}

async fn resolve_format(
    state: &AppState,
    fields: &HashMap<String, String>,
) -> Result<StatementFormat> {
    if fields.contains_key("amount_format_type") {
        return build_inline_format(fields);
    }

    let bank = field(fields, "bank_name").ok_or_else(|| {
        ApiError::Validation("Missing 'bank_name' or inline format fields".to_string())
    })?;
    khata_storage::get_format(&state.db, &bank)
        .await?
        .ok_or(ApiError::FormatNotFound(bank))
}

fn field(fields: &HashMap<String, String>, key: &str) -> Option<String> {
    fields
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_field(fields: &HashMap<String, String>, key: &str) -> Result<String> {
    field(fields, key).ok_or_else(|| ApiError::Validation(format!("Missing required field '{key}'")))
}

fn split_tokens(raw: Option<String>) -> Vec<String> {
    raw.map(|v| v.split(',').map(|t| t.to_string()).collect())
        .unwrap_or_default()
}

/// Build a one-off format from the request's own fields, mirroring what the
/// configuration screen would save.
fn build_inline_format(fields: &HashMap<String, String>) -> Result<StatementFormat> {
    let amount_format = match require_field(fields, "amount_format_type")?.as_str() {
        "separate_debit_credit" => AmountFormat::SeparateDebitCredit {
            debit_column: require_field(fields, "debit_col")?,
            credit_column: require_field(fields, "credit_col")?,
        },
        "drcr_with_amount" => AmountFormat::DrcrWithAmount {
            amount_column: require_field(fields, "amount_col")?,
            drcr_column: require_field(fields, "drcr_col")?,
            debit_tokens: split_tokens(field(fields, "debit_texts")),
            credit_tokens: split_tokens(field(fields, "credit_texts")),
        },
        other => {
            return Err(ApiError::Validation(format!(
                "Unsupported amount_format_type '{other}'"
            )))
        }
    };

    Ok(StatementFormat {
        bank_name: field(fields, "bank_name").unwrap_or_default(),
        date_column: require_field(fields, "date_col")?,
        description_column: require_field(fields, "desc_col")?,
        transaction_id_column: field(fields, "trans_id_col"),
        amount_format,
    }
    .normalized())
}

// ── salary import ─────────────────────────────────────────────────────────────

/// POST /api/salary-import/parse
///
/// Multipart upload with `file` only; the Date/Account/Debit columns are
/// located by fixed header names.
pub async fn parse_salary_upload(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<Json<SalaryResponse>> {
    let upload = read_upload(multipart).await?;
    let (file_name, bytes) = require_file(&upload)?;

    let employees = khata_storage::list_employees(&state.db).await?;
    let entries = khata_import::import_salary_sheet(bytes, file_name, employees)?;

    Ok(Json(SalaryResponse { success: true, data: entries }))
}

// ── statement format registry ─────────────────────────────────────────────────

/// GET /api/statement-formats
pub async fn list_formats(
    State(state): State<SharedState>,
) -> Result<Json<DataResponse<Vec<StatementFormat>>>> {
    let formats = khata_storage::list_formats(&state.db).await?;
    Ok(Json(DataResponse { success: true, data: formats }))
}

/// GET /api/statement-formats/{bank}
pub async fn get_format(
    State(state): State<SharedState>,
    Path(bank): Path<String>,
) -> Result<Json<DataResponse<StatementFormat>>> {
    let format = khata_storage::get_format(&state.db, &bank)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Statement format '{bank}'")))?;
    Ok(Json(DataResponse { success: true, data: format }))
}

/// POST /api/statement-formats — upsert by bank name.
pub async fn save_format(
    State(state): State<SharedState>,
    Json(format): Json<StatementFormat>,
) -> Result<Json<DataResponse<StatementFormat>>> {
    validate_format(&format)?;
    let format = format.normalized();
    khata_storage::upsert_format(&state.db, &format).await?;
    Ok(Json(DataResponse { success: true, data: format }))
}

/// DELETE /api/statement-formats/{bank}
pub async fn delete_format(
    State(state): State<SharedState>,
    Path(bank): Path<String>,
) -> Result<Json<DataResponse<String>>> {
    if !khata_storage::delete_format(&state.db, &bank).await? {
        return Err(ApiError::NotFound(format!("Statement format '{bank}'")));
    }
    Ok(Json(DataResponse { success: true, data: bank }))
}

fn validate_format(format: &StatementFormat) -> Result<()> {
    let mut missing = Vec::new();
    if format.bank_name.trim().is_empty() {
        missing.push("bank_name");
    }
    if format.date_column.trim().is_empty() {
        missing.push("date_column");
    }
    if format.description_column.trim().is_empty() {
        missing.push("description_column");
    }
    match &format.amount_format {
        AmountFormat::SeparateDebitCredit { debit_column, credit_column } => {
            if debit_column.trim().is_empty() {
                missing.push("debit_column");
            }
            if credit_column.trim().is_empty() {
                missing.push("credit_column");
            }
        }
        AmountFormat::DrcrWithAmount { amount_column, drcr_column, .. } => {
            if amount_column.trim().is_empty() {
                missing.push("amount_column");
            }
            if drcr_column.trim().is_empty() {
                missing.push("drcr_column");
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

// ── employees ─────────────────────────────────────────────────────────────────

/// GET /api/employees
pub async fn list_employees(
    State(state): State<SharedState>,
) -> Result<Json<DataResponse<Vec<khata_core::Employee>>>> {
    let employees = khata_storage::list_employees(&state.db).await?;
    Ok(Json(DataResponse { success: true, data: employees }))
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "khata-server"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn inline_drcr_format_built_from_fields() {
        let f = fields(&[
            ("bank_name", "HDFC"),
            ("date_col", "Txn Date"),
            ("desc_col", "Narration"),
            ("amount_format_type", "drcr_with_amount"),
            ("amount_col", "Amount"),
            ("drcr_col", "Type"),
            ("debit_texts", "dr, wdl"),
            ("credit_texts", "cr"),
        ]);
        let format = build_inline_format(&f).unwrap();
        assert_eq!(format.bank_name, "HDFC");
        match format.amount_format {
            AmountFormat::DrcrWithAmount { debit_tokens, credit_tokens, .. } => {
                assert_eq!(debit_tokens, vec!["DR".to_string(), "WDL".to_string()]);
                assert_eq!(credit_tokens, vec!["CR".to_string()]);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn inline_separate_format_built_from_fields() {
        let f = fields(&[
            ("date_col", "Date"),
            ("desc_col", "Description"),
            ("amount_format_type", "separate_debit_credit"),
            ("debit_col", "Withdrawal"),
            ("credit_col", "Deposit"),
        ]);
        let format = build_inline_format(&f).unwrap();
        assert!(matches!(format.amount_format, AmountFormat::SeparateDebitCredit { .. }));
    }

    #[test]
    fn missing_conditional_field_rejected() {
        let f = fields(&[
            ("date_col", "Date"),
            ("desc_col", "Description"),
            ("amount_format_type", "separate_debit_credit"),
            ("debit_col", "Withdrawal"),
        ]);
        let err = build_inline_format(&f).unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("credit_col")));
    }

    #[test]
    fn unknown_amount_format_type_rejected() {
        let f = fields(&[
            ("date_col", "Date"),
            ("desc_col", "Description"),
            ("amount_format_type", "both_at_once"),
        ]);
        let err = build_inline_format(&f).unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("both_at_once")));
    }

    #[test]
    fn blank_trans_id_col_treated_as_unconfigured() {
        let f = fields(&[
            ("date_col", "Date"),
            ("desc_col", "Description"),
            ("trans_id_col", "  "),
            ("amount_format_type", "separate_debit_credit"),
            ("debit_col", "Withdrawal"),
            ("credit_col", "Deposit"),
        ]);
        let format = build_inline_format(&f).unwrap();
        assert_eq!(format.transaction_id_column, None);
    }

    #[test]
    fn validate_format_names_every_blank_field() {
        let format = StatementFormat {
            bank_name: "".to_string(),
            date_column: "Date".to_string(),
            description_column: "".to_string(),
            transaction_id_column: None,
            amount_format: AmountFormat::SeparateDebitCredit {
                debit_column: "Withdrawal".to_string(),
                credit_column: "".to_string(),
            },
        };
        let err = validate_format(&format).unwrap_err();
        let ApiError::Validation(msg) = err else { panic!("wrong variant") };
        assert!(msg.contains("bank_name"));
        assert!(msg.contains("description_column"));
        assert!(msg.contains("credit_column"));
    }

    #[test]
    fn split_tokens_on_commas() {
        assert_eq!(
            split_tokens(Some("DR, WDL ,ATM".to_string())),
            vec!["DR".to_string(), " WDL ".to_string(), "ATM".to_string()]
        );
        assert!(split_tokens(None).is_empty());
    }
}
