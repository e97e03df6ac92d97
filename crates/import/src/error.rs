use thiserror::Error;

/// Failure modes of an import call.
///
/// The first three variants are request-shape problems the caller can fix
/// (bad configuration or an unusable upload); the rest are unexpected
/// failures inside the readers. Per-row problems never appear here — they
/// become warnings on the draft, or a skip counted in the batch.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("file is empty or invalid")]
    EmptyFile,
    #[error("Column '{0}' not found in Excel file")]
    ColumnNotFound(String),
    #[error("unsupported file type: .{0}")]
    UnsupportedFile(String),
    #[error("failed to read sheet: {0}")]
    Sheet(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ImportError {
    /// True when the caller can fix the problem by changing the request
    /// (missing column, empty upload, unknown extension).
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            ImportError::EmptyFile | ImportError::ColumnNotFound(_) | ImportError::UnsupportedFile(_)
        )
    }
}
