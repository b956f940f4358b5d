use thiserror::Error;

#[derive(Debug, Error)]
pub enum DebtbookError {
    #[error("Invalid loan terms: {field}: {reason}")]
    InvalidLoanTerms { field: String, reason: String },

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Not found: {entity} '{id}'")]
    NotFound { entity: String, id: String },

    #[error("Account is not a loan account (kind: {kind})")]
    NotALoanAccount { kind: String },

    #[error("Date out of range in {context}")]
    DateOverflow { context: String },

    #[error("Numeric overflow in {context}")]
    NumericOverflow { context: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DebtbookError {
    fn from(e: serde_json::Error) -> Self {
        DebtbookError::Serialization(e.to_string())
    }
}
