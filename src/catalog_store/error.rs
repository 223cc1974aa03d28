use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field '{field}' must be {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },

    #[error("A play can come from a playlist or an album, not both")]
    ConflictingSource,

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl CatalogError {
    pub fn type_mismatch(field: &str, expected: &'static str) -> Self {
        CatalogError::TypeMismatch {
            field: field.to_string(),
            expected,
        }
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        CatalogError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CatalogError::MissingField(_)
                | CatalogError::TypeMismatch { .. }
                | CatalogError::ConflictingSource
                | CatalogError::InvalidValue { .. }
        )
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::MissingField(_) => "missing_field",
            CatalogError::TypeMismatch { .. } => "type_mismatch",
            CatalogError::ConflictingSource => "conflicting_source",
            CatalogError::InvalidValue { .. } => "invalid_value",
            CatalogError::NotFound(_) => "not_found",
            CatalogError::Store(_) => "store",
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
