// Row-level errors for the course import

use crate::normalize::CreditError;

/// Why a single row could not be imported.
///
/// Both kinds are recoverable: the driver logs them and moves on to the next row.
#[derive(Debug)]
pub enum ImportError {
    /// Credits missing or unparsable; the row is skipped
    InvalidInput {
        code: String,
        raw: String,
        reason: CreditError,
    },

    /// Anything the database rejected; the row's transaction is rolled back
    Database(rusqlite::Error),
}

impl ImportError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ImportError::InvalidInput { .. })
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::InvalidInput { raw, .. } => {
                write!(f, "invalid or missing credits '{}'", raw)
            }
            ImportError::Database(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::InvalidInput { reason, .. } => Some(reason),
            ImportError::Database(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message() {
        let err = ImportError::InvalidInput {
            code: "CS 101".to_string(),
            raw: "N/A".to_string(),
            reason: CreditError::NoNumericToken("N/A".to_string()),
        };

        assert!(err.is_invalid_input());
        assert_eq!(err.to_string(), "invalid or missing credits 'N/A'");
    }

    #[test]
    fn test_database_error_converts() {
        let err: ImportError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(!err.is_invalid_input());
    }
}
