use thiserror::Error;

/// Error taxonomy for the payroll subsystem.
///
/// Batch processing recovers from `DuplicatePayroll` (skip) and `Render`
/// (per-author failure); everything else propagates to the caller.
#[derive(Debug, Error)]
pub enum PayrollError {
    #[error("payroll already exists for author {author_id} in period {month}/{year}")]
    DuplicatePayroll {
        author_id: i64,
        month: u32,
        year: i32,
    },

    #[error("failed to render payslip: {message}")]
    Render { message: String },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("invalid period: {message}")]
    InvalidPeriod { message: String },

    #[error("corrupt stored value '{raw}' in column {column}")]
    Corrupt { column: &'static str, raw: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document storage error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PayrollResult<T> = Result<T, PayrollError>;

impl PayrollError {
    pub fn render(message: impl Into<String>) -> Self {
        PayrollError::Render {
            message: message.into(),
        }
    }

    pub fn invalid_period(message: impl Into<String>) -> Self {
        PayrollError::InvalidPeriod {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_payroll_displays_author_and_period() {
        let err = PayrollError::DuplicatePayroll {
            author_id: 7,
            month: 6,
            year: 2025,
        };
        assert_eq!(
            err.to_string(),
            "payroll already exists for author 7 in period 6/2025"
        );
    }

    #[test]
    fn not_found_displays_entity() {
        let err = PayrollError::NotFound { entity: "payroll" };
        assert_eq!(err.to_string(), "payroll not found");
    }

    #[test]
    fn errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<PayrollError>();
    }
}
