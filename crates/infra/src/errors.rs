//! Conversions from external infrastructure errors into domain errors.

use cadence_domain::CadenceError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CadenceError);

impl From<InfraError> for CadenceError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CadenceError> for InfraError {
    fn from(value: CadenceError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → CadenceError */
/* -------------------------------------------------------------------------- */

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let domain = match err {
            RE::SqliteFailure(code, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (code.code, code.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        CadenceError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        CadenceError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 1555 | 2067) => {
                        CadenceError::Conflict("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        CadenceError::Database("foreign key constraint violation".into())
                    }
                    _ => CadenceError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        code.code, code.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => CadenceError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                CadenceError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                CadenceError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => CadenceError::Database("invalid UTF-8 returned from sqlite".into()),
            other => CadenceError::Database(other.to_string()),
        };
        InfraError(domain)
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → CadenceError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(err: r2d2::Error) -> Self {
        InfraError(CadenceError::Database(format!("connection pool error: {err}")))
    }
}

/// Shorthand used by the repositories.
pub(crate) fn map_sql_error(err: SqlError) -> CadenceError {
    CadenceError::from(InfraError::from(err))
}

pub(crate) fn map_pool_error(err: r2d2::Error) -> CadenceError {
    CadenceError::from(InfraError::from(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_becomes_not_found() {
        let err = InfraError::from(SqlError::QueryReturnedNoRows);
        assert!(matches!(err.0, CadenceError::NotFound(_)));
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let failure = SqlError::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ffi::ErrorCode::ConstraintViolation,
                extended_code: 1555,
            },
            Some("UNIQUE constraint failed".to_string()),
        );
        let err = InfraError::from(failure);
        assert!(matches!(err.0, CadenceError::Conflict(_)));
    }
}
