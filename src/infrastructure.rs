pub mod sqlite;

use crate::domain::DataAccessError;

pub use self::sqlite::*;

impl From<sqlx::Error> for DataAccessError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::ConnectionError(Box::new(value)),
            sqlx::Error::Database(ref e)
                if e.is_unique_violation()
                    || e.is_foreign_key_violation()
                    || e.is_check_violation() =>
            {
                Self::WriteError(Box::new(value))
            }
            _ => Self::QueryError(Box::new(value)),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DataAccessError {
    fn from(value: sqlx::migrate::MigrateError) -> Self {
        Self::MigrationError(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_failures_are_connection_errors() {
        assert!(matches!(
            DataAccessError::from(sqlx::Error::PoolTimedOut),
            DataAccessError::ConnectionError(_)
        ));
    }

    #[test]
    fn missing_rows_are_query_errors() {
        assert!(matches!(
            DataAccessError::from(sqlx::Error::RowNotFound),
            DataAccessError::QueryError(_)
        ));
    }
}
