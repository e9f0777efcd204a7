use crate::application::repos::RepoError;

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            RepoError::Timeout
        }
        other => RepoError::from_persistence(other),
    }
}

/// Convert a non-negative `BIGINT` column into a counter.
pub(crate) fn counter(column: &'static str, value: i64) -> Result<u64, RepoError> {
    u64::try_from(value).map_err(|_| {
        RepoError::from_persistence(format!("column `{column}` holds negative value {value}"))
    })
}
