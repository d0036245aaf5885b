pub mod customer_queries;
pub mod measure_queries;

/// Postgres error code for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Whether `err` was raised by a unique constraint or index.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}
