use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Customer;

/// Insert a customer. Fails with a unique violation if `code` is taken.
pub async fn insert_customer(pool: &PgPool, id: Uuid, code: &str) -> sqlx::Result<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (id, code)
        VALUES ($1, $2)
        RETURNING id, code
        "#,
    )
    .bind(id)
    .bind(code)
    .fetch_one(pool)
    .await
}

pub async fn find_customer_by_code(pool: &PgPool, code: &str) -> sqlx::Result<Option<Customer>> {
    sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, code
        FROM customers
        WHERE code = $1
        "#,
    )
    .bind(code)
    .fetch_optional(pool)
    .await
}
