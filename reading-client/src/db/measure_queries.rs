use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{measurement::MeasureRow, MeasureType, Measurement, NewMeasurement};

const MEASURE_COLUMNS: &str = "id, customer_id, measure_type, measure_datetime, period_start, \
                               value, confirmed, image_url, created_at";

fn into_measurement(row: MeasureRow) -> sqlx::Result<Measurement> {
    Measurement::try_from(row).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Insert an unconfirmed measurement.
///
/// The `(customer_id, measure_type, period_start)` unique index rejects a
/// second reading for the same billing month with a unique violation.
pub async fn insert_measure(pool: &PgPool, id: Uuid, new: &NewMeasurement) -> sqlx::Result<Measurement> {
    let sql = format!(
        r#"
        INSERT INTO measures
            (id, customer_id, measure_type, measure_datetime, period_start, value, confirmed, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
        RETURNING {MEASURE_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, MeasureRow>(&sql)
        .bind(id)
        .bind(new.customer_id)
        .bind(new.measure_type.as_str())
        .bind(new.measure_datetime)
        .bind(new.period_start)
        .bind(new.value)
        .bind(&new.image_url)
        .fetch_one(pool)
        .await?;

    into_measurement(row)
}

pub async fn find_measure(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Measurement>> {
    let sql = format!("SELECT {MEASURE_COLUMNS} FROM measures WHERE id = $1");

    sqlx::query_as::<_, MeasureRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(into_measurement)
        .transpose()
}

/// All measurements of a customer in insertion order, optionally narrowed
/// to one meter type.
pub async fn list_measures_for_customer(
    pool: &PgPool,
    customer_id: Uuid,
    measure_type: Option<MeasureType>,
) -> sqlx::Result<Vec<Measurement>> {
    let sql = format!(
        r#"
        SELECT {MEASURE_COLUMNS}
        FROM measures
        WHERE customer_id = $1
          AND ($2::TEXT IS NULL OR measure_type = $2)
        ORDER BY created_at, id
        "#
    );

    let rows = sqlx::query_as::<_, MeasureRow>(&sql)
        .bind(customer_id)
        .bind(measure_type.map(|t| t.as_str()))
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(into_measurement).collect()
}

/// Overwrite value and confirmation flag. Returns `None` if `id` is unknown.
pub async fn update_measure(
    pool: &PgPool,
    id: Uuid,
    value: i64,
    confirmed: bool,
) -> sqlx::Result<Option<Measurement>> {
    let sql = format!(
        r#"
        UPDATE measures
        SET value = $2, confirmed = $3
        WHERE id = $1
        RETURNING {MEASURE_COLUMNS}
        "#
    );

    sqlx::query_as::<_, MeasureRow>(&sql)
        .bind(id)
        .bind(value)
        .bind(confirmed)
        .fetch_optional(pool)
        .await?
        .map(into_measurement)
        .transpose()
}

/// Confirm an unconfirmed measurement, replacing its value.
///
/// Matches only while `confirmed` is still false, so of two concurrent
/// confirmations exactly one gets a row back. `None` means `id` is unknown
/// or already confirmed.
pub async fn confirm_measure(pool: &PgPool, id: Uuid, value: i64) -> sqlx::Result<Option<Measurement>> {
    let sql = format!(
        r#"
        UPDATE measures
        SET value = $2, confirmed = TRUE
        WHERE id = $1 AND confirmed = FALSE
        RETURNING {MEASURE_COLUMNS}
        "#
    );

    sqlx::query_as::<_, MeasureRow>(&sql)
        .bind(id)
        .bind(value)
        .fetch_optional(pool)
        .await?
        .map(into_measurement)
        .transpose()
}

/// Whether the customer with `code` already has a reading of `measure_type`
/// taken in `[start, end)`.
pub async fn exists_in_period(
    pool: &PgPool,
    code: &str,
    measure_type: MeasureType,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM measures m
            JOIN customers c ON m.customer_id = c.id
            WHERE c.code = $1
              AND m.measure_type = $2
              AND m.measure_datetime >= $3
              AND m.measure_datetime <  $4
        )
        "#,
    )
    .bind(code)
    .bind(measure_type.as_str())
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
}
