//! Integration tests for the PostgreSQL measurement store.
//!
//! These tests require a real PostgreSQL database (`DATABASE_URL`) and use
//! SQLx test macros, so each test runs against a fresh database with
//! `sql/schema` applied.
//!
//! Run with: `cargo test --test postgres_store`

use reading_client::domain::{BillingPeriod, MeasureType, NewMeasurement};
use reading_service::store::{MeasurementStore, PgMeasurementStore, StoreError};
use sqlx::Row;
use time::{macros::datetime, OffsetDateTime, UtcOffset};
use uuid::Uuid;

/// Creates an unconfirmed reading taken at `ts`, in the UTC billing month.
fn make_measurement(customer_id: Uuid, measure_type: MeasureType, ts: OffsetDateTime) -> NewMeasurement {
    let period = BillingPeriod::containing(ts, UtcOffset::UTC).unwrap();
    NewMeasurement {
        customer_id,
        measure_type,
        measure_datetime: ts,
        period_start: period.start,
        value: 42,
        image_url: "http://localhost:5000/static/image.png".to_string(),
    }
}

fn march() -> BillingPeriod {
    BillingPeriod::containing(datetime!(2024-03-15 00:00:00 UTC), UtcOffset::UTC).unwrap()
}

// ============================================================================
// Customer Tests
// ============================================================================

#[sqlx::test(migrations = "../sql/schema")]
async fn test_customer_codes_are_unique(pool: sqlx::PgPool) {
    let store = PgMeasurementStore::new(pool);

    let created = store.create_customer("CUST-1").await.unwrap();
    assert_eq!(store.get_customer("CUST-1").await.unwrap(), Some(created));

    let res = store.create_customer("CUST-1").await;
    assert!(matches!(res, Err(StoreError::Duplicate)));

    assert_eq!(store.get_customer("CUST-2").await.unwrap(), None);
}

#[sqlx::test(migrations = "../sql/schema")]
async fn test_customer_code_is_stored_verbatim(pool: sqlx::PgPool) {
    let store = PgMeasurementStore::new(pool);

    store.create_customer(" A1 ").await.unwrap();

    assert!(store.get_customer(" A1 ").await.unwrap().is_some());
    assert!(store.get_customer("A1").await.unwrap().is_none());
}

// ============================================================================
// Measurement Tests
// ============================================================================

#[sqlx::test(migrations = "../sql/schema")]
async fn test_created_measurement_round_trips(pool: sqlx::PgPool) {
    let store = PgMeasurementStore::new(pool.clone());
    let customer = store.create_customer("CUST-1").await.unwrap();

    let created = store
        .create_measurement(make_measurement(customer.id, MeasureType::Water, datetime!(2024-03-15 10:30:00 UTC)))
        .await
        .unwrap();

    assert!(!created.confirmed);
    assert_eq!(created.value, 42);
    assert_eq!(created.customer_id, customer.id);
    assert_eq!(created.measure_type, MeasureType::Water);
    assert_eq!(created.measure_datetime, datetime!(2024-03-15 10:30:00 UTC));
    assert_eq!(created.period_start, datetime!(2024-03-01 00:00:00 UTC));

    let fetched = store.get_measurement(created.id).await.unwrap();
    assert_eq!(fetched, Some(created.clone()));

    let row = sqlx::query("SELECT measure_type FROM measures WHERE id = $1")
        .bind(created.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.get::<String, _>("measure_type"), "WATER");

    assert_eq!(store.get_measurement(Uuid::new_v4()).await.unwrap(), None);
}

#[sqlx::test(migrations = "../sql/schema")]
async fn test_second_reading_in_same_period_is_a_duplicate(pool: sqlx::PgPool) {
    let store = PgMeasurementStore::new(pool.clone());
    let customer = store.create_customer("CUST-1").await.unwrap();

    store
        .create_measurement(make_measurement(customer.id, MeasureType::Water, datetime!(2024-03-01 00:00:00 UTC)))
        .await
        .unwrap();

    let res = store
        .create_measurement(make_measurement(customer.id, MeasureType::Water, datetime!(2024-03-31 23:59:59 UTC)))
        .await;
    assert!(matches!(res, Err(StoreError::Duplicate)));

    // Other type and next month are separate periods.
    store
        .create_measurement(make_measurement(customer.id, MeasureType::Gas, datetime!(2024-03-31 23:59:59 UTC)))
        .await
        .unwrap();
    store
        .create_measurement(make_measurement(customer.id, MeasureType::Water, datetime!(2024-04-01 00:00:00 UTC)))
        .await
        .unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM measures")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[sqlx::test(migrations = "../sql/schema")]
async fn test_period_window_is_half_open(pool: sqlx::PgPool) {
    let store = PgMeasurementStore::new(pool);
    let customer = store.create_customer("CUST-1").await.unwrap();
    let period = march();

    assert!(!store
        .has_measurement_in_period("CUST-1", MeasureType::Water, &period)
        .await
        .unwrap());

    // Last instant of February and first instant of April fall outside March.
    store
        .create_measurement(make_measurement(customer.id, MeasureType::Water, datetime!(2024-02-29 23:59:59 UTC)))
        .await
        .unwrap();
    store
        .create_measurement(make_measurement(customer.id, MeasureType::Water, datetime!(2024-04-01 00:00:00 UTC)))
        .await
        .unwrap();
    assert!(!store
        .has_measurement_in_period("CUST-1", MeasureType::Water, &period)
        .await
        .unwrap());

    store
        .create_measurement(make_measurement(customer.id, MeasureType::Water, datetime!(2024-03-01 00:00:00 UTC)))
        .await
        .unwrap();
    assert!(store
        .has_measurement_in_period("CUST-1", MeasureType::Water, &period)
        .await
        .unwrap());

    assert!(!store
        .has_measurement_in_period("CUST-1", MeasureType::Gas, &period)
        .await
        .unwrap());
    assert!(!store
        .has_measurement_in_period("NOBODY", MeasureType::Water, &period)
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../sql/schema")]
async fn test_listing_filters_by_type_in_insertion_order(pool: sqlx::PgPool) {
    let store = PgMeasurementStore::new(pool);
    let customer = store.create_customer("CUST-1").await.unwrap();
    let other = store.create_customer("CUST-2").await.unwrap();

    // Inserted out of chronological order on purpose.
    let april = store
        .create_measurement(make_measurement(customer.id, MeasureType::Water, datetime!(2024-04-02 10:00:00 UTC)))
        .await
        .unwrap();
    let gas = store
        .create_measurement(make_measurement(customer.id, MeasureType::Gas, datetime!(2024-03-15 10:00:00 UTC)))
        .await
        .unwrap();
    let march_water = store
        .create_measurement(make_measurement(customer.id, MeasureType::Water, datetime!(2024-03-15 10:00:00 UTC)))
        .await
        .unwrap();
    store
        .create_measurement(make_measurement(other.id, MeasureType::Water, datetime!(2024-03-15 10:00:00 UTC)))
        .await
        .unwrap();

    let all = store.list_measurements(customer.id, None).await.unwrap();
    assert_eq!(
        all.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![april.id, gas.id, march_water.id]
    );

    let water = store.list_measurements(customer.id, Some(MeasureType::Water)).await.unwrap();
    assert_eq!(
        water.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![april.id, march_water.id]
    );

    let gas_only = store.list_measurements(customer.id, Some(MeasureType::Gas)).await.unwrap();
    assert_eq!(gas_only.len(), 1);
    assert_eq!(gas_only[0].measure_type, MeasureType::Gas);

    assert!(store.list_measurements(Uuid::new_v4(), None).await.unwrap().is_empty());
}

// ============================================================================
// Update and Confirm Tests
// ============================================================================

#[sqlx::test(migrations = "../sql/schema")]
async fn test_update_overwrites_value_and_flag(pool: sqlx::PgPool) {
    let store = PgMeasurementStore::new(pool);
    let customer = store.create_customer("CUST-1").await.unwrap();
    let m = store
        .create_measurement(make_measurement(customer.id, MeasureType::Gas, datetime!(2024-03-15 10:00:00 UTC)))
        .await
        .unwrap();

    let updated = store.update_measurement(m.id, 900, true).await.unwrap();
    assert_eq!(updated.value, 900);
    assert!(updated.confirmed);

    let res = store.update_measurement(Uuid::new_v4(), 1, true).await;
    assert!(matches!(res, Err(StoreError::NotFound)));
}

#[sqlx::test(migrations = "../sql/schema")]
async fn test_confirmation_happens_once(pool: sqlx::PgPool) {
    let store = PgMeasurementStore::new(pool);
    let customer = store.create_customer("CUST-1").await.unwrap();
    let m = store
        .create_measurement(make_measurement(customer.id, MeasureType::Gas, datetime!(2024-03-15 10:00:00 UTC)))
        .await
        .unwrap();

    let confirmed = store.confirm_measurement(m.id, 111).await.unwrap();
    assert!(confirmed.confirmed);
    assert_eq!(confirmed.value, 111);

    let res = store.confirm_measurement(m.id, 222).await;
    assert!(matches!(res, Err(StoreError::AlreadyConfirmed)));
    assert_eq!(store.get_measurement(m.id).await.unwrap().unwrap().value, 111);

    let res = store.confirm_measurement(Uuid::new_v4(), 1).await;
    assert!(matches!(res, Err(StoreError::NotFound)));
}

#[sqlx::test(migrations = "../sql/schema")]
async fn test_concurrent_confirms_let_one_through(pool: sqlx::PgPool) {
    let store = PgMeasurementStore::new(pool);
    let customer = store.create_customer("CUST-1").await.unwrap();
    let m = store
        .create_measurement(make_measurement(customer.id, MeasureType::Water, datetime!(2024-03-15 10:00:00 UTC)))
        .await
        .unwrap();

    let (a, b) = tokio::join!(store.confirm_measurement(m.id, 111), store.confirm_measurement(m.id, 222));

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(matches!(a, Err(StoreError::AlreadyConfirmed)) || matches!(b, Err(StoreError::AlreadyConfirmed)));

    let stored = store.get_measurement(m.id).await.unwrap().unwrap();
    let expected = if a.is_ok() { 111 } else { 222 };
    assert_eq!(stored.value, expected);
}
