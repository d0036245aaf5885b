pub mod memory;
pub mod postgres;

use reading_client::domain::{BillingPeriod, Customer, MeasureType, Measurement, NewMeasurement};
use uuid::Uuid;

pub use memory::InMemoryStore;
pub use postgres::PgMeasurementStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    /// A uniqueness rule rejected the write: a taken customer code, or a
    /// second reading for the same customer, type and billing month.
    #[error("duplicate record")]
    Duplicate,
    #[error("measurement already confirmed")]
    AlreadyConfirmed,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for customers and their readings.
///
/// Implementations must make `create_measurement` reject a second reading
/// for the same `(customer_id, measure_type, period_start)` atomically, and
/// `confirm_measurement` must flip the flag at most once per reading.
#[async_trait::async_trait]
pub trait MeasurementStore: Send + Sync {
    async fn create_customer(&self, code: &str) -> Result<Customer, StoreError>;

    async fn get_customer(&self, code: &str) -> Result<Option<Customer>, StoreError>;

    async fn has_measurement_in_period(
        &self,
        customer_code: &str,
        measure_type: MeasureType,
        period: &BillingPeriod,
    ) -> Result<bool, StoreError>;

    async fn create_measurement(&self, new: NewMeasurement) -> Result<Measurement, StoreError>;

    async fn get_measurement(&self, id: Uuid) -> Result<Option<Measurement>, StoreError>;

    /// Insertion order.
    async fn list_measurements(
        &self,
        customer_id: Uuid,
        measure_type: Option<MeasureType>,
    ) -> Result<Vec<Measurement>, StoreError>;

    async fn update_measurement(&self, id: Uuid, value: i64, confirmed: bool) -> Result<Measurement, StoreError>;

    /// Set `value` and mark the reading confirmed, only if it is not
    /// confirmed yet. Fails with `AlreadyConfirmed` otherwise.
    async fn confirm_measurement(&self, id: Uuid, value: i64) -> Result<Measurement, StoreError>;
}
