use reading_client::{
    db::{customer_queries, is_unique_violation, measure_queries},
    domain::{BillingPeriod, Customer, MeasureType, Measurement, NewMeasurement},
};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::{MeasurementStore, StoreError};

/// `MeasurementStore` backed by Postgres.
///
/// Expects the tables from `sql/schema/01_readings.sql`, applied out of band.
#[derive(Clone)]
pub struct PgMeasurementStore {
    pool: PgPool,
}

impl PgMeasurementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_write_error(e: sqlx::Error) -> StoreError {
    if is_unique_violation(&e) {
        StoreError::Duplicate
    } else {
        StoreError::Database(e)
    }
}

#[async_trait::async_trait]
impl MeasurementStore for PgMeasurementStore {
    async fn create_customer(&self, code: &str) -> Result<Customer, StoreError> {
        customer_queries::insert_customer(&self.pool, Uuid::new_v4(), code)
            .await
            .map_err(map_write_error)
    }

    async fn get_customer(&self, code: &str) -> Result<Option<Customer>, StoreError> {
        Ok(customer_queries::find_customer_by_code(&self.pool, code).await?)
    }

    async fn has_measurement_in_period(
        &self,
        customer_code: &str,
        measure_type: MeasureType,
        period: &BillingPeriod,
    ) -> Result<bool, StoreError> {
        Ok(measure_queries::exists_in_period(&self.pool, customer_code, measure_type, period.start, period.end).await?)
    }

    async fn create_measurement(&self, new: NewMeasurement) -> Result<Measurement, StoreError> {
        measure_queries::insert_measure(&self.pool, Uuid::new_v4(), &new)
            .await
            .map_err(map_write_error)
    }

    async fn get_measurement(&self, id: Uuid) -> Result<Option<Measurement>, StoreError> {
        Ok(measure_queries::find_measure(&self.pool, id).await?)
    }

    async fn list_measurements(
        &self,
        customer_id: Uuid,
        measure_type: Option<MeasureType>,
    ) -> Result<Vec<Measurement>, StoreError> {
        Ok(measure_queries::list_measures_for_customer(&self.pool, customer_id, measure_type).await?)
    }

    async fn update_measurement(&self, id: Uuid, value: i64, confirmed: bool) -> Result<Measurement, StoreError> {
        measure_queries::update_measure(&self.pool, id, value, confirmed)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn confirm_measurement(&self, id: Uuid, value: i64) -> Result<Measurement, StoreError> {
        if let Some(m) = measure_queries::confirm_measure(&self.pool, id, value).await? {
            return Ok(m);
        }

        match measure_queries::find_measure(&self.pool, id).await? {
            Some(_) => Err(StoreError::AlreadyConfirmed),
            None => Err(StoreError::NotFound),
        }
    }
}
