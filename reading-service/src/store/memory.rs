use reading_client::domain::{BillingPeriod, Customer, MeasureType, Measurement, NewMeasurement};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MeasurementStore, StoreError};

#[derive(Default)]
struct Tables {
    customers: Vec<Customer>,
    measurements: Vec<Measurement>,
}

/// Process-local `MeasurementStore`, used by tests and local runs.
///
/// A single lock covers both tables, so uniqueness checks and inserts are
/// atomic with respect to each other.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn measurement_count(&self) -> usize {
        self.tables.read().await.measurements.len()
    }
}

#[async_trait::async_trait]
impl MeasurementStore for InMemoryStore {
    async fn create_customer(&self, code: &str) -> Result<Customer, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.customers.iter().any(|c| c.code == code) {
            return Err(StoreError::Duplicate);
        }

        let customer = Customer {
            id: Uuid::new_v4(),
            code: code.to_string(),
        };
        tables.customers.push(customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, code: &str) -> Result<Option<Customer>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.iter().find(|c| c.code == code).cloned())
    }

    async fn has_measurement_in_period(
        &self,
        customer_code: &str,
        measure_type: MeasureType,
        period: &BillingPeriod,
    ) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        let Some(customer) = tables.customers.iter().find(|c| c.code == customer_code) else {
            return Ok(false);
        };

        Ok(tables.measurements.iter().any(|m| {
            m.customer_id == customer.id && m.measure_type == measure_type && period.contains(m.measure_datetime)
        }))
    }

    async fn create_measurement(&self, new: NewMeasurement) -> Result<Measurement, StoreError> {
        let mut tables = self.tables.write().await;

        let taken = tables.measurements.iter().any(|m| {
            m.customer_id == new.customer_id
                && m.measure_type == new.measure_type
                && m.period_start == new.period_start
        });
        if taken {
            return Err(StoreError::Duplicate);
        }

        let measurement = Measurement {
            id: Uuid::new_v4(),
            customer_id: new.customer_id,
            measure_type: new.measure_type,
            measure_datetime: new.measure_datetime,
            period_start: new.period_start,
            value: new.value,
            confirmed: false,
            image_url: new.image_url,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.measurements.push(measurement.clone());
        Ok(measurement)
    }

    async fn get_measurement(&self, id: Uuid) -> Result<Option<Measurement>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.measurements.iter().find(|m| m.id == id).cloned())
    }

    async fn list_measurements(
        &self,
        customer_id: Uuid,
        measure_type: Option<MeasureType>,
    ) -> Result<Vec<Measurement>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .measurements
            .iter()
            .filter(|m| m.customer_id == customer_id)
            .filter(|m| measure_type.map_or(true, |t| m.measure_type == t))
            .cloned()
            .collect())
    }

    async fn update_measurement(&self, id: Uuid, value: i64, confirmed: bool) -> Result<Measurement, StoreError> {
        let mut tables = self.tables.write().await;
        let m = tables
            .measurements
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::NotFound)?;

        m.value = value;
        m.confirmed = confirmed;
        Ok(m.clone())
    }

    async fn confirm_measurement(&self, id: Uuid, value: i64) -> Result<Measurement, StoreError> {
        let mut tables = self.tables.write().await;
        let m = tables
            .measurements
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::NotFound)?;

        if m.confirmed {
            return Err(StoreError::AlreadyConfirmed);
        }

        m.value = value;
        m.confirmed = true;
        Ok(m.clone())
    }
}
