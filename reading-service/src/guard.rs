use reading_client::domain::{BillingPeriod, MeasureType};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    error::{ReadingError, ReadingResult},
    store::MeasurementStore,
    validation::ValidationError,
};

/// Billing month for a reading taken at `ts`.
pub fn billing_period(ts: OffsetDateTime, offset: UtcOffset) -> ReadingResult<BillingPeriod> {
    BillingPeriod::containing(ts, offset)
        .map_err(|e| ValidationError::invalid_data(format!("measure_datetime out of range: {e}")).into())
}

/// Reject a reading when the customer already reported one of the same type
/// in `period`.
///
/// This is a read-only pre-check. `MeasurementStore::create_measurement`
/// enforces the same rule on insert, so two uploads racing past this check
/// still end with a single stored reading.
pub async fn check_duplicate(
    store: &dyn MeasurementStore,
    customer_code: &str,
    measure_type: MeasureType,
    period: &BillingPeriod,
) -> ReadingResult<()> {
    if store.has_measurement_in_period(customer_code, measure_type, period).await? {
        metrics::counter!(crate::metrics_server::UPLOAD_DUPLICATES_TOTAL).increment(1);
        tracing::warn!(
            customer_code,
            measure_type = %measure_type,
            period_start = %period.start,
            "reading already reported for billing period"
        );
        return Err(ReadingError::DoubleReport);
    }

    Ok(())
}
