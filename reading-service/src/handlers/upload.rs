use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use reading_client::domain::{BillingPeriod, Customer, Measurement, NewMeasurement};
use serde::Serialize;
use uuid::Uuid;

use super::{rejected, rejected_body, request_host, request_proto, AppState};
use crate::{
    error::{ReadingError, ReadingResult},
    guard,
    images::{image_url, StoredImage},
    store::{MeasurementStore, StoreError},
    validation::{validate_upload, IncomingUpload, UploadRequest},
    vision,
};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub image_url: String,
    pub measure_value: i64,
    pub measure_uuid: Uuid,
}

/// Customers are created on their first successful upload. A concurrent
/// upload may create the same code first; that row is reused.
async fn find_or_create_customer(store: &dyn MeasurementStore, code: &str) -> ReadingResult<Customer> {
    if let Some(customer) = store.get_customer(code).await? {
        return Ok(customer);
    }

    match store.create_customer(code).await {
        Ok(customer) => {
            tracing::info!(customer_code = code, customer_id = %customer.id, "customer created");
            Ok(customer)
        }
        Err(StoreError::Duplicate) => store
            .get_customer(code)
            .await?
            .ok_or(ReadingError::Store(StoreError::NotFound)),
        Err(e) => Err(e.into()),
    }
}

/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<IncomingUpload>, JsonRejection>,
) -> ReadingResult<Json<UploadResponse>> {
    let Json(body) = body.map_err(rejected_body)?;
    let req = validate_upload(&body, state.billing_offset).map_err(rejected)?;

    let period = guard::billing_period(req.measure_datetime, state.billing_offset)?;
    guard::check_duplicate(state.store.as_ref(), &req.customer_code, req.measure_type, &period).await?;

    let image = state.images.save(&req.image).await?;
    let stored = store_reading(&state, &headers, &req, &period, &image).await;
    if stored.is_err() {
        state.images.discard(&image).await;
    }
    let (measurement, link) = stored?;

    metrics::counter!(crate::metrics_server::UPLOADS_TOTAL).increment(1);
    tracing::info!(
        customer_code = %req.customer_code,
        measure_uuid = %measurement.id,
        measure_type = %measurement.measure_type,
        measure_value = measurement.value,
        "reading stored"
    );

    Ok(Json(UploadResponse {
        image_url: link,
        measure_value: measurement.value,
        measure_uuid: measurement.id,
    }))
}

/// Read the saved image and persist the reading with its public link.
async fn store_reading(
    state: &AppState,
    headers: &HeaderMap,
    req: &UploadRequest,
    period: &BillingPeriod,
    image: &StoredImage,
) -> ReadingResult<(Measurement, String)> {
    let value = vision::read_meter(state.vision.as_ref(), image, req.measure_type).await?;

    let customer = find_or_create_customer(state.store.as_ref(), &req.customer_code).await?;
    let link = image_url(
        request_proto(headers),
        request_host(headers, &state.public_host),
        &image.file_name,
    );

    let created = state
        .store
        .create_measurement(NewMeasurement {
            customer_id: customer.id,
            measure_type: req.measure_type,
            measure_datetime: req.measure_datetime,
            period_start: period.start,
            value,
            image_url: link.clone(),
        })
        .await;

    match created {
        Ok(m) => Ok((m, link)),
        Err(StoreError::Duplicate) => {
            // Lost a race with a concurrent upload for the same month.
            metrics::counter!(crate::metrics_server::UPLOAD_DUPLICATES_TOTAL).increment(1);
            tracing::warn!(
                customer_code = %req.customer_code,
                measure_type = %req.measure_type,
                "reading already reported for billing period"
            );
            Err(ReadingError::DoubleReport)
        }
        Err(e) => Err(e.into()),
    }
}
