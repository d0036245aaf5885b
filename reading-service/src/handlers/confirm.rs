use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use super::{rejected, rejected_body, AppState};
use crate::{
    error::{ReadingError, ReadingResult},
    store::StoreError,
    validation::{validate_confirm, IncomingConfirm},
};

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
}

/// PATCH /confirm
///
/// Moves a reading from unconfirmed to confirmed, replacing its value. A
/// confirmed reading never changes again.
pub async fn confirm(
    State(state): State<AppState>,
    body: Result<Json<IncomingConfirm>, JsonRejection>,
) -> ReadingResult<Json<ConfirmResponse>> {
    let Json(body) = body.map_err(rejected_body)?;
    let req = validate_confirm(&body).map_err(rejected)?;

    let measurement = state
        .store
        .get_measurement(req.measure_id)
        .await?
        .ok_or(ReadingError::MeasureNotFound)?;

    if measurement.confirmed {
        tracing::warn!(measure_uuid = %req.measure_id, "reading already confirmed");
        return Err(ReadingError::ConfirmationDuplicate);
    }

    // The flag is checked again atomically; a concurrent confirm may have
    // won since the read above.
    match state.store.confirm_measurement(req.measure_id, req.confirmed_value).await {
        Ok(_) => {}
        Err(StoreError::AlreadyConfirmed) => {
            tracing::warn!(measure_uuid = %req.measure_id, "reading already confirmed");
            return Err(ReadingError::ConfirmationDuplicate);
        }
        Err(StoreError::NotFound) => return Err(ReadingError::MeasureNotFound),
        Err(e) => return Err(e.into()),
    }

    metrics::counter!(crate::metrics_server::CONFIRMATIONS_TOTAL).increment(1);
    tracing::info!(
        measure_uuid = %req.measure_id,
        extracted_value = measurement.value,
        confirmed_value = req.confirmed_value,
        "reading confirmed"
    );

    Ok(Json(ConfirmResponse { success: true }))
}
