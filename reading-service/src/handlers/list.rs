use axum::{
    extract::{Path, Query, State},
    Json,
};
use reading_client::domain::{MeasureType, Measurement};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{rejected, AppState};
use crate::{
    error::{ReadingError, ReadingResult},
    validation::validate_list,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub measure_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeasureView {
    pub measure_uuid: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub measure_datetime: OffsetDateTime,
    pub measure_type: MeasureType,
    pub has_confirmed: bool,
    pub image_url: String,
}

impl From<Measurement> for MeasureView {
    fn from(m: Measurement) -> Self {
        MeasureView {
            measure_uuid: m.id,
            measure_datetime: m.measure_datetime,
            measure_type: m.measure_type,
            has_confirmed: m.confirmed,
            image_url: m.image_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub customer_code: String,
    pub measures: Vec<MeasureView>,
}

/// GET /:customer_code/list
///
/// An unknown customer and a customer without matching readings both answer
/// 404 `MEASURES_NOT_FOUND`.
pub async fn list(
    State(state): State<AppState>,
    Path(customer_code): Path<String>,
    Query(query): Query<ListQuery>,
) -> ReadingResult<Json<ListResponse>> {
    let req = validate_list(&customer_code, query.measure_type.as_deref()).map_err(rejected)?;

    let customer = state
        .store
        .get_customer(&req.customer_code)
        .await?
        .ok_or(ReadingError::MeasuresNotFound)?;

    let measures = state.store.list_measurements(customer.id, req.measure_type).await?;
    if measures.is_empty() {
        return Err(ReadingError::MeasuresNotFound);
    }

    Ok(Json(ListResponse {
        customer_code: req.customer_code,
        measures: measures.into_iter().map(MeasureView::from).collect(),
    }))
}
