use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Kind of meter a reading was taken from.
///
/// The wire form is the exact upper-case name; matching is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MeasureType {
    Gas,
    Water,
}

impl MeasureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gas => "GAS",
            Self::Water => "WATER",
        }
    }
}

impl fmt::Display for MeasureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown measure type '{0}'")]
pub struct UnknownMeasureType(pub String);

impl FromStr for MeasureType {
    type Err = UnknownMeasureType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GAS" => Ok(Self::Gas),
            "WATER" => Ok(Self::Water),
            other => Err(UnknownMeasureType(other.to_string())),
        }
    }
}

/// A single meter reading owned by a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub measure_type: MeasureType,
    /// When the meter was read (client supplied).
    pub measure_datetime: OffsetDateTime,
    /// First instant of the billing month `measure_datetime` falls in.
    pub period_start: OffsetDateTime,
    pub value: i64,
    pub confirmed: bool,
    pub image_url: String,
    pub created_at: OffsetDateTime,
}

/// Insert payload for a measurement; always starts unconfirmed.
#[derive(Debug, Clone)]
pub struct NewMeasurement {
    pub customer_id: Uuid,
    pub measure_type: MeasureType,
    pub measure_datetime: OffsetDateTime,
    pub period_start: OffsetDateTime,
    pub value: i64,
    pub image_url: String,
}

/// Raw `measures` row. `measure_type` is stored as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct MeasureRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub measure_type: String,
    pub measure_datetime: OffsetDateTime,
    pub period_start: OffsetDateTime,
    pub value: i64,
    pub confirmed: bool,
    pub image_url: String,
    pub created_at: OffsetDateTime,
}

impl TryFrom<MeasureRow> for Measurement {
    type Error = UnknownMeasureType;

    fn try_from(r: MeasureRow) -> Result<Self, Self::Error> {
        Ok(Measurement {
            id: r.id,
            customer_id: r.customer_id,
            measure_type: r.measure_type.parse()?,
            measure_datetime: r.measure_datetime,
            period_start: r.period_start,
            value: r.value,
            confirmed: r.confirmed,
            image_url: r.image_url,
            created_at: r.created_at,
        })
    }
}
