pub mod image;

use reading_client::domain::MeasureType;
use serde::Deserialize;
use serde_json::Value;
use time::{format_description::well_known::Rfc3339, macros::datetime, macros::format_description, Date, OffsetDateTime, UtcOffset};
use uuid::Uuid;

pub use image::{parse_data_uri, ImageMime, ImagePayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    InvalidData,
    InvalidType,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidData => "INVALID_DATA",
            Self::InvalidType => "INVALID_TYPE",
        }
    }
}

/// First rule a request broke, in a form fit for the response body.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub code: ValidationCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(ValidationCode::InvalidData, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub customer_code: String,
    pub measure_datetime: OffsetDateTime,
    pub measure_type: MeasureType,
    pub image: ImagePayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub measure_id: Uuid,
    pub confirmed_value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub customer_code: String,
    pub measure_type: Option<MeasureType>,
}

const MEASURE_TYPE_MESSAGE: &str = "measure_type must be \"GAS\" or \"WATER\"";

/// Upload body as received. Fields stay loosely typed so each rule can
/// report its own message.
#[derive(Debug, Deserialize)]
pub struct IncomingUpload {
    pub customer_code: Option<Value>,
    pub measure_datetime: Option<Value>,
    pub measure_type: Option<Value>,
    pub image: Option<Value>,
}

/// Confirm body as received.
#[derive(Debug, Deserialize)]
pub struct IncomingConfirm {
    pub measure_uuid: Option<Value>,
    pub confirmed_value: Option<Value>,
}

fn required_str<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a str, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::invalid_data(format!("{field} is required"))),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ValidationError::invalid_data(format!("{field} must be a string"))),
    }
}

/// Blank codes are rejected; anything else is kept exactly as sent.
fn non_blank(value: &str, field: &str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::invalid_data(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

/// Parse a reading timestamp.
///
/// Accepts RFC 3339 date-times and plain `YYYY-MM-DD` dates; a plain date is
/// midnight in `offset`.
pub fn parse_measure_datetime(s: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(ts);
    }

    let date = Date::parse(s, format_description!("[year]-[month]-[day]")).ok()?;
    Some(date.midnight().assume_offset(offset))
}

/// Pure validation of an upload body.
///
/// Rules, checked in field order so the first violation is reported:
/// - customer_code is a non-blank string, kept verbatim.
/// - measure_datetime is an RFC 3339 date-time or `YYYY-MM-DD` date within
///   [2000-01-01, 2100-01-01).
/// - measure_type is exactly "GAS" or "WATER".
/// - image is a base64 data URI of a png/jpg/jpeg/gif/bmp/webp image.
pub fn validate_upload(body: &IncomingUpload, offset: UtcOffset) -> Result<UploadRequest, ValidationError> {
    let customer_code = non_blank(required_str(body.customer_code.as_ref(), "customer_code")?, "customer_code")?;

    let raw_datetime = required_str(body.measure_datetime.as_ref(), "measure_datetime")?;
    let measure_datetime = parse_measure_datetime(raw_datetime.trim(), offset).ok_or_else(|| {
        ValidationError::invalid_data("measure_datetime must be a date (YYYY-MM-DD) or an RFC 3339 date-time")
    })?;

    let min_ts = datetime!(2000-01-01 00:00:00 UTC);
    let max_ts = datetime!(2100-01-01 00:00:00 UTC);
    if measure_datetime < min_ts || measure_datetime >= max_ts {
        return Err(ValidationError::invalid_data(
            "measure_datetime must be between 2000-01-01 and 2100-01-01",
        ));
    }

    let measure_type = required_str(body.measure_type.as_ref(), "measure_type")?
        .parse::<MeasureType>()
        .map_err(|_| ValidationError::invalid_data(MEASURE_TYPE_MESSAGE))?;

    let image = parse_data_uri(required_str(body.image.as_ref(), "image")?).ok_or_else(|| {
        ValidationError::invalid_data(
            "image must be a base64 data URI (data:image/<png|jpg|jpeg|gif|bmp|webp>;base64,...)",
        )
    })?;

    Ok(UploadRequest {
        customer_code,
        measure_datetime,
        measure_type,
        image,
    })
}

fn integer_value(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }

    // 12.0 is an integer; 12.5 is not.
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f.abs() <= (1u64 << 53) as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Pure validation of a confirm body.
///
/// Rules:
/// - measure_uuid is a UUID string.
/// - confirmed_value is a non-negative JSON integer.
pub fn validate_confirm(body: &IncomingConfirm) -> Result<ConfirmRequest, ValidationError> {
    let raw_id = required_str(body.measure_uuid.as_ref(), "measure_uuid")?;
    let measure_id = Uuid::parse_str(raw_id.trim())
        .map_err(|_| ValidationError::invalid_data("measure_uuid must be a valid UUID"))?;

    let confirmed_value = match &body.confirmed_value {
        None | Some(Value::Null) => return Err(ValidationError::invalid_data("confirmed_value is required")),
        Some(v) => integer_value(v)
            .ok_or_else(|| ValidationError::invalid_data("confirmed_value must be an integer"))?,
    };

    if confirmed_value < 0 {
        return Err(ValidationError::invalid_data("confirmed_value must not be negative"));
    }

    Ok(ConfirmRequest {
        measure_id,
        confirmed_value,
    })
}

/// Pure validation of list parameters. A bad filter is reported as
/// `INVALID_TYPE`.
pub fn validate_list(customer_code: &str, measure_type: Option<&str>) -> Result<ListRequest, ValidationError> {
    let customer_code = non_blank(customer_code, "customer_code")?;

    let measure_type = measure_type
        .map(|t| {
            t.parse::<MeasureType>()
                .map_err(|_| ValidationError::new(ValidationCode::InvalidType, "measure type not allowed"))
        })
        .transpose()?;

    Ok(ListRequest {
        customer_code,
        measure_type,
    })
}
