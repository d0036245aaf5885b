pub mod gemini;

use reading_client::domain::MeasureType;

use crate::images::StoredImage;

pub use gemini::GeminiVisionClient;

/// Largest reading accepted from the vision service.
pub const MAX_READING: i64 = 999_999_999;

#[derive(thiserror::Error, Debug)]
pub enum VisionError {
    #[error("vision request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("vision service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("vision service returned no text")]
    EmptyResponse,
    #[error("vision response contains no digits")]
    NoDigits,
    #[error("implausible meter reading '{0}'")]
    Implausible(String),
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// External model that looks at a meter photo and answers in free text.
#[async_trait::async_trait]
pub trait VisionClient: Send + Sync {
    async fn recognize(&self, image: &StoredImage, measure_type: MeasureType) -> Result<String, VisionError>;
}

/// Instruction sent along with the image.
pub fn prompt_for(measure_type: MeasureType) -> String {
    let kind = match measure_type {
        MeasureType::Gas => "gas",
        MeasureType::Water => "water",
    };
    format!(
        "The image you received is a {kind} meter, please return to me ONLY the number of the meter. \
         The numbers are in the center of the meter"
    )
}

/// Pull a reading out of free text by keeping only its ASCII digits.
///
/// Stray digits in surrounding prose end up in the number; the bound check
/// only catches the grossest cases. Text without digits is an error.
pub fn extract_reading(text: &str) -> Result<i64, VisionError> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(VisionError::NoDigits);
    }

    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(0);
    }

    match significant.parse::<i64>() {
        Ok(v) if v <= MAX_READING => Ok(v),
        _ => Err(VisionError::Implausible(digits)),
    }
}

/// Ask the vision service for the reading shown in `image`.
pub async fn read_meter(
    client: &dyn VisionClient,
    image: &StoredImage,
    measure_type: MeasureType,
) -> Result<i64, VisionError> {
    let outcome: Result<i64, VisionError> = async {
        let text = client.recognize(image, measure_type).await?;
        tracing::debug!(file = %image.file_name, response = %text, "vision response");
        extract_reading(&text)
    }
    .await;

    // Logged once, at the response boundary.
    if outcome.is_err() {
        metrics::counter!(crate::metrics_server::VISION_FAILURES_TOTAL).increment(1);
    }

    outcome
}
