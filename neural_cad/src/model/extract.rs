//! Pulling the program text out of the decoded sequence.

use crate::config::TokenMarkers;
use crate::error::{NeuralCadError, Result};

/// Text strictly between the first begin marker and the first end marker
/// after it.
///
/// # Errors
/// [`NeuralCadError::MissingMarker`] naming whichever marker is absent.
pub fn extract_program(text: &str, markers: &TokenMarkers) -> Result<String> {
    let start = text
        .find(&markers.begin)
        .map(|i| i + markers.begin.len())
        .ok_or_else(|| NeuralCadError::MissingMarker {
            marker: markers.begin.clone(),
        })?;
    let len = text[start..]
        .find(&markers.end)
        .ok_or_else(|| NeuralCadError::MissingMarker {
            marker: markers.end.clone(),
        })?;
    Ok(text[start..start + len].to_string())
}
