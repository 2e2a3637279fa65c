//! Average Temperature Routes

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;
use storage::Measurement;

/// Response for a single hour
#[derive(Debug, Serialize)]
pub struct HourAverageResponse {
    pub hour: u32,
    pub count: usize,
    pub average: f64,
    pub data: Vec<Measurement>,
}

/// Arithmetic mean of the temperatures, `None` when there are no records
pub fn mean_temperature(records: &[Measurement]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: f64 = records.iter().map(|r| r.temperature).sum();
    Some(sum / records.len() as f64)
}

/// Mean temperature for every recording hour
///
/// Hours without data map to `null`.
pub async fn get_averages(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let mut averages = Map::new();

    for &hour in &state.recording_hours {
        let records = state.store.find_by_hour(hour).await?;
        let mean = mean_temperature(&records);
        debug!("Hour {}: {} records, mean {:?}", hour, records.len(), mean);

        // Non-finite means also land on null
        averages.insert(hour.to_string(), mean.map(Value::from).unwrap_or(Value::Null));
    }

    let body = serde_json::to_vec(&averages)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

/// Records and mean temperature for one hour
pub async fn get_hour_average(
    State(state): State<Arc<AppState>>,
    Path(raw_hour): Path<String>,
) -> Result<Json<HourAverageResponse>, ApiError> {
    let hour = parse_hour(&raw_hour)?;

    let data = state.store.find_by_hour(hour).await?;
    let average = mean_temperature(&data).ok_or(ApiError::NoData(hour))?;

    Ok(Json(HourAverageResponse {
        hour,
        count: data.len(),
        average,
        data,
    }))
}

fn parse_hour(raw: &str) -> Result<u32, ApiError> {
    match raw.parse::<u32>() {
        Ok(hour) if hour <= 23 => Ok(hour),
        _ => Err(ApiError::InvalidHour(raw.to_string())),
    }
}
