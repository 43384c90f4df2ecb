//! Jersey mappings - user-confirmed (track id → jersey number) overrides.
//!
//! Stored by the external API and merged at display time with the
//! highest precedence over tracker-inferred numbers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::{lenient_coords, TrackId};

/// Manual jersey number override for one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JerseyMapping {
    pub jersey_number: u32,
    /// Frame at which the user confirmed the number
    #[serde(default)]
    pub frame: u64,
    /// Player bbox at confirmation time
    #[serde(default, deserialize_with = "lenient_coords")]
    pub bbox: Vec<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Accept RFC 3339 or naive ISO timestamps (assumed UTC); anything else is dropped.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }))
}

/// `GET /videos/{id}/jersey-mappings` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JerseyMappingsResponse {
    /// Keyed by stringified track id
    #[serde(default)]
    pub mappings: HashMap<String, JerseyMapping>,
}

impl JerseyMappingsResponse {
    /// Mappings keyed by numeric track id; unparsable keys are skipped
    pub fn by_track_id(&self) -> HashMap<TrackId, JerseyMapping> {
        self.mappings
            .iter()
            .filter_map(|(key, mapping)| {
                key.trim()
                    .parse::<TrackId>()
                    .ok()
                    .map(|id| (id, mapping.clone()))
            })
            .collect()
    }
}

/// `POST /videos/{id}/jersey-mapping` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetJerseyMappingRequest {
    pub video_id: String,
    pub track_id: TrackId,
    pub jersey_number: u32,
    pub frame: u64,
    pub bbox: Vec<f64>,
}
