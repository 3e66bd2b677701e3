//! Serialized form of a cached response.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Envelope stored under each cache key.
///
/// Serialized as JSON with camelCase fields; the payload travels as base64
/// text so the envelope stays valid JSON regardless of body content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Wall-clock write time, epoch milliseconds.
    pub stored_at_epoch_ms: i64,
    /// The response body bytes.
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    /// How long the origin handler took to produce the payload.
    pub generation_time_ms: f64,
    /// Payload size, recorded for observability.
    pub size_bytes: usize,
}

impl CacheEntry {
    pub fn new(payload: Vec<u8>, generation_time: Duration) -> Self {
        let size_bytes = payload.len();
        Self {
            stored_at_epoch_ms: epoch_ms_now(),
            payload,
            generation_time_ms: generation_time.as_secs_f64() * 1000.0,
            size_bytes,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Age relative to the given wall-clock instant, in milliseconds.
    pub fn age_ms(&self, now_epoch_ms: i64) -> i64 {
        now_epoch_ms - self.stored_at_epoch_ms
    }
}

/// Current wall-clock time as epoch milliseconds.
pub fn epoch_ms_now() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(&text).map_err(serde::de::Error::custom)
    }
}
