//! REST API module for HTTP endpoints
//!
//! Read-only views used for client recovery and monitoring:
//! - `GET /api/rooms` - Active rooms with counts
//! - `GET /api/rooms/:room_id/graph` - Authoritative graph snapshot
//! - `GET /api/rooms/:room_id/members` - Room roster

pub mod rooms;

use serde::Serialize;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Room sequence id the data reflects; absent for cross-room listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, sequence_id: u64) -> Self {
        Self {
            data,
            sequence_id: Some(sequence_id),
            total: None,
        }
    }

    pub fn with_total(data: T, sequence_id: u64, total: usize) -> Self {
        Self {
            data,
            sequence_id: Some(sequence_id),
            total: Some(total),
        }
    }

    /// A listing spanning several rooms, which share no sequence
    pub fn listing(data: T, total: usize) -> Self {
        Self {
            data,
            sequence_id: None,
            total: Some(total),
        }
    }
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "NOT_FOUND".to_string(),
        }
    }
}
