//! Room endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::{ApiError, ApiResponse};
use crate::api::websocket::state::AppState;
use crate::room::Room;
use crate::types::{Edge, Node};

/// Response for GET /api/rooms/:room_id/graph
#[derive(Debug, Serialize)]
pub struct GraphResponse {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

fn room_not_found(room_id: &str) -> Response {
    let error = ApiError::not_found(format!("Room '{}' not found", room_id));
    (StatusCode::NOT_FOUND, Json(error)).into_response()
}

fn find_room(state: &AppState, room_id: &str) -> Result<Arc<Room>, Response> {
    state.registry().room(room_id).ok_or_else(|| room_not_found(room_id))
}

/// GET /api/rooms - List active rooms
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rooms = state.registry().summaries();
    let total = rooms.len();
    Json(ApiResponse::listing(rooms, total))
}

/// GET /api/rooms/:room_id/graph - Authoritative graph snapshot
///
/// Includes the sequence id so a recovering client knows which relay
/// messages the snapshot already covers.
pub async fn get_room_graph(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Response {
    let room = match find_room(&state, &room_id) {
        Ok(room) => room,
        Err(response) => return response,
    };

    let (graph, sequence_id) = {
        let state = room.lock();
        (state.graph.current_graph(), state.sequence())
    };

    let response = GraphResponse {
        nodes: graph.nodes,
        edges: graph.edges,
    };
    Json(ApiResponse::new(response, sequence_id)).into_response()
}

/// GET /api/rooms/:room_id/members - Usernames in join order
pub async fn get_room_members(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Response {
    let room = match find_room(&state, &room_id) {
        Ok(room) => room,
        Err(response) => return response,
    };

    let (members, sequence_id) = {
        let state = room.lock();
        (state.usernames(), state.sequence())
    };
    let total = members.len();
    Json(ApiResponse::with_total(members, sequence_id, total)).into_response()
}
