//! In-process stand-in for the LiveKit Room Service.
//!
//! Serves the Twirp endpoints `RoomClient` calls, with protobuf bodies, from
//! an in-memory set of rooms.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use livekit_protocol as proto;
use prost::Message;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// `creation_time` of the first room the service creates; later rooms add one
/// second each.
pub const FIRST_CREATION_TIME: i64 = 1_700_000_000;

#[derive(Default)]
struct Rooms {
    rooms: Vec<proto::Room>,
    participants: HashMap<String, Vec<proto::ParticipantInfo>>,
    create_requests: Vec<proto::CreateRoomRequest>,
}

#[derive(Clone, Default)]
pub struct MockRoomService {
    inner: Arc<Mutex<Rooms>>,
}

impl MockRoomService {
    /// Starts the service on an ephemeral port and returns its address.
    pub async fn start(&self) -> SocketAddr {
        let app = Router::new()
            .route("/twirp/livekit.RoomService/CreateRoom", post(create_room))
            .route("/twirp/livekit.RoomService/ListRooms", post(list_rooms))
            .route(
                "/twirp/livekit.RoomService/ListParticipants",
                post(list_participants),
            )
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    pub fn add_room(&self, room: proto::Room) {
        self.inner.lock().unwrap().rooms.push(room);
    }

    pub fn add_participant(&self, room: &str, participant: proto::ParticipantInfo) {
        self.inner
            .lock()
            .unwrap()
            .participants
            .entry(room.to_string())
            .or_default()
            .push(participant);
    }

    pub fn create_requests(&self) -> Vec<proto::CreateRoomRequest> {
        self.inner.lock().unwrap().create_requests.clone()
    }
}

pub fn room(name: &str, sid: &str, creation_time: i64, num_participants: u32) -> proto::Room {
    proto::Room {
        name: name.to_string(),
        sid: sid.to_string(),
        creation_time,
        num_participants,
        max_participants: 10,
        ..Default::default()
    }
}

pub fn participant(
    identity: &str,
    name: &str,
    kind: proto::participant_info::Kind,
    num_tracks: usize,
) -> proto::ParticipantInfo {
    proto::ParticipantInfo {
        identity: identity.to_string(),
        name: name.to_string(),
        kind: kind as i32,
        tracks: vec![proto::TrackInfo::default(); num_tracks],
        ..Default::default()
    }
}

fn protobuf<M: Message>(message: M) -> Response {
    (
        [(CONTENT_TYPE, "application/protobuf")],
        message.encode_to_vec(),
    )
        .into_response()
}

fn twirp_error(status: StatusCode, code: &str, msg: &str) -> Response {
    (status, Json(json!({ "code": code, "msg": msg }))).into_response()
}

fn check_auth(headers: &HeaderMap) -> Result<(), Response> {
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value.starts_with("Bearer ") => Ok(()),
        _ => Err(twirp_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "missing bearer token",
        )),
    }
}

async fn create_room(
    State(service): State<MockRoomService>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = check_auth(&headers) {
        return rejection;
    }
    let Ok(request) = proto::CreateRoomRequest::decode(body) else {
        return twirp_error(StatusCode::BAD_REQUEST, "malformed", "bad CreateRoomRequest");
    };

    let mut inner = service.inner.lock().unwrap();
    let index = inner.create_requests.len();
    let room = proto::Room {
        sid: format!("RM_{index:04}"),
        name: request.name.clone(),
        empty_timeout: request.empty_timeout,
        max_participants: request.max_participants,
        creation_time: FIRST_CREATION_TIME + index as i64,
        ..Default::default()
    };
    inner.create_requests.push(request);
    inner.rooms.push(room.clone());
    protobuf(room)
}

async fn list_rooms(State(service): State<MockRoomService>, headers: HeaderMap) -> Response {
    if let Err(rejection) = check_auth(&headers) {
        return rejection;
    }
    let rooms = service.inner.lock().unwrap().rooms.clone();
    protobuf(proto::ListRoomsResponse { rooms })
}

async fn list_participants(
    State(service): State<MockRoomService>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = check_auth(&headers) {
        return rejection;
    }
    let Ok(request) = proto::ListParticipantsRequest::decode(body) else {
        return twirp_error(StatusCode::BAD_REQUEST, "malformed", "bad ListParticipantsRequest");
    };
    let participants = service
        .inner
        .lock()
        .unwrap()
        .participants
        .get(&request.room)
        .cloned()
        .unwrap_or_default();
    protobuf(proto::ListParticipantsResponse { participants })
}
