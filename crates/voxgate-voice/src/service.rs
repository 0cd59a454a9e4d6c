use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use livekit_api::access_token::{AccessToken, VideoGrants};
use livekit_api::services::room::{CreateRoomOptions, RoomClient};
use livekit_protocol as proto;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Options for [`VoiceService::create_room`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomOptions {
    /// Seconds before an empty room is closed.
    pub empty_timeout: u32,
    pub max_participants: u32,
}

/// A room as reported by the LiveKit Room Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    pub name: String,
    pub sid: String,
    /// Unix timestamp (seconds).
    pub creation_time: i64,
    pub num_participants: u32,
    pub max_participants: u32,
}

impl From<proto::Room> for RoomSummary {
    fn from(room: proto::Room) -> Self {
        Self {
            name: room.name,
            sid: room.sid,
            creation_time: room.creation_time,
            num_participants: room.num_participants,
            max_participants: room.max_participants,
        }
    }
}

/// A participant currently connected to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantSummary {
    pub identity: String,
    pub name: String,
    /// Protobuf name of the participant kind (`STANDARD`, `AGENT`, ...).
    /// Kinds this build does not know are reported as their number.
    pub kind: String,
    pub num_tracks: usize,
}

impl From<proto::ParticipantInfo> for ParticipantSummary {
    fn from(p: proto::ParticipantInfo) -> Self {
        Self {
            identity: p.identity,
            name: p.name,
            kind: proto::participant_info::Kind::try_from(p.kind)
                .map(|kind| kind.as_str_name().to_string())
                .unwrap_or_else(|_| p.kind.to_string()),
            num_tracks: p.tracks.len(),
        }
    }
}

/// A room together with its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomDetail {
    #[serde(flatten)]
    pub room: RoomSummary,
    pub participants: Vec<ParticipantSummary>,
}

#[derive(Debug)]
pub struct VoiceService {
    config: LiveKitConfig,
    room_client: RoomClient,
}

impl VoiceService {
    pub fn new(config: LiveKitConfig) -> Self {
        let room_client =
            RoomClient::with_api_key(&config.http_url(), &config.api_key, &config.api_secret);
        Self {
            config,
            room_client,
        }
    }

    pub fn config(&self) -> &LiveKitConfig {
        &self.config
    }

    /// URL handed to clients alongside their token.
    pub fn get_url(&self) -> &str {
        self.config.effective_url()
    }

    /// Default options for rooms created without explicit settings.
    pub fn default_room_options(&self) -> RoomOptions {
        RoomOptions {
            empty_timeout: self.config.default_empty_timeout,
            max_participants: self.config.default_max_participants,
        }
    }

    /// Resolves the room a participant should join.
    ///
    /// With per-participant rooms enabled, each participant is placed in
    /// `room-{participant}` so that a dedicated agent serves them.
    pub fn room_for_participant(&self, requested_room: &str, participant: &str) -> String {
        if self.config.per_participant_rooms {
            format!("room-{participant}")
        } else {
            requested_room.to_string()
        }
    }

    fn require_credentials(&self) -> Result<(), VoiceError> {
        if self.config.has_credentials() {
            Ok(())
        } else {
            Err(VoiceError::MissingCredentials)
        }
    }

    /// Signs a join token granting publish, subscribe and data permissions in
    /// `room_name`.
    pub fn generate_join_token(
        &self,
        room_name: &str,
        participant_identity: &str,
        participant_name: &str,
        metadata: Option<&str>,
    ) -> Result<String, VoiceError> {
        self.require_credentials()?;
        if participant_identity.trim().is_empty() {
            return Err(VoiceError::InvalidRequest(
                "participant identity must not be empty".to_string(),
            ));
        }
        if room_name.trim().is_empty() {
            return Err(VoiceError::InvalidRequest(
                "room name must not be empty".to_string(),
            ));
        }

        let mut token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(participant_identity)
            .with_name(participant_name)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                can_publish: true,
                can_subscribe: true,
                can_publish_data: true,
                ..Default::default()
            })
            .with_ttl(Duration::from_secs(self.config.token_ttl_seconds));

        if let Some(metadata) = metadata.filter(|m| !m.is_empty()) {
            token = token.with_metadata(metadata);
        }

        let jwt = token.to_jwt()?;
        debug!(
            room = room_name,
            participant = participant_identity,
            "issued join token"
        );
        Ok(jwt)
    }

    pub async fn create_room(
        &self,
        name: &str,
        options: RoomOptions,
    ) -> Result<RoomSummary, VoiceError> {
        self.require_credentials()?;
        if name.trim().is_empty() {
            return Err(VoiceError::InvalidRequest(
                "room name must not be empty".to_string(),
            ));
        }

        let room = self
            .room_client
            .create_room(
                name,
                CreateRoomOptions {
                    empty_timeout: options.empty_timeout,
                    max_participants: options.max_participants,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| VoiceError::RoomService(e.to_string()))?;

        info!(room = %room.name, sid = %room.sid, "created LiveKit room");
        Ok(room.into())
    }

    pub async fn list_rooms(&self) -> Result<Vec<RoomSummary>, VoiceError> {
        self.require_credentials()?;
        let rooms = self
            .room_client
            .list_rooms(Vec::new())
            .await
            .map_err(|e| VoiceError::RoomService(e.to_string()))?;
        Ok(rooms.into_iter().map(RoomSummary::from).collect())
    }

    pub async fn list_participants(
        &self,
        room_name: &str,
    ) -> Result<Vec<ParticipantSummary>, VoiceError> {
        self.require_credentials()?;
        let participants = self
            .room_client
            .list_participants(room_name)
            .await
            .map_err(|e| VoiceError::RoomService(e.to_string()))?;
        Ok(participants
            .into_iter()
            .map(ParticipantSummary::from)
            .collect())
    }

    /// Lists every active room with its participants.
    pub async fn list_rooms_with_participants(&self) -> Result<Vec<RoomDetail>, VoiceError> {
        let rooms = self.list_rooms().await?;
        let mut details = Vec::with_capacity(rooms.len());
        for room in rooms {
            let participants = self.list_participants(&room.name).await?;
            details.push(RoomDetail { room, participants });
        }
        Ok(details)
    }
}
