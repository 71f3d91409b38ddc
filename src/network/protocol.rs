//! WebSocket Wire Protocol
//!
//! JSON messages exchanged with clients. Every message is a tagged object
//! whose `type` field selects the variant; payload fields are camelCase.
//! Server pushes always carry full match snapshots, never deltas.

use serde::{Deserialize, Serialize};

use crate::game::state::{CreateMatchError, CreateMatchParams, MatchId, MatchState};

// =============================================================================
// CLIENT -> SERVER
// =============================================================================

/// Requests a client may send.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Create a new match and start simulating it.
    CreateMatch(CreateMatchParams),
    /// Ask for a snapshot of every match, live and finished.
    ListMatches,
    /// Ask for one match by id.
    #[serde(rename_all = "camelCase")]
    GetMatch {
        /// Id of the match to fetch.
        match_id: MatchId,
    },
    /// Liveness probe; echoed back with the server's clock.
    Ping {
        /// Client-side timestamp, echoed verbatim.
        timestamp: i64,
    },
}

// =============================================================================
// SERVER -> CLIENT
// =============================================================================

/// Replies and pushes the server sends.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Reply to `createMatch` with the freshly created state.
    MatchCreated(MatchState),
    /// Full listing, live matches first. Sent on connect and as the reply
    /// to `listMatches`.
    #[serde(rename_all = "camelCase")]
    AllMatches {
        /// Every known match.
        matches: Vec<MatchState>,
    },
    /// Reply to `getMatch`.
    Match(MatchState),
    /// Push: a match's state changed.
    MatchUpdate(MatchState),
    /// Push: a match concluded. The snapshot carries `finished = true`.
    MatchFinished(MatchState),
    /// Reply to `ping`.
    #[serde(rename_all = "camelCase")]
    Pong {
        /// The client's timestamp, echoed.
        timestamp: i64,
        /// Server clock in unix milliseconds.
        server_time: i64,
    },
    /// Any request that could not be served.
    Error(ServerError),
}

/// Machine-readable failure category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request was malformed or failed validation.
    InvalidRequest,
    /// No match with the requested id exists.
    MatchNotFound,
    /// The server hit an unexpected condition.
    InternalError,
}

/// Error payload sent to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerError {
    /// Failure category.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
}

impl ServerError {
    /// Build an error payload.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<CreateMatchError> for ServerError {
    fn from(err: CreateMatchError) -> Self {
        Self::new(ErrorCode::InvalidRequest, err.to_string())
    }
}

// =============================================================================
// JSON HELPERS
// =============================================================================

impl ClientMessage {
    /// Parse a client frame.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize for the wire. Used by test clients.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerMessage {
    /// Serialize for the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a server frame. Used by test clients.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// =============================================================================
// TESTS
// =============================================================================
