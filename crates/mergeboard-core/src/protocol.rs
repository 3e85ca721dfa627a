//! Wire protocol: the envelope carried over the broadcast transport.
//!
//! Every message is a JSON object with exactly one key naming the variant,
//! e.g. `{"draw": {...}}` or `{"me": {"username": "alice"}}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::primitive::Batch;

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Self-identifying participant announce payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub username: String,
}

/// A tagged message envelope. Exactly one variant is set per envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Envelope {
    /// One flushed batch of primitives.
    Draw(Batch),
    /// Empty the canvas on every peer.
    Clear {},
    /// Join-time catch-up request; any peer with state answers.
    RequestBoard {},
    /// Full ordered copy of the sender's canvas log.
    WholeDraw(Vec<Batch>),
    /// Optimistic claim of the exclusive speaking token.
    RequestPillow { holder: String },
    /// Periodic presence announce.
    Me(ParticipantInfo),
    /// Departure notice.
    Leave { name: String },
}

impl Envelope {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }
}
