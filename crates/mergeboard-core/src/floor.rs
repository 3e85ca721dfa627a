//! Floor control: the exclusive "pillow" speaking token.
//!
//! There is no arbitration authority. A local request is granted
//! optimistically and any later remote request wins unconditionally, so two
//! participants can transiently both believe they hold the floor. Do not add
//! consensus here without a protocol revision.

/// Who holds the speaking token, as seen by this peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloorState {
    Unheld,
    /// Local claim queued but not yet handed to the transport.
    Requested { holder: String },
    Held { holder: String },
}

/// Single mutable floor slot plus the local recording flag.
#[derive(Debug, Clone)]
pub struct FloorControl {
    local_name: String,
    state: FloorState,
    recording: bool,
}

impl FloorControl {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            state: FloorState::Unheld,
            recording: false,
        }
    }

    pub fn state(&self) -> &FloorState {
        &self.state
    }

    pub fn holder(&self) -> Option<&str> {
        match &self.state {
            FloorState::Unheld => None,
            FloorState::Requested { holder } | FloorState::Held { holder } => Some(holder),
        }
    }

    /// Whether this participant currently considers itself the holder.
    pub fn holds_locally(&self) -> bool {
        self.holder() == Some(self.local_name.as_str())
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Claim the floor optimistically. Always succeeds locally; the caller
    /// broadcasts the matching `requestPillow`. No cooldown: re-requesting
    /// immediately after a release is allowed.
    pub fn request(&mut self) {
        self.state = FloorState::Requested {
            holder: self.local_name.clone(),
        };
    }

    /// Promote a pending local request once its envelope has been handed to
    /// the transport.
    pub fn mark_announced(&mut self) {
        if let FloorState::Requested { holder } = &self.state {
            if *holder == self.local_name {
                self.state = FloorState::Held {
                    holder: holder.clone(),
                };
            }
        }
    }

    /// Explicitly stop speaking, freeing the slot. Returns true if this peer
    /// actually held it.
    pub fn release(&mut self) -> bool {
        let held = self.holds_locally();
        if held {
            self.state = FloorState::Unheld;
            self.recording = false;
        }
        held
    }

    /// Apply a remote `requestPillow`. A request naming another participant
    /// demotes any local hold (last-requester-wins) and stops recording;
    /// returns the new holder's name when the UI should be notified. A
    /// request naming ourselves confirms a pending local claim.
    pub fn observe_request(&mut self, holder: &str) -> Option<String> {
        if holder == self.local_name {
            self.mark_announced();
            return None;
        }
        self.recording = false;
        self.state = FloorState::Held {
            holder: holder.to_string(),
        };
        Some(holder.to_string())
    }

    /// Toggle the recording flag. Only permitted while the floor is held
    /// locally.
    pub fn set_recording(&mut self, recording: bool) -> bool {
        if recording && !self.holds_locally() {
            return false;
        }
        self.recording = recording;
        true
    }
}
