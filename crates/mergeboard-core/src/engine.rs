//! Synchronization engine: the single writer for canvas, floor, and roster.
//!
//! Three event sources can mutate shared state — local pointer input, the
//! periodic timers, and inbound transport envelopes — so all of them funnel
//! through `&mut SyncEngine` methods and are processed one at a time.
//! Outbound envelopes accumulate in a queue drained with [`SyncEngine::take_outgoing`];
//! UI-facing notifications accumulate in a queue drained with
//! [`SyncEngine::take_events`]. The engine never blocks on the network.

use std::time::{Duration, Instant};

use kurbo::Point;
use log::{debug, info};

use crate::canvas::{CanvasState, Surface};
use crate::capture::{PenSettings, StrokeCapture, DEFAULT_FLUSH_INTERVAL};
use crate::floor::{FloorControl, FloorState};
use crate::presence::Roster;
use crate::primitive::{Batch, Primitive};
use crate::protocol::{Envelope, ParticipantInfo};

/// Default interval between `requestBoard` retries while joining.
pub const DEFAULT_JOIN_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Default interval between periodic `me` announces.
pub const DEFAULT_PRESENCE_INTERVAL: Duration = Duration::from_secs(2);

/// Per-peer engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub username: String,
    pub flush_interval: Duration,
    pub join_retry_interval: Duration,
    pub presence_interval: Duration,
}

impl EngineConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            join_retry_interval: DEFAULT_JOIN_RETRY_INTERVAL,
            presence_interval: DEFAULT_PRESENCE_INTERVAL,
        }
    }
}

/// Notifications surfaced to the embedding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A remote batch was appended.
    BatchApplied { author: String, primitives: usize },
    /// A snapshot replaced the whole canvas.
    BoardReplaced { batches: usize },
    /// The canvas was emptied by a remote clear.
    BoardCleared,
    /// Another participant took the floor.
    FloorTaken { holder: String },
    /// The roster changed.
    RosterChanged { labels: Vec<String> },
}

/// The per-participant synchronization state machine.
pub struct SyncEngine {
    config: EngineConfig,
    canvas: CanvasState,
    capture: StrokeCapture,
    floor: FloorControl,
    roster: Roster,
    joining: bool,
    last_board_request: Option<Instant>,
    last_announce: Option<Instant>,
    running: bool,
    outgoing: Vec<Envelope>,
    events: Vec<EngineEvent>,
}

impl SyncEngine {
    pub fn new(config: EngineConfig, surface: Box<dyn Surface>) -> Self {
        let capture = StrokeCapture::new(config.flush_interval);
        let floor = FloorControl::new(config.username.clone());
        let roster = Roster::new(config.username.clone());
        Self {
            config,
            canvas: CanvasState::new(surface),
            capture,
            floor,
            roster,
            joining: false,
            last_board_request: None,
            last_announce: None,
            running: false,
            outgoing: Vec::new(),
            events: Vec::new(),
        }
    }

    // --- Lifecycle ---

    /// Enter the room: announce ourselves and start the join catch-up
    /// protocol, re-broadcasting `requestBoard` until a snapshot arrives.
    pub fn start(&mut self, now: Instant) {
        self.running = true;
        self.joining = true;
        self.last_board_request = Some(now);
        self.last_announce = Some(now);
        self.outgoing.push(Envelope::RequestBoard {});
        self.queue_announce();
        if self.roster.announce_self() {
            self.emit_roster();
        }
        info!("{} joining room", self.config.username);
    }

    /// Drive the periodic timers. Call regularly with the current instant.
    pub fn tick(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        if self.joining {
            let due = self
                .last_board_request
                .is_none_or(|at| now.duration_since(at) >= self.config.join_retry_interval);
            if due {
                self.last_board_request = Some(now);
                self.outgoing.push(Envelope::RequestBoard {});
                debug!("retrying board request");
            }
        }
        let announce_due = self
            .last_announce
            .is_none_or(|at| now.duration_since(at) >= self.config.presence_interval);
        if announce_due {
            self.last_announce = Some(now);
            self.queue_announce();
        }
    }

    /// Leave the room: broadcast a departure notice and stop all timers.
    pub fn leave(&mut self) {
        self.outgoing.push(Envelope::Leave {
            name: self.config.username.clone(),
        });
        self.running = false;
        self.joining = false;
    }

    pub fn is_joining(&self) -> bool {
        self.joining
    }

    // --- Local pointer input ---

    pub fn pointer_down(&mut self, pos: Point, now: Instant) {
        self.capture.pointer_down(pos, now);
    }

    pub fn pointer_moved(&mut self, pos: Point, now: Instant) {
        if let Some(primitives) = self.capture.pointer_moved(pos, now) {
            self.commit_local(primitives);
        }
    }

    pub fn pointer_up(&mut self, now: Instant) {
        if let Some(primitives) = self.capture.pointer_up(now) {
            self.commit_local(primitives);
        }
    }

    pub fn pen_mut(&mut self) -> &mut PenSettings {
        &mut self.capture.pen
    }

    /// Submit an externally produced primitive list (the voice pipeline's
    /// output) exactly like a flushed local batch.
    pub fn submit_primitives(&mut self, primitives: Vec<Primitive>) {
        if !primitives.is_empty() {
            self.commit_local(primitives);
        }
    }

    /// Empty the canvas locally and broadcast the clear.
    pub fn clear_board(&mut self) {
        self.canvas.clear();
        self.outgoing.push(Envelope::Clear {});
    }

    // Local-first: append and paint before the envelope is queued; the
    // broadcast is fire-and-forget.
    fn commit_local(&mut self, primitives: Vec<Primitive>) {
        let batch = Batch::new(self.config.username.clone(), primitives);
        self.canvas.append(batch.clone());
        self.outgoing.push(Envelope::Draw(batch));
    }

    // --- Floor control ---

    /// Optimistically claim the speaking token and broadcast the claim.
    pub fn request_floor(&mut self) {
        self.floor.request();
        self.outgoing.push(Envelope::RequestPillow {
            holder: self.config.username.clone(),
        });
    }

    /// Stop speaking and free the slot. Local only; no envelope is defined
    /// for release.
    pub fn release_floor(&mut self) -> bool {
        self.floor.release()
    }

    pub fn floor(&self) -> &FloorControl {
        &self.floor
    }

    pub fn floor_mut(&mut self) -> &mut FloorControl {
        &mut self.floor
    }

    // --- Inbound envelopes ---

    /// Apply one inbound envelope. Envelopes are applied strictly in arrival
    /// order; in particular a `clear` racing a `wholeDraw` is resolved by
    /// whichever the transport delivered last.
    pub fn handle_envelope(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::Draw(batch) => {
                debug!(
                    "applying batch from {} ({} primitives)",
                    batch.author,
                    batch.len()
                );
                let event = EngineEvent::BatchApplied {
                    author: batch.author.clone(),
                    primitives: batch.len(),
                };
                self.canvas.append(batch);
                self.events.push(event);
            }
            Envelope::Clear {} => {
                self.canvas.clear();
                self.events.push(EngineEvent::BoardCleared);
            }
            Envelope::RequestBoard {} => {
                // Any peer with non-trivial state answers every request it
                // observes; duplicate replies are resolved last-write-wins
                // on the requester's side.
                if !self.canvas.is_empty() {
                    self.outgoing.push(Envelope::WholeDraw(self.canvas.snapshot()));
                }
            }
            Envelope::WholeDraw(snapshot) => {
                let batches = snapshot.len();
                self.canvas.replace(snapshot);
                if self.joining {
                    // Idempotent stop: a late retry tick racing this arrival
                    // finds `joining` already false.
                    self.joining = false;
                    info!("{} caught up ({batches} batches)", self.config.username);
                }
                self.events.push(EngineEvent::BoardReplaced { batches });
            }
            Envelope::RequestPillow { holder } => {
                if let Some(new_holder) = self.floor.observe_request(&holder) {
                    self.events.push(EngineEvent::FloorTaken { holder: new_holder });
                }
            }
            Envelope::Me(ParticipantInfo { username }) => {
                if self.roster.observe(&username) {
                    self.emit_roster();
                }
            }
            Envelope::Leave { name } => {
                // The floor slot is intentionally left untouched when the
                // holder departs; only the roster shrinks.
                if self.roster.remove(&name) {
                    self.emit_roster();
                }
            }
        }
    }

    // --- Queues ---

    /// Drain pending outbound envelopes. Handing a pending `requestPillow`
    /// to the transport is the optimistic grant point.
    pub fn take_outgoing(&mut self) -> Vec<Envelope> {
        let drained = std::mem::take(&mut self.outgoing);
        if drained.iter().any(|env| {
            matches!(env, Envelope::RequestPillow { holder } if *holder == self.config.username)
        }) {
            self.floor.mark_announced();
        }
        drained
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Drain pending UI notifications.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Accessors ---

    pub fn canvas(&self) -> &CanvasState {
        &self.canvas
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn username(&self) -> &str {
        &self.config.username
    }

    /// Canvas dimensions, as context for the generative vector service.
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas.surface().width(), self.canvas.surface().height())
    }

    /// Whether the floor is held locally and recording may start.
    pub fn may_record(&self) -> bool {
        self.floor.holds_locally()
    }

    fn queue_announce(&mut self) {
        self.outgoing.push(Envelope::Me(ParticipantInfo {
            username: self.config.username.clone(),
        }));
    }

    fn emit_roster(&mut self) {
        self.events.push(EngineEvent::RosterChanged {
            labels: self.roster.labels().to_vec(),
        });
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("username", &self.config.username)
            .field("joining", &self.joining)
            .field("batches", &self.canvas.len())
            .field("floor", &self.floor.state())
            .finish()
    }
}
