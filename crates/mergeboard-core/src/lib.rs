//! MergeBoard Core Library
//!
//! Collaborative drawing-state synchronization and floor control for a room
//! of loosely coordinated peers with no authoritative server. Local input
//! becomes batches of primitives, batches broadcast over a best-effort
//! transport, late joiners catch up via snapshot replacement, and an
//! exclusive speaking token is negotiated optimistically.

pub mod canvas;
pub mod capture;
pub mod engine;
pub mod floor;
pub mod presence;
pub mod primitive;
pub mod protocol;
pub mod transport;

pub use canvas::{CanvasState, NullSurface, Surface};
pub use capture::{PenSettings, StrokeCapture, DEFAULT_FLUSH_INTERVAL};
pub use engine::{EngineConfig, EngineEvent, SyncEngine};
pub use floor::{FloorControl, FloorState};
pub use presence::Roster;
pub use primitive::{Batch, CompositeMode, Primitive, PrimitiveShape, Segment, SerializableColor};
pub use protocol::{Envelope, ParticipantInfo, ProtocolError};
pub use transport::{MemoryHub, MemoryTransport, Transport, TransportError, WsTransport};
