//! MergeBoard Voice Library
//!
//! Voice command support for the board: record a spoken command while
//! holding the floor, transcribe it, ask a generative vector service for
//! markup fragments, and hand the result back as primitives ready to
//! submit through the sync engine.

pub mod generate;
pub mod pipeline;
pub mod recorder;
pub mod transcribe;

pub use generate::{CanvasDims, GenerationRequest, HttpVectorGenerator, VectorGenerator};
pub use pipeline::{VoicePipeline, VoiceState, VoiceUpdate};
pub use recorder::{Recorder, SAMPLE_RATE, UnavailableRecorder, pcm_to_wav};
pub use transcribe::{HttpTranscriber, Transcriber};

use thiserror::Error;

/// Errors from the voice command pipeline.
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("audio capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("no speech detected")]
    EmptyTranscript,

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("recording requires holding the floor")]
    FloorNotHeld,

    #[error("a voice command is already in flight")]
    Busy,
}
