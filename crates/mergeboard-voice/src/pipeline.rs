//! Voice command pipeline.
//!
//! Drives record, transcribe and generate as a small state machine. The
//! slow network calls run on a worker thread; the owner polls for updates
//! from its own loop, the same way the sync engine drains its queues.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{info, warn};

use mergeboard_core::{Batch, Primitive};

use crate::VoiceError;
use crate::generate::{CanvasDims, GenerationRequest, VectorGenerator};
use crate::recorder::{Recorder, SAMPLE_RATE, pcm_to_wav};
use crate::transcribe::Transcriber;

/// Where the pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Recording,
    Transcribing,
    Generating,
}

/// Progress reports delivered through [`VoicePipeline::poll`].
#[derive(Debug, Clone)]
pub enum VoiceUpdate {
    /// Transcription finished; generation is starting.
    Transcript { text: String },
    /// Generation finished. The primitives are ready to submit as a batch.
    Generated {
        transcript: String,
        primitives: Vec<Primitive>,
    },
    /// The attempt ended without a result. The pipeline is idle again.
    Failed { message: String },
}

pub struct VoicePipeline {
    state: VoiceState,
    recorder: Box<dyn Recorder>,
    transcriber: Arc<dyn Transcriber>,
    generator: Arc<dyn VectorGenerator>,
    language: String,
    updates: Option<Receiver<VoiceUpdate>>,
    worker: Option<JoinHandle<()>>,
}

impl VoicePipeline {
    pub fn new(
        recorder: Box<dyn Recorder>,
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn VectorGenerator>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            state: VoiceState::Idle,
            recorder,
            transcriber,
            generator,
            language: language.into(),
            updates: None,
            worker: None,
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Begin recording a command. Only the current floor holder may record,
    /// and only while no earlier attempt is still in flight. A recorder
    /// failure leaves the pipeline idle.
    pub fn start_recording(&mut self, floor_held: bool) -> Result<(), VoiceError> {
        if !floor_held {
            return Err(VoiceError::FloorNotHeld);
        }
        if self.state != VoiceState::Idle {
            return Err(VoiceError::Busy);
        }
        self.recorder.start()?;
        self.state = VoiceState::Recording;
        Ok(())
    }

    /// Drop an in-progress recording without processing it.
    pub fn cancel_recording(&mut self) {
        if self.state == VoiceState::Recording {
            if let Err(e) = self.recorder.stop() {
                warn!("discarding recording: {e}");
            }
            self.state = VoiceState::Idle;
        }
    }

    /// Stop recording and hand the audio to the worker. `canvas` and
    /// `existing` are the generation context captured at this moment; later
    /// board edits do not retroactively change the request.
    pub fn stop_and_process(
        &mut self,
        canvas: CanvasDims,
        existing: Vec<Batch>,
    ) -> Result<(), VoiceError> {
        if self.state != VoiceState::Recording {
            return Err(VoiceError::Busy);
        }
        let pcm = match self.recorder.stop() {
            Ok(pcm) => pcm,
            Err(e) => {
                self.state = VoiceState::Idle;
                return Err(e);
            }
        };

        let wav = pcm_to_wav(&pcm, SAMPLE_RATE, 1);
        let transcriber = Arc::clone(&self.transcriber);
        let generator = Arc::clone(&self.generator);
        let language = self.language.clone();

        let (tx, rx) = mpsc::channel();
        self.updates = Some(rx);
        self.worker = Some(thread::spawn(move || {
            run_attempt(&tx, &wav, &language, canvas, existing, &*transcriber, &*generator);
        }));
        self.state = VoiceState::Transcribing;
        Ok(())
    }

    /// Drain worker updates and advance the state machine. Call once per
    /// frame or loop iteration.
    pub fn poll(&mut self) -> Vec<VoiceUpdate> {
        let Some(rx) = &self.updates else {
            return Vec::new();
        };

        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            match &update {
                VoiceUpdate::Transcript { .. } => self.state = VoiceState::Generating,
                VoiceUpdate::Generated { .. } | VoiceUpdate::Failed { .. } => {
                    self.state = VoiceState::Idle;
                }
            }
            updates.push(update);
        }

        if self.state == VoiceState::Idle {
            self.updates = None;
            if let Some(worker) = self.worker.take() {
                let _ = worker.join();
            }
        }
        updates
    }
}

fn run_attempt(
    tx: &Sender<VoiceUpdate>,
    wav: &[u8],
    language: &str,
    canvas: CanvasDims,
    existing: Vec<Batch>,
    transcriber: &dyn Transcriber,
    generator: &dyn VectorGenerator,
) {
    let transcript = match transcriber.transcribe(wav, language) {
        Ok(text) => text,
        Err(e) => {
            warn!("transcription failed: {e}");
            let _ = tx.send(VoiceUpdate::Failed {
                message: e.to_string(),
            });
            return;
        }
    };

    if transcript.is_empty() {
        // Nothing was heard. Abort without touching the generator.
        let _ = tx.send(VoiceUpdate::Failed {
            message: VoiceError::EmptyTranscript.to_string(),
        });
        return;
    }

    info!("transcribed command: {transcript:?}");
    let _ = tx.send(VoiceUpdate::Transcript {
        text: transcript.clone(),
    });

    let request = GenerationRequest {
        command: transcript.clone(),
        canvas,
        existing_items: existing,
    };
    match generator.generate(&request) {
        Ok(svgs) => {
            let primitives = svgs.iter().map(Primitive::markup).collect();
            let _ = tx.send(VoiceUpdate::Generated {
                transcript,
                primitives,
            });
        }
        Err(e) => {
            warn!("generation failed: {e}");
            let _ = tx.send(VoiceUpdate::Failed {
                message: e.to_string(),
            });
        }
    }
}
