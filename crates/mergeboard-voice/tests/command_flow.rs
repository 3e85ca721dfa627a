//! End-to-end voice command flow against scripted service stubs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use mergeboard_core::{Envelope, NullSurface, SyncEngine};
use mergeboard_voice::{
    CanvasDims, GenerationRequest, Recorder, Transcriber, UnavailableRecorder, VectorGenerator,
    VoiceError, VoicePipeline, VoiceState, VoiceUpdate,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct ScriptedRecorder {
    started: bool,
}

impl ScriptedRecorder {
    fn new() -> Self {
        Self { started: false }
    }
}

impl Recorder for ScriptedRecorder {
    fn start(&mut self) -> Result<(), VoiceError> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<Vec<i16>, VoiceError> {
        if !self.started {
            return Err(VoiceError::CaptureUnavailable("not recording".into()));
        }
        self.started = false;
        Ok(vec![0i16; 1600])
    }
}

struct StubTranscriber {
    text: String,
}

impl Transcriber for StubTranscriber {
    fn transcribe(&self, wav: &[u8], _language: &str) -> Result<String, VoiceError> {
        assert_eq!(&wav[0..4], b"RIFF");
        Ok(self.text.clone())
    }
}

struct StubGenerator {
    svgs: Result<Vec<String>, String>,
    calls: AtomicUsize,
}

impl StubGenerator {
    fn ok(svgs: &[&str]) -> Self {
        Self {
            svgs: Ok(svgs.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            svgs: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl VectorGenerator for StubGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>, VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!request.command.is_empty());
        match &self.svgs {
            Ok(svgs) => Ok(svgs.clone()),
            Err(message) => Err(VoiceError::MalformedResponse(message.clone())),
        }
    }
}

fn pipeline_with(
    transcript: &str,
    generator: Arc<StubGenerator>,
) -> (VoicePipeline, Arc<StubGenerator>) {
    let pipeline = VoicePipeline::new(
        Box::new(ScriptedRecorder::new()),
        Arc::new(StubTranscriber {
            text: transcript.to_string(),
        }),
        Arc::clone(&generator) as Arc<dyn VectorGenerator>,
        "en",
    );
    (pipeline, generator)
}

/// Poll until the pipeline settles back to idle, collecting every update.
fn drain_until_idle(pipeline: &mut VoicePipeline) -> Vec<VoiceUpdate> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut updates = Vec::new();
    while pipeline.state() != VoiceState::Idle {
        assert!(Instant::now() < deadline, "pipeline never settled");
        updates.extend(pipeline.poll());
        std::thread::sleep(Duration::from_millis(5));
    }
    updates
}

#[test]
fn test_command_reaches_the_board() {
    init_logging();
    let (mut pipeline, generator) =
        pipeline_with("draw a sun", Arc::new(StubGenerator::ok(&["<circle r=\"9\"/>"])));
    let mut engine = SyncEngine::new(
        mergeboard_core::EngineConfig::new("ana"),
        Box::new(NullSurface::new(800, 600)),
    );
    engine.request_floor();
    engine.take_outgoing();
    assert!(engine.may_record());

    pipeline.start_recording(engine.may_record()).unwrap();
    let (width, height) = engine.canvas_size();
    pipeline
        .stop_and_process(CanvasDims { width, height }, engine.canvas().snapshot())
        .unwrap();

    let updates = drain_until_idle(&mut pipeline);
    assert!(matches!(&updates[0], VoiceUpdate::Transcript { text } if text == "draw a sun"));
    let VoiceUpdate::Generated {
        transcript,
        primitives,
    } = &updates[1]
    else {
        panic!("expected a generated update, got {:?}", updates[1]);
    };
    assert_eq!(transcript, "draw a sun");
    assert_eq!(primitives.len(), 1);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    engine.submit_primitives(primitives.clone());
    assert_eq!(engine.canvas().primitive_count(), 1);
    let outgoing = engine.take_outgoing();
    assert!(
        outgoing
            .iter()
            .any(|env| matches!(env, Envelope::Draw(batch) if batch.author == "ana"))
    );
}

#[test]
fn test_empty_transcript_skips_generation() {
    init_logging();
    let (mut pipeline, generator) = pipeline_with("", Arc::new(StubGenerator::ok(&["<g/>"])));

    pipeline.start_recording(true).unwrap();
    pipeline
        .stop_and_process(
            CanvasDims {
                width: 100,
                height: 100,
            },
            vec![],
        )
        .unwrap();

    let updates = drain_until_idle(&mut pipeline);
    assert_eq!(updates.len(), 1);
    assert!(matches!(&updates[0], VoiceUpdate::Failed { .. }));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_generation_failure_is_surfaced() {
    init_logging();
    let (mut pipeline, _) = pipeline_with(
        "draw a cat",
        Arc::new(StubGenerator::failing("missing field `svgs`")),
    );

    pipeline.start_recording(true).unwrap();
    pipeline
        .stop_and_process(
            CanvasDims {
                width: 100,
                height: 100,
            },
            vec![],
        )
        .unwrap();

    let updates = drain_until_idle(&mut pipeline);
    assert!(matches!(&updates[0], VoiceUpdate::Transcript { .. }));
    let VoiceUpdate::Failed { message } = &updates[1] else {
        panic!("expected a failure, got {:?}", updates[1]);
    };
    assert!(message.contains("svgs"));
}

#[test]
fn test_recording_requires_the_floor() {
    let (mut pipeline, _) = pipeline_with("hi", Arc::new(StubGenerator::ok(&[])));
    let err = pipeline.start_recording(false).unwrap_err();
    assert!(matches!(err, VoiceError::FloorNotHeld));
    assert_eq!(pipeline.state(), VoiceState::Idle);
}

#[test]
fn test_missing_device_fails_closed() {
    let mut pipeline = VoicePipeline::new(
        Box::new(UnavailableRecorder),
        Arc::new(StubTranscriber { text: "x".into() }),
        Arc::new(StubGenerator::ok(&[])),
        "en",
    );
    let err = pipeline.start_recording(true).unwrap_err();
    assert!(matches!(err, VoiceError::CaptureUnavailable(_)));
    assert_eq!(pipeline.state(), VoiceState::Idle);
}

#[test]
fn test_second_attempt_while_busy_is_rejected() {
    let (mut pipeline, _) = pipeline_with("hi", Arc::new(StubGenerator::ok(&[])));
    pipeline.start_recording(true).unwrap();
    let err = pipeline.start_recording(true).unwrap_err();
    assert!(matches!(err, VoiceError::Busy));
    assert_eq!(pipeline.state(), VoiceState::Recording);
}
