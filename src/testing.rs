//! Fakes for the controller's collaborators. Test builds only.

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    mpsc, Arc, Mutex,
};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use image::DynamicImage;
use tokio::sync::oneshot;

use crate::ai::{AttentionScorer, FaceDetection, SessionSummarizer, SummaryRequest};
use crate::audio::AlertSink;
use crate::error::FocusError;
use crate::sensing::{CameraDevice, EncodedFrame};

#[derive(Clone, Default)]
pub struct CameraProbe {
    attempts: Arc<AtomicUsize>,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl CameraProbe {
    /// Calls to `open()`, counted on entry, before any gate.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Spin until `open()` has been entered `n` times.
    pub async fn wait_for_attempts(&self, n: usize) {
        while self.attempts() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct FakeCamera {
    frame: Option<DynamicImage>,
    deny: bool,
    open: bool,
    gate: Option<mpsc::Receiver<()>>,
    probe: CameraProbe,
}

impl FakeCamera {
    pub fn with_frame(frame: DynamicImage) -> Self {
        Self {
            frame: Some(frame),
            deny: false,
            open: false,
            gate: None,
            probe: CameraProbe::default(),
        }
    }

    pub fn ready() -> Self {
        Self::with_frame(DynamicImage::new_rgb8(8, 8))
    }

    pub fn warming_up() -> Self {
        Self {
            frame: None,
            ..Self::ready()
        }
    }

    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::ready()
        }
    }

    /// The first `open()` blocks until the returned sender fires (or is dropped).
    pub fn gated() -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let camera = Self {
            gate: Some(rx),
            ..Self::ready()
        };
        (camera, tx)
    }

    pub fn probe(&self) -> CameraProbe {
        self.probe.clone()
    }
}

impl CameraDevice for FakeCamera {
    fn name(&self) -> &str {
        "fake"
    }

    fn open(&mut self) -> Result<()> {
        self.probe.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = self.gate.take() {
            let _ = gate.recv();
        }
        if self.deny {
            bail!("permission denied");
        }
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        self.open = true;
        Ok(())
    }

    fn current_frame(&mut self) -> Option<DynamicImage> {
        if self.open {
            self.frame.clone()
        } else {
            None
        }
    }

    fn close(&mut self) {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        self.open = false;
    }
}

pub enum ScriptedScore {
    Faces(Vec<f64>),
    Fail(String),
    /// Resolve with this level once the paired sender fires.
    Gated(oneshot::Receiver<()>, f64),
}

/// Scorer that replays a script; an exhausted script reports no faces.
#[derive(Default)]
pub struct ScriptedScorer {
    script: Mutex<VecDeque<ScriptedScore>>,
    calls: AtomicUsize,
}

impl ScriptedScorer {
    pub fn new(script: Vec<ScriptedScore>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn levels(levels: &[f64]) -> Self {
        Self::new(
            levels
                .iter()
                .map(|level| ScriptedScore::Faces(vec![*level]))
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttentionScorer for ScriptedScorer {
    async fn score(&self, _frame: &EncodedFrame) -> Result<FaceDetection, FocusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            None => Ok(FaceDetection::none()),
            Some(ScriptedScore::Faces(levels)) => Ok(FaceDetection {
                faces: levels
                    .into_iter()
                    .map(|attention_level| crate::ai::DetectedFace { attention_level })
                    .collect(),
            }),
            Some(ScriptedScore::Fail(reason)) => Err(FocusError::ScoringFailure(reason)),
            Some(ScriptedScore::Gated(gate, level)) => {
                let _ = gate.await;
                Ok(FaceDetection::single(level))
            }
        }
    }
}

/// Summarizer that records every request it gets.
pub struct RecordingSummarizer {
    requests: Mutex<Vec<SummaryRequest>>,
    fail: bool,
}

impl RecordingSummarizer {
    pub fn ok() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok()
        }
    }

    pub fn requests(&self) -> Vec<SummaryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionSummarizer for RecordingSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, FocusError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            Err(FocusError::SummarizationFailure("model overloaded".into()))
        } else {
            Ok(format!("{} points summarized", request.attention_data.len()))
        }
    }
}

#[derive(Default)]
pub struct CountingAlerts {
    levels: Mutex<Vec<f64>>,
}

impl CountingAlerts {
    pub fn levels(&self) -> Vec<f64> {
        self.levels.lock().unwrap().clone()
    }
}

impl AlertSink for CountingAlerts {
    fn low_attention(&self, level: f64) -> Result<(), String> {
        self.levels.lock().unwrap().push(level);
        Ok(())
    }
}
