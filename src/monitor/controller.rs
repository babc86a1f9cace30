use std::{sync::Arc, time::Duration};

use chrono::Utc;
use log::{error, info};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    ai::{AttentionScorer, SessionSummarizer, SummaryRequest},
    audio::AlertSink,
    error::FocusError,
    models::{Sample, SessionPhase},
    sensing::{FrameCapture, FrameSampler},
};

use super::events::{ControllerEvent, EventBus};
use super::state::{
    ControllerState, DashboardSnapshot, SessionReport, SummaryOutcome, MIN_SAMPLES_FOR_SUMMARY,
};

// Set to false to silence per-tick logging
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
    pub initial_level: f64,
    pub session_details: Option<String>,
    pub sound_alerts_enabled: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            initial_level: 50.0,
            session_details: Some("A general study session.".into()),
            sound_alerts_enabled: true,
        }
    }
}

/// What one sampling step did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Recorded(Sample),
    /// The camera had no frame; nothing was scored.
    NotReady,
    /// Scoring failed; the session carries on.
    Failed(String),
    /// The session the tick belonged to is over (or never started).
    Discarded,
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

#[derive(Clone)]
pub struct AttentionController {
    state: Arc<Mutex<ControllerState>>,
    sampler: Arc<Mutex<FrameSampler>>,
    scorer: Arc<dyn AttentionScorer>,
    summarizer: Arc<dyn SessionSummarizer>,
    alerts: Arc<dyn AlertSink>,
    events: EventBus,
    ticker: Arc<Mutex<Option<Ticker>>>,
    config: ControllerConfig,
}

impl AttentionController {
    pub fn new(
        config: ControllerConfig,
        sampler: FrameSampler,
        scorer: Arc<dyn AttentionScorer>,
        summarizer: Arc<dyn SessionSummarizer>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let state = ControllerState::new(config.initial_level, config.sound_alerts_enabled);
        Self {
            state: Arc::new(Mutex::new(state)),
            sampler: Arc::new(Mutex::new(sampler)),
            scorer,
            summarizer,
            alerts,
            events: EventBus::new(),
            ticker: Arc::new(Mutex::new(None)),
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    pub async fn samples(&self) -> Vec<Sample> {
        self.state.lock().await.recorder.all().to_vec()
    }

    pub async fn get_snapshot(&self) -> DashboardSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn set_sound_alerts(&self, enabled: bool) {
        self.state.lock().await.sound_alerts_enabled = enabled;
        info!("Sound alerts {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Idle -> Active. Opens the camera and starts the polling loop.
    pub async fn start(&self) -> Result<DashboardSnapshot, FocusError> {
        let generation = {
            let mut state = self.state.lock().await;
            if state.phase != SessionPhase::Idle {
                return Err(FocusError::InvalidTransition {
                    command: "start",
                    phase: state.phase,
                });
            }
            state.begin_session(
                Uuid::new_v4().to_string(),
                self.config.initial_level,
                Utc::now(),
            )
        };
        self.emit_state_changed().await;

        let acquired = self.sampler.lock().await.acquire().await;
        if let Err(err) = acquired {
            {
                let mut state = self.state.lock().await;
                if state.generation == generation {
                    state.abort_start();
                }
            }
            error!("Session not started: {err}");
            self.emit_state_changed().await;
            return Err(err);
        }

        if !self.spawn_ticker(generation).await {
            // end() or shutdown() got in while the camera was opening.
            log_info!("Session superseded while the camera was opening");
            self.release_camera().await;
            return Ok(self.get_snapshot().await);
        }

        let snapshot = self.get_snapshot().await;
        info!(
            "Session {} started, sampling every {}ms",
            snapshot.session_id.as_deref().unwrap_or("?"),
            self.config.poll_interval.as_millis()
        );
        Ok(snapshot)
    }

    /// Active -> Summarizing -> Idle. Stops sampling, frees the camera, summarizes.
    pub async fn end(&self) -> Result<SessionReport, FocusError> {
        let (samples, session_id, started_at) = {
            let mut state = self.state.lock().await;
            if state.phase != SessionPhase::Active {
                return Err(FocusError::InvalidTransition {
                    command: "end",
                    phase: state.phase,
                });
            }
            state.begin_summarizing();
            (
                state.recorder.all().to_vec(),
                state.session_id.clone().unwrap_or_default(),
                state.started_at.unwrap_or_else(Utc::now),
            )
        };

        self.cancel_ticker().await;
        self.release_camera().await;
        self.emit_state_changed().await;

        let summary = if samples.len() < MIN_SAMPLES_FOR_SUMMARY {
            info!(
                "Session {session_id} has {} sample(s), skipping summary",
                samples.len()
            );
            SummaryOutcome::InsufficientData
        } else {
            let request =
                SummaryRequest::from_samples(&samples, self.config.session_details.clone());
            match self.summarizer.summarize(&request).await {
                Ok(text) => SummaryOutcome::Generated { text },
                Err(err) => {
                    error!("Summary for session {session_id} failed: {err}");
                    SummaryOutcome::Unavailable {
                        reason: err.to_string(),
                    }
                }
            }
        };

        self.state.lock().await.finish(Some(summary.clone()));

        let report = SessionReport {
            session_id,
            started_at,
            ended_at: Utc::now(),
            samples,
            summary,
        };
        info!(
            "Session {} ended with {} samples",
            report.session_id,
            report.samples.len()
        );

        self.events.emit(ControllerEvent::SessionSummarized {
            report: report.clone(),
        });
        self.emit_state_changed().await;
        Ok(report)
    }

    /// Drop an active session without summarizing and free the camera.
    pub async fn shutdown(&self) {
        let was_active = {
            let mut state = self.state.lock().await;
            if state.phase == SessionPhase::Active {
                state.begin_summarizing();
                state.finish(None);
                true
            } else {
                false
            }
        };

        self.cancel_ticker().await;
        self.release_camera().await;

        if was_active {
            info!("Active session dropped on shutdown");
            self.emit_state_changed().await;
        }
    }

    /// One sampling step for the current session: capture, score, record.
    pub async fn tick(&self) -> TickOutcome {
        let generation = {
            let state = self.state.lock().await;
            if state.phase != SessionPhase::Active {
                return TickOutcome::Discarded;
            }
            state.generation
        };
        self.tick_for(generation).await
    }

    async fn tick_for(&self, generation: u64) -> TickOutcome {
        if !self.state.lock().await.accepts(generation) {
            return TickOutcome::Discarded;
        }

        let capture = self.sampler.lock().await.capture_frame().await;
        let frame = match capture {
            FrameCapture::Ready(frame) => frame,
            FrameCapture::NotReady => {
                log_debug!("Tick skipped, camera not ready");
                return TickOutcome::NotReady;
            }
        };

        let detection = match self.scorer.score(&frame).await {
            Ok(detection) => detection,
            Err(err) => {
                if !self.state.lock().await.accepts(generation) {
                    return TickOutcome::Discarded;
                }
                log_warn!("Tick scoring failed, will retry next tick: {err}");
                self.events.emit(ControllerEvent::TickFailed {
                    reason: err.to_string(),
                });
                return TickOutcome::Failed(err.to_string());
            }
        };

        let level = detection.primary_level();
        let (sample, status_label, sample_count, alert) = {
            let mut state = self.state.lock().await;
            if !state.accepts(generation) {
                log_info!("Discarding score that settled after the session ended");
                return TickOutcome::Discarded;
            }
            let (sample, crossed) = state.record(level, Utc::now());
            (
                sample,
                state.status_label(),
                state.recorder.len(),
                crossed && state.sound_alerts_enabled,
            )
        };

        log_debug!(
            "Sample {} at {}: level {:.1} ({} face(s))",
            sample_count,
            sample.timestamp,
            sample.attention_level,
            detection.faces.len()
        );

        self.events.emit(ControllerEvent::SampleRecorded {
            sample: sample.clone(),
            status_label,
            sample_count,
        });

        if alert {
            if let Err(err) = self.alerts.low_attention(sample.attention_level) {
                log_warn!("Alert failed: {err}");
            }
            self.events.emit(ControllerEvent::Alert {
                level: sample.attention_level,
            });
        }

        TickOutcome::Recorded(sample)
    }

    /// Returns false when the session was already gone and no loop was started.
    async fn spawn_ticker(&self, generation: u64) -> bool {
        let mut ticker_guard = self.ticker.lock().await;
        if !self.state.lock().await.accepts(generation) {
            return false;
        }
        if let Some(old) = ticker_guard.take() {
            old.cancel_token.cancel();
            old.handle.abort();
        }

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let controller = self.clone();
        let period = self.config.poll_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if !controller.state.lock().await.accepts(generation) {
                            break;
                        }
                        // Ticks run independently; a slow model call never delays the next one.
                        let worker = controller.clone();
                        tokio::spawn(async move {
                            worker.tick_for(generation).await;
                        });
                    }
                }
            }
        });

        *ticker_guard = Some(Ticker {
            handle,
            cancel_token,
        });
        true
    }

    /// Close the camera unless a session is Active. An Active session either already
    /// holds the camera or is about to acquire it, so it is left alone.
    async fn release_camera(&self) {
        let mut sampler = self.sampler.lock().await;
        if self.state.lock().await.phase == SessionPhase::Active {
            log_debug!("Camera kept for the active session");
            return;
        }
        sampler.release();
    }

    async fn cancel_ticker(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.cancel_token.cancel();
            ticker.handle.abort();
        }
    }

    async fn emit_state_changed(&self) {
        let event = {
            let state = self.state.lock().await;
            ControllerEvent::StateChanged {
                phase: state.phase,
                status_label: state.status_label(),
                current_level: state.attention.current_level,
            }
        };
        self.events.emit(event);
    }
}
