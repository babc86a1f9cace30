pub mod ai;
pub mod audio;
pub mod error;
pub mod models;
pub mod monitor;
pub mod sensing;
pub mod session;
pub mod settings;
pub mod utils;

#[cfg(test)]
mod testing;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::sync::broadcast::{self, error::RecvError};

use ai::{
    AttentionScorer, GeminiClient, GeminiScorer, GeminiSummarizer, LocalSummarizer,
    SessionSummarizer, SimulatedScorer,
};
use error::FocusError;
use monitor::{AttentionController, ControllerConfig, ControllerEvent};
use sensing::{CameraDevice, FrameSampler, ReplayCamera};
use settings::{api_key_from_env, FocusSettings, ScorerKind, SettingsStore, SummarizerKind};

pub struct AppState {
    pub controller: AttentionController,
    pub settings: SettingsStore,
}

impl AppState {
    pub fn new(settings: SettingsStore, camera: Box<dyn CameraDevice>) -> Result<Self> {
        let current = settings.get();
        let (scorer, summarizer) = build_collaborators(&current, api_key_from_env())?;

        let config = ControllerConfig {
            poll_interval: current.poll_interval(),
            initial_level: current.initial_level(),
            session_details: current.session_details.clone(),
            sound_alerts_enabled: current.sound_alerts_enabled,
        };

        let controller = AttentionController::new(
            config,
            FrameSampler::new(camera),
            scorer,
            summarizer,
            audio::default_alert_sink(),
        );

        Ok(Self {
            controller,
            settings,
        })
    }

    /// Apply to the running controller and remember for next launch.
    pub async fn set_sound_alerts(&self, enabled: bool) -> Result<()> {
        self.settings
            .update(|s| s.sound_alerts_enabled = enabled)
            .context("failed to save sound alert preference")?;
        self.controller.set_sound_alerts(enabled).await;
        Ok(())
    }
}

fn build_collaborators(
    settings: &FocusSettings,
    api_key: Option<String>,
) -> Result<(Arc<dyn AttentionScorer>, Arc<dyn SessionSummarizer>), FocusError> {
    let client = if settings.needs_api_key() {
        let key = api_key.ok_or_else(|| {
            FocusError::Config(
                "GEMINI_API_KEY is not set; set it or switch scorer/summarizer to offline modes"
                    .into(),
            )
        })?;
        let client = GeminiClient::new(&settings.api_base_url, &settings.model, key)
            .map_err(|err| FocusError::Config(format!("{err:#}")))?;
        Some(Arc::new(client))
    } else {
        None
    };

    let scorer: Arc<dyn AttentionScorer> = match (settings.scorer, &client) {
        (ScorerKind::Gemini, Some(client)) => Arc::new(GeminiScorer::new(client.clone())),
        _ => Arc::new(SimulatedScorer::new()),
    };
    let summarizer: Arc<dyn SessionSummarizer> = match (settings.summarizer, &client) {
        (SummarizerKind::Gemini, Some(client)) => Arc::new(GeminiSummarizer::new(client.clone())),
        _ => Arc::new(LocalSummarizer),
    };

    info!(
        "Scoring with {:?}, summarizing with {:?} (model {})",
        settings.scorer, settings.summarizer, settings.model
    );
    Ok((scorer, summarizer))
}

fn data_dir() -> PathBuf {
    std::env::var_os("FOCUSFLOW_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".focusflow"))
}

fn camera_dir(data_dir: &std::path::Path) -> PathBuf {
    std::env::var_os("FOCUSFLOW_CAMERA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join("frames"))
}

fn parse_session_length(value: Option<&str>) -> Option<Duration> {
    let secs: u64 = value?.trim().parse().ok()?;
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Log dashboard events until the bus closes. Returns how many events were handled.
async fn print_events(mut events: broadcast::Receiver<ControllerEvent>) -> usize {
    let mut handled = 0;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event printer fell behind, skipped {skipped} event(s)");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        handled += 1;
        match event {
            ControllerEvent::SampleRecorded {
                sample,
                status_label,
                ..
            } => info!(
                "[{}] attention {:>3.0} {}",
                sample.timestamp,
                sample.attention_level,
                status_label.text()
            ),
            ControllerEvent::Alert { level } => {
                warn!("Low attention ({level:.0}), time to refocus")
            }
            ControllerEvent::TickFailed { reason } => warn!("Sample skipped: {reason}"),
            _ => {}
        }
    }
    handled
}

/// Run one session from the terminal: start, sample until the timer or Ctrl-C, summarize.
pub fn run() -> Result<()> {
    utils::init_logging();
    info!("FocusFlow starting up...");

    let data_dir = data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("cannot create data directory {}", data_dir.display()))?;
    let settings = SettingsStore::new(data_dir.join("settings.json"))?;
    let camera = ReplayCamera::new(camera_dir(&data_dir));
    let session_length =
        parse_session_length(std::env::var("FOCUSFLOW_SESSION_SECS").ok().as_deref());

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async move {
        let app = AppState::new(settings, Box::new(camera))?;
        let controller = app.controller.clone();

        let printer = tokio::spawn(print_events(controller.subscribe()));

        controller.start().await?;

        match session_length {
            Some(length) => {
                info!("Session will end after {}s (Ctrl-C to end early)", length.as_secs());
                tokio::select! {
                    _ = tokio::time::sleep(length) => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            None => {
                info!("Press Ctrl-C to end the session");
                tokio::signal::ctrl_c()
                    .await
                    .context("failed to listen for Ctrl-C")?;
            }
        }

        let report = controller.end().await?;
        if let Some(err) = report.error() {
            warn!("{err}");
        }
        println!(
            "\nSession Summary ({} samples)\n{}",
            report.samples.len(),
            report.summary_text()
        );

        controller.shutdown().await;
        printer.abort();
        Ok::<(), anyhow::Error>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCamera;

    fn offline() -> FocusSettings {
        FocusSettings {
            scorer: ScorerKind::Simulated,
            summarizer: SummarizerKind::Local,
            ..FocusSettings::default()
        }
    }

    #[test]
    fn remote_collaborators_need_a_key() {
        let err = build_collaborators(&FocusSettings::default(), None)
            .err()
            .unwrap();
        assert!(matches!(err, FocusError::Config(_)));
    }

    #[test]
    fn offline_collaborators_need_no_key() {
        assert!(build_collaborators(&offline(), None).is_ok());
        assert!(build_collaborators(&FocusSettings::default(), Some("k".into())).is_ok());
    }

    #[test]
    fn session_length_parsing() {
        assert_eq!(parse_session_length(Some("90")), Some(Duration::from_secs(90)));
        assert_eq!(parse_session_length(Some("0")), None);
        assert_eq!(parse_session_length(Some("soon")), None);
        assert_eq!(parse_session_length(None), None);
    }

    #[tokio::test]
    async fn sound_alert_toggle_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        store.update(|s| *s = offline()).unwrap();

        let app = AppState::new(store, Box::new(FakeCamera::ready())).unwrap();
        app.set_sound_alerts(false).await.unwrap();

        assert!(!app.controller.get_snapshot().await.sound_alerts_enabled);
        assert!(!SettingsStore::new(path).unwrap().get().sound_alerts_enabled);
    }

    #[tokio::test]
    async fn event_printer_keeps_going_after_falling_behind() {
        let (tx, rx) = broadcast::channel(2);
        for level in [10.0, 20.0, 30.0, 40.0, 50.0] {
            tx.send(ControllerEvent::Alert { level }).unwrap();
        }
        drop(tx);
        // The first three were overwritten; the last two still get printed.
        assert_eq!(print_events(rx).await, 2);
    }

    #[tokio::test]
    async fn offline_session_runs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        store.update(|s| *s = offline()).unwrap();
        let app = AppState::new(store, Box::new(FakeCamera::ready())).unwrap();

        app.controller.start().await.unwrap();
        for _ in 0..4 {
            app.controller.tick().await;
        }
        let report = app.controller.end().await.unwrap();
        assert_eq!(report.samples.len(), 4);
        assert!(report.summary_text().contains("4 readings"));
    }
}
