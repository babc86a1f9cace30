pub mod chime;

use std::sync::Arc;

use log::warn;

/// Receives the low-attention alert. Called at most once per falling-edge crossing.
pub trait AlertSink: Send + Sync {
    fn low_attention(&self, level: f64) -> Result<(), String>;
}

/// Logs the alert without making a sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlert;

impl AlertSink for LogAlert {
    fn low_attention(&self, level: f64) -> Result<(), String> {
        warn!("Attention dropped to {level:.0}");
        Ok(())
    }
}

/// The chime player when the `chime` feature is on, otherwise the log-only sink.
pub fn default_alert_sink() -> Arc<dyn AlertSink> {
    #[cfg(feature = "chime")]
    {
        Arc::new(player::ChimePlayer::new())
    }

    #[cfg(not(feature = "chime"))]
    {
        Arc::new(LogAlert)
    }
}

#[cfg(feature = "chime")]
pub use player::ChimePlayer;

#[cfg(feature = "chime")]
mod player {
    use std::sync::{
        mpsc::{self, Sender},
        Mutex,
    };
    use std::thread;

    use log::warn;
    use rodio::{OutputStream, Sink};

    use super::{chime::Chime, AlertSink};

    enum AlertCommand {
        Play { volume: f32 },
    }

    /// Plays the chime on a dedicated thread that owns the non-Send output stream.
    pub struct ChimePlayer {
        tx: Mutex<Option<Sender<AlertCommand>>>,
        volume: f32,
    }

    impl ChimePlayer {
        pub fn new() -> Self {
            Self {
                tx: Mutex::new(None),
                volume: 0.8,
            }
        }

        fn ensure_thread(&self) -> Result<Sender<AlertCommand>, String> {
            let mut guard = self.tx.lock().map_err(|e| e.to_string())?;
            if let Some(tx) = guard.as_ref() {
                return Ok(tx.clone());
            }

            let (tx, rx) = mpsc::channel::<AlertCommand>();

            thread::Builder::new()
                .name("alert-chime".to_string())
                .spawn(move || {
                    let mut _stream: Option<OutputStream> = None;
                    let mut sink: Option<Sink> = None;

                    fn ensure_sink(
                        stream: &mut Option<OutputStream>,
                        sink: &mut Option<Sink>,
                    ) -> Result<(), String> {
                        if sink.is_none() {
                            let (s, handle) = OutputStream::try_default()
                                .map_err(|e| format!("Failed to create audio output stream: {}", e))?;
                            let new_sink = Sink::try_new(&handle)
                                .map_err(|e| format!("Failed to create audio sink: {}", e))?;
                            *stream = Some(s);
                            *sink = Some(new_sink);
                        }
                        Ok(())
                    }

                    while let Ok(cmd) = rx.recv() {
                        match cmd {
                            AlertCommand::Play { volume } => {
                                if let Err(err) = ensure_sink(&mut _stream, &mut sink) {
                                    warn!("Alert chime unavailable: {err}");
                                    continue;
                                }
                                if let Some(ref s) = sink {
                                    s.append(Chime::new(volume));
                                }
                            }
                        }
                    }
                })
                .map_err(|e| e.to_string())?;

            *guard = Some(tx.clone());
            Ok(tx)
        }
    }

    impl AlertSink for ChimePlayer {
        fn low_attention(&self, level: f64) -> Result<(), String> {
            warn!("Attention dropped to {level:.0}, playing chime");
            let tx = self.ensure_thread()?;
            tx.send(AlertCommand::Play {
                volume: self.volume,
            })
            .map_err(|e| e.to_string())
        }
    }
}
