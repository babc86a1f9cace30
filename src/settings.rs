use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::ai::client::{DEFAULT_API_BASE_URL, DEFAULT_MODEL};

/// Where frames get scored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ScorerKind {
    Gemini,
    Simulated,
}

/// Who writes the end-of-session summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SummarizerKind {
    Gemini,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FocusSettings {
    pub sound_alerts_enabled: bool,
    /// Level the gauge shows when a session starts, before the first sample.
    pub initial_level: f64,
    pub poll_interval_ms: u64,
    pub session_details: Option<String>,
    pub scorer: ScorerKind,
    pub summarizer: SummarizerKind,
    pub model: String,
    pub api_base_url: String,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            sound_alerts_enabled: true,
            initial_level: 50.0,
            poll_interval_ms: 2000,
            session_details: Some("A general study session.".into()),
            scorer: ScorerKind::Gemini,
            summarizer: SummarizerKind::Gemini,
            model: DEFAULT_MODEL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
        }
    }
}

impl FocusSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn initial_level(&self) -> f64 {
        if self.initial_level.is_finite() {
            self.initial_level.clamp(0.0, 100.0)
        } else {
            FocusSettings::default().initial_level
        }
    }

    pub fn needs_api_key(&self) -> bool {
        self.scorer == ScorerKind::Gemini || self.summarizer == SummarizerKind::Gemini
    }
}

/// API key for the hosted model. Read from the environment only, never written to disk.
pub fn api_key_from_env() -> Option<String> {
    ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<FocusSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring unreadable settings in {}: {err}",
                    path.display()
                );
                FocusSettings::default()
            })
        } else {
            FocusSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> FocusSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update<F>(&self, change: F) -> Result<FocusSettings>
    where
        F: FnOnce(&mut FocusSettings),
    {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next = guard.clone();
        change(&mut next);
        self.persist(&next)?;
        *guard = next.clone();
        Ok(next)
    }

    fn persist(&self, data: &FocusSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create settings directory {}", parent.display())
                })?;
            }
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
