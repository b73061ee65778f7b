//! Settings panel message protocol
//!
//! A settings form talks to its host with small JSON messages tagged by
//! `command`. The host owns at most one panel at a time; showing the panel
//! again reuses the existing one.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::{ConfigError, ConfigStore, RawSettings, Settings};

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Panel -> host
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PanelMessage {
    SaveConfig {
        #[serde(default)]
        config: Option<RawSettings>,
    },
    GetConfig,
}

/// Host -> panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostMessage {
    SaveSuccess,
    UpdateConfig { config: Settings },
    Error { message: String },
}

/// An open settings form
#[derive(Debug)]
pub struct SettingsPanel {
    id: u64,
    handled: usize,
}

impl SettingsPanel {
    fn new(id: u64) -> Self {
        Self { id, handled: 0 }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of messages this panel has answered
    pub fn handled(&self) -> usize {
        self.handled
    }

    pub fn handle<S: ConfigStore>(
        &mut self,
        store: &mut S,
        message: PanelMessage,
    ) -> Result<HostMessage, PanelError> {
        self.handled += 1;
        debug!(panel = self.id, ?message, "panel message");

        match message {
            PanelMessage::GetConfig => Ok(HostMessage::UpdateConfig {
                config: store.load()?,
            }),
            PanelMessage::SaveConfig { config: None } => Err(ConfigError::InvalidConfiguration(
                "configuration object is missing".to_string(),
            )
            .into()),
            PanelMessage::SaveConfig {
                config: Some(raw),
            } => {
                store.save(&Settings::from_raw(raw))?;
                Ok(HostMessage::SaveSuccess)
            }
        }
    }
}

/// Owner of the (single) settings panel
#[derive(Debug)]
pub struct PanelHost<S> {
    store: S,
    panel: Option<SettingsPanel>,
    next_id: u64,
}

impl<S: ConfigStore> PanelHost<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            panel: None,
            next_id: 0,
        }
    }

    /// The open panel, creating one if none is open
    pub fn show(&mut self) -> &mut SettingsPanel {
        open(&mut self.panel, &mut self.next_id)
    }

    pub fn is_open(&self) -> bool {
        self.panel.is_some()
    }

    /// Close the panel; the next `show` creates a fresh one
    pub fn dispose(&mut self) {
        if let Some(panel) = self.panel.take() {
            debug!(panel = panel.id, "settings panel disposed");
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Route a message to the panel and turn failures into an `error` reply
    pub fn dispatch(&mut self, message: PanelMessage) -> HostMessage {
        open(&mut self.panel, &mut self.next_id)
            .handle(&mut self.store, message)
            .unwrap_or_else(|e| failure(&e))
    }
}

fn open<'a>(panel: &'a mut Option<SettingsPanel>, next_id: &mut u64) -> &'a mut SettingsPanel {
    panel.get_or_insert_with(|| {
        *next_id += 1;
        debug!(panel = *next_id, "settings panel created");
        SettingsPanel::new(*next_id)
    })
}

fn failure(e: &PanelError) -> HostMessage {
    error!("settings panel: {}", e);
    HostMessage::Error {
        message: e.to_string(),
    }
}

/// Serve the protocol over line-delimited JSON until `reader` is exhausted
pub fn run_json_lines<S, R, W>(
    host: &mut PanelHost<S>,
    reader: R,
    mut writer: W,
) -> Result<(), PanelError>
where
    S: ConfigStore,
    R: BufRead,
    W: Write,
{
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<PanelMessage>(&line) {
            Ok(message) => host.dispatch(message),
            Err(e) => failure(&PanelError::Json(e)),
        };

        serde_json::to_writer(&mut writer, &reply)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    Ok(())
}
