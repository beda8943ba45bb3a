use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::host::{HostCommand, HostSender, NativeApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Initialized(String),
    LoadingSucceeded,
    LoadingFailed,
    SaveDataWritten,
    UnloadingSucceeded,
}

/// Values the simulated host hands to the orchestrator on startup, ahead of
/// the content folder.
#[derive(Debug, Clone, Default)]
pub struct SimulationOptions {
    pub language: Option<String>,
    pub save_data_folder: Option<PathBuf>,
}

/// Stands in for the real host platform while developing content locally.
///
/// Requests travel through the same command channel a real host would use;
/// callbacks are recorded so tooling can report on them.
pub struct SimulationHost {
    sender: HostSender,
    options: SimulationOptions,
    content_folder: RefCell<Option<PathBuf>>,
    events: RefCell<Vec<HostEvent>>,
    stopped: Cell<bool>,
}

impl SimulationHost {
    pub fn new(
        content_folder: Option<PathBuf>,
        sender: HostSender,
        options: SimulationOptions,
    ) -> Self {
        Self {
            sender,
            options,
            content_folder: RefCell::new(content_folder),
            events: RefCell::new(Vec::new()),
            stopped: Cell::new(false),
        }
    }

    pub fn content_folder(&self) -> Option<PathBuf> {
        self.content_folder.borrow().clone()
    }

    /// Keeps the folder pointer current. Never provisions on its own.
    pub fn auto_simulate(&self, content_folder: Option<&Path>) {
        if self.stopped.get() {
            return;
        }
        let mut current = self.content_folder.borrow_mut();
        if current.as_deref() != content_folder {
            debug!(content_folder = ?content_folder, "simulation_content_folder_refreshed");
            *current = content_folder.map(Path::to_path_buf);
        }
    }

    pub fn stop_simulation(&self) {
        if !self.stopped.replace(true) {
            info!("simulation_stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    /// `Some(true)` once loading succeeded, `Some(false)` once it failed.
    pub fn loading_outcome(&self) -> Option<bool> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            HostEvent::LoadingSucceeded => Some(true),
            HostEvent::LoadingFailed => Some(false),
            _ => None,
        })
    }

    fn record(&self, event: HostEvent) {
        if self.stopped.get() {
            debug!(event = ?event, "simulation_event_after_stop_dropped");
            return;
        }
        info!(event = ?event, "simulation_host_event");
        self.events.borrow_mut().push(event);
    }

    fn send(&self, command: HostCommand) {
        if let Err(error) = self.sender.send(command) {
            warn!(error = %error, "simulation_command_dropped");
        }
    }
}

impl NativeApi for SimulationHost {
    fn initialize_api(&self, identifier: &str) {
        self.record(HostEvent::Initialized(identifier.to_string()));
        if let Some(locale) = &self.options.language {
            self.send(HostCommand::SetContentLanguage(locale.clone()));
        }
        if let Some(folder) = &self.options.save_data_folder {
            self.send(HostCommand::SetSaveDataFolder(folder.clone()));
        }
        match self.content_folder() {
            Some(folder) => self.send(HostCommand::SetContentBundleFolder(folder)),
            None => warn!("simulation_content_folder_unset"),
        }
    }

    fn on_loading_succeeded(&self) {
        self.record(HostEvent::LoadingSucceeded);
    }

    fn on_loading_failed(&self) {
        self.record(HostEvent::LoadingFailed);
    }

    fn on_save_data_written(&self) {
        self.record(HostEvent::SaveDataWritten);
    }

    fn on_unloading_succeeded(&self) {
        self.record(HostEvent::UnloadingSucceeded);
    }
}
