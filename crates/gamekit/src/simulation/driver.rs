use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, info};

use crate::host::HostSender;
use crate::orchestrator::{ContentOrchestrator, NativeApiAlreadyInitialized};

use super::host::{SimulationHost, SimulationOptions};
use super::prefs::{PreferenceError, PreferenceStore};

pub const AUTO_SIMULATE_PREF_KEY: &str = "GameKit.Simulation.AutoSimulate";
pub const CONTENT_FOLDER_PREF_KEY: &str = "GameKit.Simulation.ContentBundleFolder";

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("no play session is active")]
    NoSession,
    #[error(transparent)]
    NativeApi(#[from] NativeApiAlreadyInitialized),
    #[error(transparent)]
    Preferences(#[from] PreferenceError),
}

/// What the tooling needs from a running play session.
#[derive(Clone)]
pub struct SimulationSession {
    orchestrator: ContentOrchestrator,
    host_sender: HostSender,
}

impl SimulationSession {
    pub fn new(orchestrator: ContentOrchestrator, host_sender: HostSender) -> Self {
        Self {
            orchestrator,
            host_sender,
        }
    }
}

pub enum SessionEvent {
    Entered(SimulationSession),
    Exited,
}

/// Attaches a [`SimulationHost`] to play sessions when auto-simulation is on
/// and remembers the tooling choices between runs.
pub struct SimulationDriver<P> {
    prefs: P,
    auto_simulate: bool,
    content_folder: Option<PathBuf>,
    options: SimulationOptions,
    session: Option<SimulationSession>,
    host: Option<Rc<SimulationHost>>,
}

impl<P: PreferenceStore> SimulationDriver<P> {
    pub fn new(prefs: P, options: SimulationOptions) -> Self {
        let auto_simulate = prefs.get_bool(AUTO_SIMULATE_PREF_KEY).unwrap_or(true);
        let content_folder = prefs
            .get_string(CONTENT_FOLDER_PREF_KEY)
            .filter(|folder| !folder.trim().is_empty())
            .map(PathBuf::from);
        info!(
            auto_simulate,
            content_folder = ?content_folder,
            "simulation_preferences_loaded"
        );
        Self {
            prefs,
            auto_simulate,
            content_folder,
            options,
            session: None,
            host: None,
        }
    }

    pub fn auto_simulate(&self) -> bool {
        self.auto_simulate
    }

    /// Turning this off only stops future sessions from attaching; a host
    /// that is already attached stays until the session ends.
    pub fn set_auto_simulate(&mut self, enabled: bool) -> Result<(), PreferenceError> {
        if self.auto_simulate == enabled {
            return Ok(());
        }
        self.prefs.set_bool(AUTO_SIMULATE_PREF_KEY, enabled)?;
        self.auto_simulate = enabled;
        Ok(())
    }

    pub fn content_folder(&self) -> Option<&Path> {
        self.content_folder.as_deref()
    }

    pub fn set_content_folder(&mut self, folder: impl Into<PathBuf>) -> Result<(), PreferenceError> {
        let folder = folder.into();
        if self.content_folder.as_ref() == Some(&folder) {
            return Ok(());
        }
        self.prefs
            .set_string(CONTENT_FOLDER_PREF_KEY, &folder.to_string_lossy())?;
        self.content_folder = Some(folder);
        Ok(())
    }

    pub fn preferences(&self) -> &P {
        &self.prefs
    }

    pub fn host(&self) -> Option<&Rc<SimulationHost>> {
        self.host.as_ref()
    }

    pub fn is_in_simulation_mode(&self) -> bool {
        self.host.is_some()
    }

    pub fn handle_session_event(&mut self, event: SessionEvent) -> Result<(), SimulationError> {
        match event {
            SessionEvent::Entered(session) => {
                info!(auto_simulate = self.auto_simulate, "play_session_entered");
                self.session = Some(session);
                if !self.auto_simulate {
                    return Ok(());
                }
                self.start_simulation()
            }
            SessionEvent::Exited => {
                info!("play_session_exited");
                self.stop_simulation();
                self.session = None;
                Ok(())
            }
        }
    }

    /// Per-frame upkeep. Refreshes an attached host; never attaches one.
    pub fn tick(&mut self) {
        if !self.auto_simulate {
            return;
        }
        if let Some(host) = &self.host {
            host.auto_simulate(self.content_folder.as_deref());
        }
    }

    pub fn start_simulation(&mut self) -> Result<(), SimulationError> {
        let session = self.session.as_ref().ok_or(SimulationError::NoSession)?;
        if let Some(host) = &self.host {
            debug!("simulation_already_attached");
            host.auto_simulate(self.content_folder.as_deref());
            return Ok(());
        }
        let host = Rc::new(SimulationHost::new(
            self.content_folder.clone(),
            session.host_sender.clone(),
            self.options.clone(),
        ));
        session.orchestrator.set_native_api(host.clone())?;
        info!(content_folder = ?self.content_folder, "simulation_started");
        self.host = Some(host);
        Ok(())
    }

    pub fn stop_simulation(&mut self) {
        if let Some(host) = self.host.take() {
            host.stop_simulation();
            info!("simulation_detached");
        }
    }
}
