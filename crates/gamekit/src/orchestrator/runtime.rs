use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::host::{HostCommand, HostInbox};

use super::error::{LifecycleError, ProvisionError};
use super::lifecycle::ContentOrchestrator;

#[derive(Debug, Error)]
pub enum HostCommandError {
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

#[derive(Debug)]
pub struct CommandOutcome {
    pub command: HostCommand,
    pub result: Result<(), HostCommandError>,
}

/// Drives the orchestrator on the thread that owns it. Host commands queued
/// through [`crate::HostSender`] run as local tasks, in arrival order, each
/// time [`ContentRuntime::tick`] is called.
pub struct ContentRuntime {
    orchestrator: ContentOrchestrator,
    inbox: HostInbox,
    pool: LocalPool,
    pending: Vec<HostCommand>,
    outcomes: Rc<RefCell<Vec<CommandOutcome>>>,
}

impl ContentRuntime {
    pub fn new(orchestrator: ContentOrchestrator, inbox: HostInbox) -> Self {
        Self {
            orchestrator,
            inbox,
            pool: LocalPool::new(),
            pending: Vec::new(),
            outcomes: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn orchestrator(&self) -> &ContentOrchestrator {
        &self.orchestrator
    }

    /// Dispatches every queued command and polls local tasks until none can
    /// make progress. Returns how many commands were dispatched.
    pub fn tick(&mut self) -> usize {
        self.inbox.drain_pending(&mut self.pending);
        let dispatched = self.pending.len();
        let spawner = self.pool.spawner();
        for command in self.pending.drain(..) {
            let orchestrator = self.orchestrator.clone();
            let outcomes = Rc::clone(&self.outcomes);
            let label = command.label();
            let task = async move {
                let result = dispatch(&orchestrator, command.clone()).await;
                outcomes
                    .borrow_mut()
                    .push(CommandOutcome { command, result });
            };
            if let Err(error) = spawner.spawn_local(task) {
                error!(command = label, error = %error, "host_command_spawn_failed");
            }
        }
        self.pool.run_until_stalled();
        dispatched
    }

    /// Outcomes of commands that finished since the last call.
    pub fn take_outcomes(&mut self) -> Vec<CommandOutcome> {
        std::mem::take(&mut *self.outcomes.borrow_mut())
    }
}

async fn dispatch(
    orchestrator: &ContentOrchestrator,
    command: HostCommand,
) -> Result<(), HostCommandError> {
    let label = command.label();
    debug!(command = label, "host_command_dispatched");
    let result = match command {
        HostCommand::SetContentLanguage(locale) => orchestrator
            .set_language(&locale)
            .await
            .map_err(HostCommandError::from),
        HostCommand::SetSaveDataFolder(folder) => orchestrator
            .set_save_data_folder(folder)
            .await
            .map_err(HostCommandError::from),
        HostCommand::SetContentBundleFolder(folder) => orchestrator
            .provision_content(folder)
            .await
            .map_err(HostCommandError::from),
        HostCommand::WriteSave(folder) => orchestrator
            .persist_save_data(folder)
            .await
            .map_err(HostCommandError::from),
        HostCommand::UnloadGameContent => orchestrator
            .unload_content()
            .await
            .map_err(HostCommandError::from),
    };
    if let Err(error) = &result {
        warn!(command = label, error = %error, "host_command_failed");
    }
    result
}
