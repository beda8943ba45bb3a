use std::path::PathBuf;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use thiserror::Error;

/// Callbacks the orchestrator makes into the host platform.
pub trait NativeApi {
    /// Called once, when the API is bound to an orchestrator.
    fn initialize_api(&self, identifier: &str);
    fn on_loading_succeeded(&self);
    fn on_loading_failed(&self);
    fn on_save_data_written(&self);
    fn on_unloading_succeeded(&self);
}

/// Calls the host makes into the orchestrator. They may be issued from any
/// thread and are executed on the orchestrator's own context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    SetContentLanguage(String),
    SetSaveDataFolder(PathBuf),
    SetContentBundleFolder(PathBuf),
    WriteSave(PathBuf),
    UnloadGameContent,
}

impl HostCommand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SetContentLanguage(_) => "set_content_language",
            Self::SetSaveDataFolder(_) => "set_save_data_folder",
            Self::SetContentBundleFolder(_) => "set_content_bundle_folder",
            Self::WriteSave(_) => "write_save",
            Self::UnloadGameContent => "unload_game_content",
        }
    }
}

#[derive(Debug, Error)]
#[error("host command channel is closed; {command:?} was dropped")]
pub struct HostChannelClosed {
    pub command: HostCommand,
}

#[derive(Debug, Clone)]
pub struct HostSender {
    tx: UnboundedSender<HostCommand>,
}

impl HostSender {
    pub fn send(&self, command: HostCommand) -> Result<(), HostChannelClosed> {
        self.tx
            .unbounded_send(command)
            .map_err(|error| HostChannelClosed {
                command: error.into_inner(),
            })
    }
}

#[derive(Debug)]
pub struct HostInbox {
    rx: UnboundedReceiver<HostCommand>,
}

impl HostInbox {
    pub fn drain_pending(&mut self, out: &mut Vec<HostCommand>) {
        while let Ok(command) = self.rx.try_recv() {
            out.push(command);
        }
    }
}

pub fn host_channel() -> (HostSender, HostInbox) {
    let (tx, rx) = mpsc::unbounded();
    (HostSender { tx }, HostInbox { rx })
}
