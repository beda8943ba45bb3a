use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use gamekit::{
    host_channel, ContentOrchestrator, ContentRuntime, GameRegistry, HostCommand, HostEvent,
    HostSender, JsonFilePreferences, OrchestratorWiring, PackBundleLoader, PreferenceError,
    SceneStack, SessionEvent, SimulationDriver, SimulationError, SimulationHost,
    SimulationSession,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::bootstrap::AppWiring;
use super::demo_game::{AnnounceStart, DemoGame, DemoState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoopConfig {
    pub(crate) target_tps: u32,
    /// The session is abandoned after this many frames.
    pub(crate) max_frames: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frames: 600,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum RunError {
    #[error(transparent)]
    Preferences(#[from] PreferenceError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingLoad,
    AwaitingUnload,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionOutcome {
    /// Auto-simulation is off, so no host was attached.
    NotSimulated,
    Completed,
    LoadingFailed,
    FrameBudgetExhausted,
}

#[derive(Debug, Clone)]
pub(crate) struct SessionReport {
    pub(crate) outcome: SessionOutcome,
    pub(crate) frames: u32,
    pub(crate) scenes_while_running: Vec<String>,
    pub(crate) scenes_after_session: Vec<String>,
    pub(crate) game: DemoState,
    pub(crate) host_events: Vec<HostEvent>,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_session(&app) {
        Ok(report) => {
            info!(
                outcome = ?report.outcome,
                frames = report.frames,
                scenes = ?report.scenes_while_running,
                scenes_after = ?report.scenes_after_session,
                host_events = ?report.host_events,
                content_folder = ?report.game.content_folder,
                sessions_played = report.game.sessions_played,
                "simulation_session_finished"
            );
            match report.outcome {
                SessionOutcome::Completed | SessionOutcome::NotSimulated => ExitCode::SUCCESS,
                SessionOutcome::LoadingFailed | SessionOutcome::FrameBudgetExhausted => {
                    ExitCode::FAILURE
                }
            }
        }
        Err(err) => {
            error!(error = %err, "simulation_session_failed");
            ExitCode::FAILURE
        }
    }
}

/// Plays one session: load the configured content, write a save, unload.
pub(crate) fn run_session(app: &AppWiring) -> Result<SessionReport, RunError> {
    let games = GameRegistry::default();
    let demo = Rc::new(DemoGame::new());
    games.register(demo.clone());
    let scenes = Rc::new(SceneStack::new(&app.settings.start_scene_name));
    let orchestrator = ContentOrchestrator::new(OrchestratorWiring {
        settings: app.settings.clone(),
        bundle_loader: Rc::new(PackBundleLoader),
        scene_director: scenes.clone(),
        games,
        start_hook: Some(Rc::new(AnnounceStart)),
    });
    let (sender, inbox) = host_channel();
    let mut runtime = ContentRuntime::new(orchestrator.clone(), inbox);

    let mut driver = SimulationDriver::new(
        JsonFilePreferences::open(&app.prefs_file),
        app.options.clone(),
    );
    if let Some(folder) = &app.content_folder {
        driver.set_content_folder(folder.clone())?;
    }
    driver.handle_session_event(SessionEvent::Entered(SimulationSession::new(
        orchestrator,
        sender.clone(),
    )))?;
    let Some(host) = driver.host().cloned() else {
        warn!("auto_simulate_disabled_no_host_attached");
        driver.handle_session_event(SessionEvent::Exited)?;
        return Ok(SessionReport {
            outcome: SessionOutcome::NotSimulated,
            frames: 0,
            scenes_while_running: Vec::new(),
            scenes_after_session: scenes.active_scenes(),
            game: demo.state(),
            host_events: Vec::new(),
        });
    };

    let frame_budget = Duration::from_secs_f64(1.0 / f64::from(app.loop_config.target_tps));
    let save_folder = app.options.save_data_folder.clone();
    let mut phase = Phase::AwaitingLoad;
    let mut outcome = SessionOutcome::FrameBudgetExhausted;
    let mut scenes_while_running = Vec::new();
    let mut frames = 0;

    while frames < app.loop_config.max_frames {
        let frame_started = Instant::now();
        frames += 1;

        driver.tick();
        runtime.tick();
        for finished in runtime.take_outcomes() {
            match &finished.result {
                Ok(()) => debug!(command = finished.command.label(), "host_command_completed"),
                Err(err) => warn!(
                    command = finished.command.label(),
                    error = %err,
                    "host_command_rejected"
                ),
            }
        }

        phase = match phase {
            Phase::AwaitingLoad => match host.loading_outcome() {
                Some(true) => {
                    scenes_while_running = scenes.active_scenes();
                    request_teardown(&sender, save_folder.clone());
                    Phase::AwaitingUnload
                }
                Some(false) => {
                    outcome = SessionOutcome::LoadingFailed;
                    Phase::Finished
                }
                None => Phase::AwaitingLoad,
            },
            Phase::AwaitingUnload if has_unloaded(&host) => {
                outcome = SessionOutcome::Completed;
                Phase::Finished
            }
            other => other,
        };
        if phase == Phase::Finished {
            break;
        }

        let elapsed = frame_started.elapsed();
        if elapsed < frame_budget {
            thread::sleep(frame_budget - elapsed);
        }
    }

    let host_events = host.events();
    driver.handle_session_event(SessionEvent::Exited)?;
    Ok(SessionReport {
        outcome,
        frames,
        scenes_while_running,
        scenes_after_session: scenes.active_scenes(),
        game: demo.state(),
        host_events,
    })
}

fn request_teardown(sender: &HostSender, save_folder: Option<PathBuf>) {
    let mut commands = Vec::with_capacity(2);
    if let Some(folder) = save_folder {
        commands.push(HostCommand::WriteSave(folder));
    }
    commands.push(HostCommand::UnloadGameContent);
    for command in commands {
        if let Err(err) = sender.send(command) {
            warn!(error = %err, "teardown_command_dropped");
        }
    }
}

fn has_unloaded(host: &SimulationHost) -> bool {
    host.events().contains(&HostEvent::UnloadingSucceeded)
}
