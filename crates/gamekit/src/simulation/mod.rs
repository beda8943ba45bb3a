mod driver;
mod host;
mod prefs;

pub use driver::{
    SessionEvent, SimulationDriver, SimulationError, SimulationSession, AUTO_SIMULATE_PREF_KEY,
    CONTENT_FOLDER_PREF_KEY,
};
pub use host::{HostEvent, SimulationHost, SimulationOptions};
pub use prefs::{JsonFilePreferences, MemoryPreferences, PreferenceError, PreferenceStore};
